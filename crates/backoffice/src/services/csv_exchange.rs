//! CSV export and import of products.
//!
//! Export writes one row per product behind a fixed header. Import reads
//! the same layout back: column 0 (the id) is ignored, a category is looked
//! up by exact title and created when missing, and every row becomes a new
//! product with the default image and no suppliers.

use std::future::Future;

use chrono::NaiveDate;
use futures::{Stream, StreamExt};
use sqlx::PgPool;
use thiserror::Error;

use stockroom_core::{CategoryId, Price};

use crate::db::{CategoryRepository, ProductRepository, RepositoryError};
use crate::models::{NewProduct, ProductListing};

pub const EXPORT_HEADER: [&str; 8] = [
    "ID",
    "Title",
    "Description",
    "Price",
    "Stock",
    "Expire Date",
    "Category",
    "#Suppliers",
];

/// File name offered to the browser for the export.
pub const EXPORT_FILE_NAME: &str = "products.csv";

/// Errors raised while streaming the export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV buffer error: {0}")]
    Buffer(String),
}

/// The export fields of one product, in header order.
#[must_use]
pub fn export_record(listing: &ProductListing) -> [String; 8] {
    let product = &listing.product;
    [
        product.id.to_string(),
        product.title.clone(),
        product.description.clone(),
        product.price.to_string(),
        product.stock.to_string(),
        product.expire_date.format("%Y-%m-%d").to_string(),
        listing.category_title.clone(),
        listing.supplier_count.to_string(),
    ]
}

/// Encode one CSV line, quoting fields as RFC 4180 requires.
///
/// # Errors
///
/// Returns `ExportError` if the writer fails.
pub fn encode_line<I, T>(fields: I) -> Result<Vec<u8>, ExportError>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());
    writer.write_record(fields)?;
    writer
        .into_inner()
        .map_err(|e| ExportError::Buffer(e.error().to_string()))
}

/// Turn a stream of listings into a stream of CSV lines, header first.
pub fn export_lines<S>(rows: S) -> impl Stream<Item = Result<Vec<u8>, ExportError>> + Send
where
    S: Stream<Item = Result<ProductListing, RepositoryError>> + Send,
{
    let header = futures::stream::once(async { encode_line(EXPORT_HEADER) });
    let body = rows.map(|row| encode_line(export_record(&row?)));
    header.chain(body)
}

/// A product parsed from one import row.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedProduct {
    pub title: String,
    pub description: String,
    pub price: Price,
    pub stock: i32,
    pub expire_date: NaiveDate,
    pub category_title: String,
}

/// Why an import stopped.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("This file is not a CSV file")]
    NotCsv,

    #[error("file is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("{0}")]
    Csv(#[from] csv::Error),

    #[error("line {line}: missing column {column}")]
    MissingColumn { line: u64, column: usize },

    #[error("line {line}: could not convert price {value:?} to a number")]
    InvalidPrice { line: u64, value: String },

    #[error("line {line}: invalid stock {value:?}")]
    InvalidStock { line: u64, value: String },

    #[error("line {line}: date {value:?} does not match format YYYY-MM-DD")]
    InvalidDate { line: u64, value: String },

    #[error("{0}")]
    Repository(#[from] RepositoryError),
}

/// An import that stopped early. Rows before the failure stay imported.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct ImportFailure {
    pub imported: usize,
    #[source]
    pub error: ImportError,
}

impl ImportFailure {
    fn new(imported: usize, error: impl Into<ImportError>) -> Self {
        Self {
            imported,
            error: error.into(),
        }
    }
}

/// Where imported rows are written.
pub trait ImportTarget: Send {
    /// The lowest-id category with exactly this title.
    fn find_category(
        &mut self,
        title: &str,
    ) -> impl Future<Output = Result<Option<CategoryId>, RepositoryError>> + Send;

    fn create_category(
        &mut self,
        title: &str,
    ) -> impl Future<Output = Result<CategoryId, RepositoryError>> + Send;

    fn insert_product(
        &mut self,
        product: &ImportedProduct,
        category_id: CategoryId,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

/// Reject uploads whose name does not end in `.csv`.
///
/// # Errors
///
/// Returns `ImportError::NotCsv` for any other name.
pub fn check_file_name(file_name: &str) -> Result<(), ImportError> {
    if file_name.ends_with(".csv") {
        Ok(())
    } else {
        Err(ImportError::NotCsv)
    }
}

/// Import every row of `data` into `target`, returning the number imported.
///
/// Rows with fewer than six fields are skipped. The first bad row stops
/// the import.
///
/// # Errors
///
/// Returns `ImportFailure` with the count of rows imported before the error.
pub async fn import_products<T: ImportTarget>(
    data: &[u8],
    target: &mut T,
) -> Result<usize, ImportFailure> {
    let mut imported = 0;

    let text = std::str::from_utf8(data).map_err(|e| ImportFailure::new(0, e))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    for record in reader.records() {
        let record = record.map_err(|e| ImportFailure::new(imported, e))?;
        if record.len() < 6 {
            continue;
        }

        let product = parse_row(&record).map_err(|e| ImportFailure::new(imported, e))?;
        store_row(target, &product)
            .await
            .map_err(|e| ImportFailure::new(imported, e))?;
        imported += 1;
    }

    Ok(imported)
}

fn parse_row(record: &csv::StringRecord) -> Result<ImportedProduct, ImportError> {
    let line = record.position().map_or(0, csv::Position::line);
    let field = |column: usize| {
        record
            .get(column)
            .ok_or(ImportError::MissingColumn { line, column })
    };

    let price_raw = field(3)?;
    let price = price_raw
        .trim()
        .parse::<f64>()
        .ok()
        .and_then(|value| Price::from_f64(value).ok())
        .ok_or_else(|| ImportError::InvalidPrice {
            line,
            value: price_raw.to_string(),
        })?;

    let stock_raw = field(4)?;
    let stock = stock_raw
        .trim()
        .parse::<i32>()
        .map_err(|_| ImportError::InvalidStock {
            line,
            value: stock_raw.to_string(),
        })?;

    let date_raw = field(5)?;
    let expire_date = NaiveDate::parse_from_str(date_raw, "%Y-%m-%d").map_err(|_| {
        ImportError::InvalidDate {
            line,
            value: date_raw.to_string(),
        }
    })?;

    Ok(ImportedProduct {
        title: field(1)?.to_string(),
        description: field(2)?.to_string(),
        price,
        stock,
        expire_date,
        category_title: field(6)?.to_string(),
    })
}

async fn store_row<T: ImportTarget>(
    target: &mut T,
    product: &ImportedProduct,
) -> Result<(), RepositoryError> {
    let category_id = match target.find_category(&product.category_title).await? {
        Some(id) => id,
        None => target.create_category(&product.category_title).await?,
    };
    target.insert_product(product, category_id).await
}

/// Writes imported rows through the repositories.
pub struct StoreImportTarget<'a> {
    pool: &'a PgPool,
}

impl<'a> StoreImportTarget<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

impl ImportTarget for StoreImportTarget<'_> {
    async fn find_category(&mut self, title: &str) -> Result<Option<CategoryId>, RepositoryError> {
        let category = CategoryRepository::new(self.pool).find_by_title(title).await?;
        Ok(category.map(|c| c.id))
    }

    async fn create_category(&mut self, title: &str) -> Result<CategoryId, RepositoryError> {
        let category = CategoryRepository::new(self.pool).create(title).await?;
        Ok(category.id)
    }

    async fn insert_product(
        &mut self,
        product: &ImportedProduct,
        category_id: CategoryId,
    ) -> Result<(), RepositoryError> {
        let new_product = NewProduct {
            title: product.title.clone(),
            description: product.description.clone(),
            image: None,
            price: product.price.clone(),
            stock: product.stock,
            category_id,
            expire_date: product.expire_date,
            supplier_ids: Vec::new(),
        };
        ProductRepository::new(self.pool).create(&new_product).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use futures::TryStreamExt;
    use stockroom_core::ProductId;

    use super::*;
    use crate::models::{DEFAULT_IMAGE, Product};

    #[derive(Default)]
    struct FakeTarget {
        categories: Vec<(CategoryId, String)>,
        products: Vec<(ImportedProduct, CategoryId)>,
        fail_on_title: Option<String>,
    }

    impl FakeTarget {
        fn with_categories(titles: &[&str]) -> Self {
            let mut target = Self::default();
            for title in titles {
                let id = CategoryId::new(i32::try_from(target.categories.len()).unwrap() + 1);
                target.categories.push((id, (*title).to_string()));
            }
            target
        }
    }

    impl ImportTarget for FakeTarget {
        async fn find_category(
            &mut self,
            title: &str,
        ) -> Result<Option<CategoryId>, RepositoryError> {
            Ok(self
                .categories
                .iter()
                .find(|(_, t)| t == title)
                .map(|(id, _)| *id))
        }

        async fn create_category(&mut self, title: &str) -> Result<CategoryId, RepositoryError> {
            let id = CategoryId::new(i32::try_from(self.categories.len()).unwrap() + 1);
            self.categories.push((id, title.to_string()));
            Ok(id)
        }

        async fn insert_product(
            &mut self,
            product: &ImportedProduct,
            category_id: CategoryId,
        ) -> Result<(), RepositoryError> {
            if self.fail_on_title.as_deref() == Some(product.title.as_str()) {
                return Err(RepositoryError::Conflict("title rejected".to_string()));
            }
            self.products.push((product.clone(), category_id));
            Ok(())
        }
    }

    const HEADER: &str = "ID,Title,Description,Price,Stock,Expire Date,Category,#Suppliers\n";

    fn listing(title: &str, description: &str, suppliers: i64) -> ProductListing {
        ProductListing {
            product: Product {
                id: ProductId::new(3),
                title: title.to_string(),
                description: description.to_string(),
                image: DEFAULT_IMAGE.to_string(),
                price: Price::parse("4.50").unwrap(),
                stock: 120,
                category_id: CategoryId::new(2),
                expire_date: NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(),
                created_at: Utc::now(),
            },
            category_title: "Dairy".to_string(),
            supplier_count: suppliers,
        }
    }

    #[test]
    fn test_export_record_fields() {
        let record = export_record(&listing("Milk", "Whole milk", 2));
        assert_eq!(
            record,
            ["3", "Milk", "Whole milk", "4.50", "120", "2026-05-01", "Dairy", "2"]
        );
    }

    #[test]
    fn test_encode_line_quotes_special_fields() {
        let line = encode_line(export_record(&listing("Milk, 1L", "Say \"fresh\"\nnow", 0))).unwrap();
        assert_eq!(
            String::from_utf8(line).unwrap(),
            "3,\"Milk, 1L\",\"Say \"\"fresh\"\"\nnow\",4.50,120,2026-05-01,Dairy,0\r\n"
        );
    }

    #[tokio::test]
    async fn test_export_lines_header_then_rows() {
        let rows = futures::stream::iter(vec![
            Ok(listing("Milk", "", 1)),
            Ok(listing("Cream", "", 0)),
        ]);
        let lines: Vec<Vec<u8>> = export_lines(rows).try_collect().await.unwrap();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            String::from_utf8(lines[0].clone()).unwrap(),
            "ID,Title,Description,Price,Stock,Expire Date,Category,#Suppliers\r\n"
        );
        assert!(String::from_utf8(lines[2].clone()).unwrap().starts_with("3,Cream,"));
    }

    #[test]
    fn test_check_file_name() {
        assert!(check_file_name("products.csv").is_ok());
        assert!(matches!(check_file_name("products.xlsx"), Err(ImportError::NotCsv)));
        assert!(matches!(check_file_name("products.CSV"), Err(ImportError::NotCsv)));
        assert_eq!(ImportError::NotCsv.to_string(), "This file is not a CSV file");
    }

    #[tokio::test]
    async fn test_import_reuses_and_creates_categories() {
        let data = format!(
            "{HEADER}\
             1,Milk,Whole,1.5,20,2026-05-01,Dairy,0\n\
             2,Bread,Rye,2,8,2026-04-02,Bakery,0\n\
             3,Cheese,Aged,9.25,3,2026-09-30,Dairy,1\n"
        );
        let mut target = FakeTarget::with_categories(&["Dairy"]);

        let imported = import_products(data.as_bytes(), &mut target).await.unwrap();

        assert_eq!(imported, 3);
        let titles: Vec<_> = target.categories.iter().map(|(_, t)| t.as_str()).collect();
        assert_eq!(titles, vec!["Dairy", "Bakery"]);
        assert_eq!(target.products[0].1, CategoryId::new(1));
        assert_eq!(target.products[1].1, CategoryId::new(2));
        assert_eq!(target.products[2].1, CategoryId::new(1));
        assert_eq!(target.products[0].0.stock, 20);
        assert_eq!(target.products[2].0.price.as_str(), "9.25");
    }

    #[tokio::test]
    async fn test_import_skips_short_rows() {
        let data = format!("{HEADER}1,Milk,Whole\n,,\n2,Bread,Rye,2,8,2026-04-02,Bakery\n");
        let mut target = FakeTarget::default();

        let imported = import_products(data.as_bytes(), &mut target).await.unwrap();

        assert_eq!(imported, 1);
        assert_eq!(target.products[0].0.title, "Bread");
    }

    #[tokio::test]
    async fn test_import_row_without_category_fails() {
        let data = format!("{HEADER}1,Milk,Whole,1.5,20,2026-05-01\n");
        let mut target = FakeTarget::default();

        let failure = import_products(data.as_bytes(), &mut target).await.unwrap_err();

        assert_eq!(failure.imported, 0);
        assert!(matches!(
            failure.error,
            ImportError::MissingColumn { column: 6, .. }
        ));
        assert!(target.products.is_empty());
    }

    #[tokio::test]
    async fn test_import_stops_at_first_bad_row_and_keeps_earlier_rows() {
        let data = format!(
            "{HEADER}\
             1,Milk,Whole,1.5,20,2026-05-01,Dairy\n\
             2,Bread,Rye,cheap,8,2026-04-02,Bakery\n\
             3,Cheese,Aged,9.25,3,2026-09-30,Dairy\n"
        );
        let mut target = FakeTarget::default();

        let failure = import_products(data.as_bytes(), &mut target).await.unwrap_err();

        assert_eq!(failure.imported, 1);
        assert!(matches!(failure.error, ImportError::InvalidPrice { line: 3, .. }));
        assert_eq!(target.products.len(), 1);
    }

    #[tokio::test]
    async fn test_import_rejects_prices_that_do_not_fit_a_decimal() {
        for price in ["1e30", "NaN", "inf", "-1e300"] {
            let data = format!(
                "{HEADER}1,Milk,Whole,1.5,20,2026-05-01,Dairy\n2,Gold,Bar,{price},1,2026-05-01,Dairy\n"
            );
            let mut target = FakeTarget::default();

            let failure = import_products(data.as_bytes(), &mut target).await.unwrap_err();

            assert_eq!(failure.imported, 1, "{price}");
            assert!(
                matches!(failure.error, ImportError::InvalidPrice { line: 3, .. }),
                "{price}"
            );
        }
    }

    #[tokio::test]
    async fn test_import_whole_price_keeps_decimal_place() {
        let data = format!("{HEADER}1,Bread,Rye,2,8,2026-04-02,Bakery\n");
        let mut target = FakeTarget::default();

        import_products(data.as_bytes(), &mut target).await.unwrap();

        assert_eq!(target.products[0].0.price.as_str(), "2.0");
    }

    #[tokio::test]
    async fn test_import_rejects_bad_stock_and_date() {
        let bad_stock = format!("{HEADER}1,Milk,Whole,1.5,lots,2026-05-01,Dairy\n");
        let failure = import_products(bad_stock.as_bytes(), &mut FakeTarget::default())
            .await
            .unwrap_err();
        assert!(matches!(failure.error, ImportError::InvalidStock { .. }));

        let bad_date = format!("{HEADER}1,Milk,Whole,1.5,3,01/05/2026,Dairy\n");
        let failure = import_products(bad_date.as_bytes(), &mut FakeTarget::default())
            .await
            .unwrap_err();
        assert!(matches!(failure.error, ImportError::InvalidDate { .. }));
    }

    #[tokio::test]
    async fn test_import_surfaces_store_errors() {
        let data = format!(
            "{HEADER}1,Milk,Whole,1.5,20,2026-05-01,Dairy\n2,Bad,x,1,1,2026-05-01,Dairy\n"
        );
        let mut target = FakeTarget {
            fail_on_title: Some("Bad".to_string()),
            ..FakeTarget::default()
        };

        let failure = import_products(data.as_bytes(), &mut target).await.unwrap_err();

        assert_eq!(failure.imported, 1);
        assert!(matches!(failure.error, ImportError::Repository(_)));
    }

    #[tokio::test]
    async fn test_import_rejects_invalid_utf8() {
        let mut target = FakeTarget::default();
        let failure = import_products(&[0xff, 0xfe, b'a'], &mut target).await.unwrap_err();
        assert!(matches!(failure.error, ImportError::Encoding(_)));
    }

    #[tokio::test]
    async fn test_import_header_only() {
        let mut target = FakeTarget::default();
        assert_eq!(import_products(HEADER.as_bytes(), &mut target).await.unwrap(), 0);
        assert_eq!(import_products(b"", &mut target).await.unwrap(), 0);
    }
}
