//! Product form.

use chrono::NaiveDate;

use stockroom_core::{CategoryId, Price, PriceError, SupplierId};

use super::stock::parse_stock;
use super::{FieldErrors, MultipartForm, max_length, required};
use crate::models::{NewProduct, Product};

pub const MAX_TITLE_LENGTH: usize = 100;
pub const MAX_DESCRIPTION_LENGTH: usize = 500;

const INVALID_CHOICE: &str = "Select a valid choice. That choice is not one of the available choices.";

/// Raw product form values, kept for re-rendering.
#[derive(Debug, Clone, Default)]
pub struct ProductForm {
    pub title: String,
    pub description: String,
    pub price: String,
    pub stock: String,
    pub expire_date: String,
    pub category: String,
    pub suppliers: Vec<String>,
}

/// Validated product fields. The image upload is handled separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductInput {
    pub title: String,
    pub description: String,
    pub price: Price,
    pub stock: i32,
    pub expire_date: NaiveDate,
    pub category_id: CategoryId,
    pub supplier_ids: Vec<SupplierId>,
}

impl ProductInput {
    #[must_use]
    pub fn into_new_product(self, image: Option<String>) -> NewProduct {
        NewProduct {
            title: self.title,
            description: self.description,
            image,
            price: self.price,
            stock: self.stock,
            category_id: self.category_id,
            expire_date: self.expire_date,
            supplier_ids: self.supplier_ids,
        }
    }
}

impl ProductForm {
    #[must_use]
    pub fn from_multipart(form: &MultipartForm) -> Self {
        Self {
            title: form.text("title").to_string(),
            description: form.text("description").to_string(),
            price: form.text("price").to_string(),
            stock: form.text("stock").to_string(),
            expire_date: form.text("expire_date").to_string(),
            category: form.text("category").to_string(),
            suppliers: form.all("suppliers").to_vec(),
        }
    }

    /// Prefill from an existing product and its supplier links.
    #[must_use]
    pub fn from_product(product: &Product, supplier_ids: &[SupplierId]) -> Self {
        Self {
            title: product.title.clone(),
            description: product.description.clone(),
            price: product.price.to_string(),
            stock: product.stock.to_string(),
            expire_date: product.expire_date.format("%Y-%m-%d").to_string(),
            category: product.category_id.to_string(),
            suppliers: supplier_ids.iter().map(ToString::to_string).collect(),
        }
    }

    /// Whether a supplier checkbox should be ticked.
    #[must_use]
    pub fn has_supplier(&self, id: &SupplierId) -> bool {
        let id = id.to_string();
        self.suppliers.iter().any(|s| *s == id)
    }

    /// Validate against the categories and suppliers that exist.
    ///
    /// # Errors
    ///
    /// Returns field errors for blank or malformed values and for unknown
    /// category or supplier choices.
    pub fn validate(
        &self,
        categories: &[CategoryId],
        suppliers: &[SupplierId],
    ) -> Result<ProductInput, FieldErrors> {
        let mut errors = FieldErrors::new();

        let title = required(&mut errors, "title", &self.title, "title is required");
        if let Some(title) = title {
            max_length(&mut errors, "title", title, MAX_TITLE_LENGTH);
        }

        let description = required(
            &mut errors,
            "description",
            &self.description,
            "description is required",
        );
        if let Some(description) = description {
            max_length(&mut errors, "description", description, MAX_DESCRIPTION_LENGTH);
        }

        let price = required(&mut errors, "price", &self.price, "price is required").and_then(
            |raw| match Price::parse(raw) {
                Ok(price) => Some(price),
                Err(e) => {
                    errors.add("price", price_message(&e));
                    None
                }
            },
        );

        let stock = required(&mut errors, "stock", &self.stock, "stock is required")
            .and_then(|raw| parse_stock(&mut errors, raw));

        let expire_date = required(
            &mut errors,
            "expire_date",
            &self.expire_date,
            "expire date is required",
        )
        .and_then(|raw| match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                errors.add("expire_date", "Enter a valid date.");
                None
            }
        });

        let category_id = required(&mut errors, "category", &self.category, "category is required")
            .and_then(|raw| match raw.parse::<CategoryId>() {
                Ok(id) if categories.contains(&id) => Some(id),
                _ => {
                    errors.add("category", INVALID_CHOICE);
                    None
                }
            });

        let supplier_ids = self.supplier_ids(&mut errors, suppliers);

        match (title, description, price, stock, expire_date, category_id) {
            (
                Some(title),
                Some(description),
                Some(price),
                Some(stock),
                Some(expire_date),
                Some(category_id),
            ) if errors.is_empty() => Ok(ProductInput {
                title: title.to_string(),
                description: description.to_string(),
                price,
                stock,
                expire_date,
                category_id,
                supplier_ids,
            }),
            _ => Err(errors),
        }
    }

    fn supplier_ids(&self, errors: &mut FieldErrors, known: &[SupplierId]) -> Vec<SupplierId> {
        let chosen: Vec<&str> = self
            .suppliers
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();
        if chosen.is_empty() {
            errors.add("suppliers", "suppliers is required");
            return Vec::new();
        }

        let mut ids = Vec::with_capacity(chosen.len());
        for raw in chosen {
            match raw.parse::<SupplierId>() {
                Ok(id) if known.contains(&id) => {
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                }
                _ => errors.add(
                    "suppliers",
                    format!("Select a valid choice. {raw} is not one of the available choices."),
                ),
            }
        }
        ids
    }
}

fn price_message(error: &PriceError) -> String {
    match error {
        PriceError::Empty => "price is required".to_string(),
        PriceError::NotANumber => "Enter a number.".to_string(),
        PriceError::Negative => "Ensure this value is greater than or equal to 0.".to_string(),
        PriceError::TooLong { max } => format!("Ensure this value has at most {max} characters."),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn categories() -> Vec<CategoryId> {
        vec![CategoryId::new(1), CategoryId::new(2)]
    }

    fn suppliers() -> Vec<SupplierId> {
        vec![SupplierId::new(4), SupplierId::new(5)]
    }

    fn valid() -> ProductForm {
        ProductForm {
            title: "Greek Yoghurt".to_string(),
            description: "Full fat, 500g".to_string(),
            price: "3.20".to_string(),
            stock: "40".to_string(),
            expire_date: "2026-04-01".to_string(),
            category: "2".to_string(),
            suppliers: vec!["4".to_string(), "5".to_string(), "4".to_string()],
        }
    }

    #[test]
    fn test_valid_product() {
        let input = valid().validate(&categories(), &suppliers()).unwrap();
        assert_eq!(input.category_id, CategoryId::new(2));
        assert_eq!(input.supplier_ids, suppliers());
        assert_eq!(input.price.as_str(), "3.20");
        assert_eq!(input.expire_date, NaiveDate::from_ymd_opt(2026, 4, 1).unwrap());

        let new_product = input.into_new_product(None);
        assert!(new_product.image.is_none());
    }

    #[test]
    fn test_required_messages() {
        let errors = ProductForm::default()
            .validate(&categories(), &suppliers())
            .unwrap_err();
        assert_eq!(errors.get("title"), Some("title is required"));
        assert_eq!(errors.get("description"), Some("description is required"));
        assert_eq!(errors.get("price"), Some("price is required"));
        assert_eq!(errors.get("stock"), Some("stock is required"));
        assert_eq!(errors.get("expire_date"), Some("expire date is required"));
        assert_eq!(errors.get("category"), Some("category is required"));
        assert_eq!(errors.get("suppliers"), Some("suppliers is required"));
    }

    #[test]
    fn test_malformed_values() {
        let form = ProductForm {
            price: "cheap".to_string(),
            stock: "-3".to_string(),
            expire_date: "01/04/2026".to_string(),
            description: "x".repeat(501),
            ..valid()
        };
        let errors = form.validate(&categories(), &suppliers()).unwrap_err();
        assert_eq!(errors.get("price"), Some("Enter a number."));
        assert_eq!(
            errors.get("stock"),
            Some("Ensure this value is greater than or equal to 0.")
        );
        assert_eq!(errors.get("expire_date"), Some("Enter a valid date."));
        assert!(errors.has("description"));
        assert!(!errors.has("title"));
    }

    #[test]
    fn test_unknown_choices() {
        let form = ProductForm {
            category: "9".to_string(),
            suppliers: vec!["4".to_string(), "77".to_string()],
            ..valid()
        };
        let errors = form.validate(&categories(), &suppliers()).unwrap_err();
        assert_eq!(errors.get("category"), Some(INVALID_CHOICE));
        assert_eq!(
            errors.get("suppliers"),
            Some("Select a valid choice. 77 is not one of the available choices.")
        );
    }

    #[test]
    fn test_has_supplier() {
        let form = valid();
        assert!(form.has_supplier(&SupplierId::new(5)));
        assert!(!form.has_supplier(&SupplierId::new(6)));
    }
}
