//! Stock and expiry threshold checks.
//!
//! The expiry scan runs after every successful login; the low-stock check
//! runs after a manual stock update. Both email every administrator and
//! never fail the request that triggered them.

use chrono::{Days, NaiveDate};
use sqlx::PgPool;

use super::email::Mailer;
use super::notifier::{self, DispatchReport};
use crate::db::{ProductRepository, RepositoryError, UserRepository};
use crate::models::Product;

/// Products expiring within this many days of today are reported.
pub const EXPIRY_WINDOW_DAYS: u64 = 10;

/// Stock at or below this level triggers a low-stock alert.
pub const LOW_STOCK_THRESHOLD: i32 = 100;

/// Where a product stands relative to its expiry date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryStatus {
    Expired,
    ExpiringSoon,
}

impl ExpiryStatus {
    #[must_use]
    pub const fn from_days_remaining(days: i64) -> Self {
        if days <= 0 {
            Self::Expired
        } else {
            Self::ExpiringSoon
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Expired => "Expired",
            Self::ExpiringSoon => "Expiring soon",
        }
    }
}

impl std::fmt::Display for ExpiryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One product nearing its expiry date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiryAlert {
    pub title: String,
    pub expire_date: NaiveDate,
    pub days_remaining: i64,
    pub status: ExpiryStatus,
}

impl ExpiryAlert {
    #[must_use]
    pub fn for_product(product: &Product, today: NaiveDate) -> Self {
        let days_remaining = product.days_to_expire(today);
        Self {
            title: product.title.clone(),
            expire_date: product.expire_date,
            days_remaining,
            status: ExpiryStatus::from_days_remaining(days_remaining),
        }
    }
}

/// A product whose stock fell to the threshold or below.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LowStockAlert {
    pub title: String,
    pub stock: i32,
    /// Creation date of the product.
    pub date: NaiveDate,
}

/// Inclusive date range covered by the expiry scan.
#[must_use]
pub fn expiry_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let end = today
        .checked_add_days(Days::new(EXPIRY_WINDOW_DAYS))
        .unwrap_or(NaiveDate::MAX);
    (today, end)
}

/// Alerts for the products that expire inside the window, in input order.
#[must_use]
pub fn expiry_alerts(products: &[Product], today: NaiveDate) -> Vec<ExpiryAlert> {
    let (from, to) = expiry_window(today);
    products
        .iter()
        .filter(|p| (from..=to).contains(&p.expire_date))
        .map(|p| ExpiryAlert::for_product(p, today))
        .collect()
}

/// The alert for a product after a stock change, if it is low.
#[must_use]
pub fn low_stock_alert(product: &Product) -> Option<LowStockAlert> {
    (product.stock <= LOW_STOCK_THRESHOLD).then(|| LowStockAlert {
        title: product.title.clone(),
        stock: product.stock,
        date: product.created_at.date_naive(),
    })
}

/// Email every administrator about each product expiring in the window.
///
/// # Errors
///
/// Returns `RepositoryError` if the products or recipients cannot be
/// loaded. Delivery failures are only counted.
pub async fn run_expiry_scan<M: Mailer>(
    pool: &PgPool,
    mailer: &M,
    today: NaiveDate,
) -> Result<DispatchReport, RepositoryError> {
    let (from, to) = expiry_window(today);
    let products = ProductRepository::new(pool)
        .expiring_between(from, to)
        .await?;
    let alerts = expiry_alerts(&products, today);
    if alerts.is_empty() {
        return Ok(DispatchReport::default());
    }

    let recipients = UserRepository::new(pool).administrator_emails().await?;
    let mut report = DispatchReport::default();
    for alert in &alerts {
        report += notifier::send_expiry_alert(mailer, &recipients, alert).await;
    }

    tracing::info!(
        products = alerts.len(),
        sent = report.sent,
        failed = report.failed,
        "Expiry scan finished"
    );
    Ok(report)
}

/// Email every administrator if `product` is now at or below the threshold.
///
/// # Errors
///
/// Returns `RepositoryError` if the recipients cannot be loaded.
pub async fn check_low_stock<M: Mailer>(
    pool: &PgPool,
    mailer: &M,
    product: &Product,
) -> Result<DispatchReport, RepositoryError> {
    let Some(alert) = low_stock_alert(product) else {
        return Ok(DispatchReport::default());
    };

    let recipients = UserRepository::new(pool).administrator_emails().await?;
    let report = notifier::send_low_stock_alert(mailer, &recipients, &alert).await;

    tracing::info!(
        product_id = %product.id,
        stock = product.stock,
        sent = report.sent,
        failed = report.failed,
        "Low stock alert dispatched"
    );
    Ok(report)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};
    use stockroom_core::{CategoryId, Price, ProductId};

    use super::*;
    use crate::models::DEFAULT_IMAGE;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn product(id: i32, stock: i32, expire_date: NaiveDate) -> Product {
        Product {
            id: ProductId::new(id),
            title: format!("Product {id}"),
            description: String::new(),
            image: DEFAULT_IMAGE.to_string(),
            price: Price::default(),
            stock,
            category_id: CategoryId::new(1),
            expire_date,
            created_at: Utc.with_ymd_and_hms(2026, 1, 5, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_expiry_window_is_ten_days_inclusive() {
        let (from, to) = expiry_window(date(2026, 3, 25));
        assert_eq!(from, date(2026, 3, 25));
        assert_eq!(to, date(2026, 4, 4));
    }

    #[test]
    fn test_expiry_alerts_filters_and_computes_status() {
        let today = date(2026, 3, 1);
        let products = vec![
            product(1, 10, date(2026, 3, 1)),
            product(2, 10, date(2026, 3, 4)),
            product(3, 10, date(2026, 3, 11)),
            product(4, 10, date(2026, 3, 12)),
            product(5, 10, date(2026, 2, 27)),
        ];

        let alerts = expiry_alerts(&products, today);
        let summary: Vec<_> = alerts
            .iter()
            .map(|a| (a.title.as_str(), a.days_remaining, a.status))
            .collect();

        assert_eq!(
            summary,
            vec![
                ("Product 1", 0, ExpiryStatus::Expired),
                ("Product 2", 3, ExpiryStatus::ExpiringSoon),
                ("Product 3", 10, ExpiryStatus::ExpiringSoon),
            ]
        );
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(ExpiryStatus::from_days_remaining(-1).label(), "Expired");
        assert_eq!(ExpiryStatus::from_days_remaining(0).label(), "Expired");
        assert_eq!(ExpiryStatus::from_days_remaining(1).to_string(), "Expiring soon");
    }

    #[test]
    fn test_low_stock_threshold_is_inclusive() {
        let expire = date(2026, 6, 1);
        assert!(low_stock_alert(&product(1, 100, expire)).is_some());
        assert!(low_stock_alert(&product(1, 0, expire)).is_some());
        assert!(low_stock_alert(&product(1, 101, expire)).is_none());
    }

    #[test]
    fn test_low_stock_alert_uses_creation_date() {
        let alert = low_stock_alert(&product(9, 42, date(2026, 6, 1))).unwrap();
        assert_eq!(
            alert,
            LowStockAlert {
                title: "Product 9".to_string(),
                stock: 42,
                date: date(2026, 1, 5),
            }
        );
    }
}
