//! Alert emails to administrators.
//!
//! Each alert is rendered once and sent to every recipient separately, so a
//! bad address or a transport failure only costs that one message.

use std::ops::AddAssign;

use askama::Template;

use super::email::{EmailError, Mailer};
use super::monitor::{ExpiryAlert, LowStockAlert, LOW_STOCK_THRESHOLD};

pub const EXPIRY_SUBJECT: &str = "Product Expiry Alert";
pub const LOW_STOCK_SUBJECT: &str = "Low Stock Alert";

/// Outcome of sending one alert to a list of recipients.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub sent: usize,
    pub failed: usize,
}

impl AddAssign for DispatchReport {
    fn add_assign(&mut self, other: Self) {
        self.sent += other.sent;
        self.failed += other.failed;
    }
}

#[derive(Template)]
#[template(path = "email/expiry_alert.html")]
struct ExpiryAlertHtml<'a> {
    title: &'a str,
    expire_date: String,
    days_remaining: i64,
    status: &'a str,
}

#[derive(Template)]
#[template(path = "email/expiry_alert.txt")]
struct ExpiryAlertText<'a> {
    title: &'a str,
    expire_date: String,
    days_remaining: i64,
    status: &'a str,
}

#[derive(Template)]
#[template(path = "email/low_stock_alert.html")]
struct LowStockAlertHtml<'a> {
    title: &'a str,
    stock: i32,
    date: String,
    threshold: i32,
}

#[derive(Template)]
#[template(path = "email/low_stock_alert.txt")]
struct LowStockAlertText<'a> {
    title: &'a str,
    stock: i32,
    date: String,
    threshold: i32,
}

/// Render the plain text and HTML bodies of an expiry alert.
///
/// # Errors
///
/// Returns `EmailError::Template` if a template fails to render.
pub fn render_expiry_alert(alert: &ExpiryAlert) -> Result<(String, String), EmailError> {
    let expire_date = alert.expire_date.format("%Y-%m-%d").to_string();
    let text = ExpiryAlertText {
        title: &alert.title,
        expire_date: expire_date.clone(),
        days_remaining: alert.days_remaining,
        status: alert.status.label(),
    }
    .render()?;
    let html = ExpiryAlertHtml {
        title: &alert.title,
        expire_date,
        days_remaining: alert.days_remaining,
        status: alert.status.label(),
    }
    .render()?;
    Ok((text, html))
}

/// Render the plain text and HTML bodies of a low-stock alert.
///
/// # Errors
///
/// Returns `EmailError::Template` if a template fails to render.
pub fn render_low_stock_alert(alert: &LowStockAlert) -> Result<(String, String), EmailError> {
    let date = alert.date.format("%Y-%m-%d").to_string();
    let text = LowStockAlertText {
        title: &alert.title,
        stock: alert.stock,
        date: date.clone(),
        threshold: LOW_STOCK_THRESHOLD,
    }
    .render()?;
    let html = LowStockAlertHtml {
        title: &alert.title,
        stock: alert.stock,
        date,
        threshold: LOW_STOCK_THRESHOLD,
    }
    .render()?;
    Ok((text, html))
}

pub async fn send_expiry_alert<M: Mailer>(
    mailer: &M,
    recipients: &[String],
    alert: &ExpiryAlert,
) -> DispatchReport {
    match render_expiry_alert(alert) {
        Ok((text, html)) => dispatch(mailer, recipients, EXPIRY_SUBJECT, &text, &html).await,
        Err(e) => {
            tracing::error!(product = %alert.title, "Failed to render expiry alert: {e}");
            DispatchReport {
                sent: 0,
                failed: recipients.len(),
            }
        }
    }
}

pub async fn send_low_stock_alert<M: Mailer>(
    mailer: &M,
    recipients: &[String],
    alert: &LowStockAlert,
) -> DispatchReport {
    match render_low_stock_alert(alert) {
        Ok((text, html)) => dispatch(mailer, recipients, LOW_STOCK_SUBJECT, &text, &html).await,
        Err(e) => {
            tracing::error!(product = %alert.title, "Failed to render low stock alert: {e}");
            DispatchReport {
                sent: 0,
                failed: recipients.len(),
            }
        }
    }
}

/// Send one rendered message to each recipient in turn.
async fn dispatch<M: Mailer>(
    mailer: &M,
    recipients: &[String],
    subject: &str,
    text_body: &str,
    html_body: &str,
) -> DispatchReport {
    let mut report = DispatchReport::default();
    for to in recipients {
        match mailer.send(to, subject, text_body, html_body).await {
            Ok(()) => report.sent += 1,
            Err(e) => {
                tracing::warn!(to = %to, subject = %subject, "Failed to send alert: {e}");
                report.failed += 1;
            }
        }
    }
    report
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::services::email::testing::RecordingMailer;
    use crate::services::monitor::ExpiryStatus;

    fn expiry_alert() -> ExpiryAlert {
        ExpiryAlert {
            title: "Greek Yoghurt".to_string(),
            expire_date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            days_remaining: 4,
            status: ExpiryStatus::ExpiringSoon,
        }
    }

    fn admins(addresses: &[&str]) -> Vec<String> {
        addresses.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_expiry_alert_body() {
        let (text, html) = render_expiry_alert(&expiry_alert()).unwrap();
        for body in [&text, &html] {
            assert!(body.contains("Greek Yoghurt"));
            assert!(body.contains("2026-03-14"));
            assert!(body.contains("4 days"));
            assert!(body.contains("Expiring soon"));
        }
    }

    #[test]
    fn test_low_stock_alert_body() {
        let alert = LowStockAlert {
            title: "Oat Milk".to_string(),
            stock: 12,
            date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
        };
        let (text, html) = render_low_stock_alert(&alert).unwrap();
        for body in [&text, &html] {
            assert!(body.contains("Oat Milk"));
            assert!(body.contains("12 units"));
            assert!(body.contains("2026-01-05"));
            assert!(body.contains("reached minimum stock (100 units)"));
        }
    }

    #[tokio::test]
    async fn test_sends_one_message_per_administrator() {
        let mailer = RecordingMailer::default();
        let report =
            send_expiry_alert(&mailer, &admins(&["a@example.com", "b@example.com"]), &expiry_alert())
                .await;

        assert_eq!(report, DispatchReport { sent: 2, failed: 0 });
        let sent = mailer.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|m| m.subject == EXPIRY_SUBJECT));
        assert_eq!(sent[1].to, "b@example.com");
    }

    #[tokio::test]
    async fn test_failed_recipient_does_not_block_others() {
        let mailer = RecordingMailer::failing_for(&["broken@example.com"]);
        let report = send_expiry_alert(
            &mailer,
            &admins(&["broken@example.com", "ok@example.com"]),
            &expiry_alert(),
        )
        .await;

        assert_eq!(report, DispatchReport { sent: 1, failed: 1 });
        assert_eq!(mailer.sent()[0].to, "ok@example.com");
    }

    #[tokio::test]
    async fn test_no_recipients_sends_nothing() {
        let mailer = RecordingMailer::default();
        let report = send_expiry_alert(&mailer, &[], &expiry_alert()).await;
        assert_eq!(report, DispatchReport::default());
        assert!(mailer.sent().is_empty());
    }

    #[test]
    fn test_reports_add_up() {
        let mut total = DispatchReport { sent: 1, failed: 2 };
        total += DispatchReport { sent: 3, failed: 0 };
        assert_eq!(total, DispatchReport { sent: 4, failed: 2 });
    }
}
