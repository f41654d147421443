//! Email transport for alert notifications.
//!
//! Uses SMTP via lettre. Messages are multipart with a plain text and an
//! HTML version; rendering happens in [`super::notifier`].

use std::future::Future;

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Something that can deliver a rendered multipart email.
///
/// [`EmailService`] is the SMTP implementation; tests substitute a
/// recording fake.
pub trait Mailer: Send + Sync {
    /// Send one message to one recipient.
    fn send(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> impl Future<Output = Result<(), EmailError>> + Send;
}

/// SMTP email service.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// No connection is made until the first message is sent.
    ///
    /// # Errors
    ///
    /// Returns error if the relay host is invalid.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent");
        Ok(())
    }
}

impl Mailer for EmailService {
    fn send(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> impl Future<Output = Result<(), EmailError>> + Send {
        self.send_multipart_email(to, subject, text_body, html_body)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Recording mailer for notifier and monitor tests.

    use std::sync::Mutex;

    use super::{EmailError, Mailer};

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct SentEmail {
        pub to: String,
        pub subject: String,
        pub text_body: String,
        pub html_body: String,
    }

    /// Records every message; fails for addresses listed in `failing`.
    #[derive(Default)]
    pub struct RecordingMailer {
        pub sent: Mutex<Vec<SentEmail>>,
        pub failing: Vec<String>,
    }

    impl RecordingMailer {
        pub fn failing_for(addresses: &[&str]) -> Self {
            Self {
                sent: Mutex::default(),
                failing: addresses.iter().map(ToString::to_string).collect(),
            }
        }

        #[allow(clippy::unwrap_used)]
        pub fn sent(&self) -> Vec<SentEmail> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl Mailer for RecordingMailer {
        #[allow(clippy::unwrap_used)]
        async fn send(
            &self,
            to: &str,
            subject: &str,
            text_body: &str,
            html_body: &str,
        ) -> Result<(), EmailError> {
            if self.failing.iter().any(|f| f == to) {
                return Err(EmailError::InvalidAddress(to.to_string()));
            }
            self.sent.lock().unwrap().push(SentEmail {
                to: to.to_string(),
                subject: subject.to_string(),
                text_body: text_body.to_string(),
                html_body: html_body.to_string(),
            });
            Ok(())
        }
    }
}
