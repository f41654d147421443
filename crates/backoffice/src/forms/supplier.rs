//! Supplier form.

use url::Url;

use stockroom_core::Email;

use super::{FieldErrors, MultipartForm, max_length, required};
use crate::models::Supplier;

/// Raw supplier form values, kept for re-rendering.
#[derive(Debug, Clone, Default)]
pub struct SupplierForm {
    pub name: String,
    pub email: String,
    pub website: String,
    pub phone: String,
}

/// Validated supplier fields. The logo upload is handled separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupplierInput {
    pub name: String,
    pub email: Email,
    pub website: String,
    pub phone: String,
}

impl SupplierForm {
    #[must_use]
    pub fn from_multipart(form: &MultipartForm) -> Self {
        Self {
            name: form.text("name").to_string(),
            email: form.text("email").to_string(),
            website: form.text("website").to_string(),
            phone: form.text("phone").to_string(),
        }
    }

    /// Prefill from an existing supplier.
    #[must_use]
    pub fn from_supplier(supplier: &Supplier) -> Self {
        Self {
            name: supplier.name.clone(),
            email: supplier.email.to_string(),
            website: supplier.website.clone(),
            phone: supplier.phone.clone(),
        }
    }

    /// # Errors
    ///
    /// Returns field errors for blank fields, an invalid email address or a
    /// website that is not an http(s) URL.
    pub fn validate(&self) -> Result<SupplierInput, FieldErrors> {
        let mut errors = FieldErrors::new();

        let name = required(&mut errors, "name", &self.name, "name is required");
        if let Some(name) = name {
            max_length(&mut errors, "name", name, 100);
        }

        let email = required(&mut errors, "email", &self.email, "email is required").and_then(
            |raw| match Email::parse(raw) {
                Ok(email) => Some(email),
                Err(_) => {
                    errors.add("email", "Enter a valid email address.");
                    None
                }
            },
        );

        let website = required(&mut errors, "website", &self.website, "website is required");
        if let Some(website) = website {
            if !is_web_url(website) {
                errors.add("website", "Enter a valid URL.");
            }
            max_length(&mut errors, "website", website, 200);
        }

        let phone = required(&mut errors, "phone", &self.phone, "phone is required");
        if let Some(phone) = phone {
            max_length(&mut errors, "phone", phone, 30);
        }

        match (name, email, website, phone) {
            (Some(name), Some(email), Some(website), Some(phone)) if errors.is_empty() => {
                Ok(SupplierInput {
                    name: name.to_string(),
                    email,
                    website: website.to_string(),
                    phone: phone.to_string(),
                })
            }
            _ => Err(errors),
        }
    }
}

fn is_web_url(value: &str) -> bool {
    Url::parse(value)
        .is_ok_and(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid() -> SupplierForm {
        SupplierForm {
            name: "Acme Dairy".to_string(),
            email: "orders@acme.example".to_string(),
            website: "https://acme.example".to_string(),
            phone: "+1 555 0100".to_string(),
        }
    }

    #[test]
    fn test_valid_supplier() {
        let input = valid().validate().unwrap();
        assert_eq!(input.name, "Acme Dairy");
        assert_eq!(input.email.as_str(), "orders@acme.example");
    }

    #[test]
    fn test_all_fields_required() {
        let errors = SupplierForm::default().validate().unwrap_err();
        assert_eq!(errors.get("name"), Some("name is required"));
        assert_eq!(errors.get("email"), Some("email is required"));
        assert_eq!(errors.get("website"), Some("website is required"));
        assert_eq!(errors.get("phone"), Some("phone is required"));
    }

    #[test]
    fn test_rejects_bad_email_and_website() {
        let form = SupplierForm {
            email: "not-an-email".to_string(),
            website: "ftp://acme.example".to_string(),
            ..valid()
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.get("email"), Some("Enter a valid email address."));
        assert_eq!(errors.get("website"), Some("Enter a valid URL."));
        assert!(!errors.has("name"));
    }

    #[test]
    fn test_reads_multipart_fields() {
        let multipart = MultipartForm::with_fields(&[("name", "Acme"), ("phone", "1")]);
        let form = SupplierForm::from_multipart(&multipart);
        assert_eq!(form.name, "Acme");
        assert_eq!(form.email, "");
    }
}
