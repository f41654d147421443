//! Stock update form.

use serde::Deserialize;

use super::{FieldErrors, required};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StockForm {
    #[serde(default)]
    pub stock: String,
}

impl StockForm {
    /// The new stock level.
    ///
    /// # Errors
    ///
    /// Returns field errors unless the value is a non-negative integer.
    pub fn validate(&self) -> Result<i32, FieldErrors> {
        let mut errors = FieldErrors::new();
        let stock = required(&mut errors, "stock", &self.stock, "stock is required")
            .and_then(|raw| parse_stock(&mut errors, raw));
        match stock {
            Some(stock) => errors.into_result(stock),
            None => Err(errors),
        }
    }
}

/// Parse a stock level, recording an error on `stock` when invalid.
pub(crate) fn parse_stock(errors: &mut FieldErrors, raw: &str) -> Option<i32> {
    match raw.parse::<i32>() {
        Ok(stock) if stock >= 0 => Some(stock),
        Ok(_) => {
            errors.add("stock", "Ensure this value is greater than or equal to 0.");
            None
        }
        Err(_) => {
            errors.add("stock", "Enter a whole number.");
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(stock: &str) -> StockForm {
        StockForm {
            stock: stock.to_string(),
        }
    }

    #[test]
    fn test_valid_stock() {
        assert_eq!(form(" 42 ").validate(), Ok(42));
        assert_eq!(form("0").validate(), Ok(0));
    }

    #[test]
    fn test_invalid_stock() {
        assert_eq!(
            form("").validate().unwrap_err().get("stock"),
            Some("stock is required")
        );
        assert_eq!(
            form("-1").validate().unwrap_err().get("stock"),
            Some("Ensure this value is greater than or equal to 0.")
        );
        assert_eq!(
            form("ten").validate().unwrap_err().get("stock"),
            Some("Enter a whole number.")
        );
    }
}
