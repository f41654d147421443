//! Product price as stored text.
//!
//! Prices live in a `TEXT` column. New input is validated as a decimal
//! number before it is written; values already in the database are read
//! back verbatim, so a `Price` obtained from a row may not be numeric.

use core::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Reasons a price string is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PriceError {
    #[error("price is required")]
    Empty,
    #[error("price must be a number")]
    NotANumber,
    #[error("price must not be negative")]
    Negative,
    #[error("price must be at most {max} characters")]
    TooLong { max: usize },
}

/// A product price in its textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(String);

impl Price {
    /// Longest price text accepted (matches the column's intended width).
    pub const MAX_LENGTH: usize = 20;

    /// Validate user input as a non-negative decimal number.
    ///
    /// The trimmed input is kept as typed, so `"4.50"` stays `"4.50"`.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError`] if the input is empty, too long, not a
    /// decimal number, or negative.
    pub fn parse(input: &str) -> Result<Self, PriceError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(PriceError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(PriceError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        let value = Decimal::from_str(s).map_err(|_| PriceError::NotANumber)?;
        if value.is_sign_negative() && !value.is_zero() {
            return Err(PriceError::Negative);
        }
        Ok(Self(s.to_owned()))
    }

    /// Build a price from a float, as produced by CSV import.
    ///
    /// Whole numbers keep one decimal place (`2` becomes `"2.0"`).
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::NotANumber`] for NaN, infinities and values
    /// that do not fit a `Decimal`, and [`PriceError::TooLong`] when the
    /// text would exceed [`Self::MAX_LENGTH`].
    pub fn from_f64(value: f64) -> Result<Self, PriceError> {
        if !value.is_finite() {
            return Err(PriceError::NotANumber);
        }
        let mut text = value.to_string();
        if !text.contains('.') {
            text.push_str(".0");
        }
        if text.len() > Self::MAX_LENGTH {
            return Err(PriceError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        Decimal::from_str(&text).map_err(|_| PriceError::NotANumber)?;
        Ok(Self(text))
    }

    /// Wrap stored text without validation.
    #[must_use]
    pub const fn from_stored(text: String) -> Self {
        Self(text)
    }

    /// The numeric value, if the text is a decimal number.
    #[must_use]
    pub fn amount(&self) -> Option<Decimal> {
        Decimal::from_str(self.0.trim()).ok()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Price {
    fn default() -> Self {
        Self("0".to_owned())
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        <String as sqlx::Decode<sqlx::Postgres>>::decode(value).map(Self)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_input_text() {
        assert_eq!(Price::parse(" 4.50 ").unwrap().as_str(), "4.50");
        assert_eq!(Price::parse("12").unwrap().as_str(), "12");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(Price::parse(""), Err(PriceError::Empty));
        assert_eq!(Price::parse("twelve"), Err(PriceError::NotANumber));
        assert_eq!(Price::parse("-1"), Err(PriceError::Negative));
        assert!(matches!(
            Price::parse("1234567890.1234567890"),
            Err(PriceError::TooLong { .. })
        ));
    }

    #[test]
    fn test_stored_text_is_not_validated() {
        let price = Price::from_stored("ask".to_owned());
        assert_eq!(price.as_str(), "ask");
        assert!(price.amount().is_none());
    }

    #[test]
    fn test_from_f64() {
        assert_eq!(Price::from_f64(9.99).unwrap().as_str(), "9.99");
        assert_eq!(Price::from_f64(2.0).unwrap().as_str(), "2.0");
        assert_eq!(Price::from_f64(3.0).unwrap().amount(), Some(Decimal::new(3, 0)));
    }

    #[test]
    fn test_from_f64_rejects_values_outside_decimal_range() {
        assert!(matches!(
            Price::from_f64(1e30),
            Err(PriceError::TooLong { .. })
        ));
        assert_eq!(Price::from_f64(f64::NAN), Err(PriceError::NotANumber));
        assert_eq!(Price::from_f64(f64::INFINITY), Err(PriceError::NotANumber));
        assert!(Price::from_f64(12_345_678.5).unwrap().amount().is_some());
    }

    #[test]
    fn test_default_is_zero() {
        assert_eq!(Price::default().as_str(), "0");
    }
}
