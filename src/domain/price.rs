//! Catalog prices in integer minor units.
//!
//! Prices travel to the backend as integer cents; decimal dollar input from
//! forms is parsed here exactly once, with no floating point on the way.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Maximum fractional digits accepted from form input.
const MAX_FRACTION_DIGITS: usize = 2;

/// A positive amount of money in minor units (cents).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(u64);

impl Price {
    pub const fn from_minor_units(minor_units: u64) -> Self {
        Self(minor_units)
    }

    pub const fn minor_units(self) -> u64 {
        self.0
    }

    /// Parse decimal dollar input such as `"1299.00"` into minor units.
    ///
    /// Accepts an optional fractional part of up to two digits; a missing
    /// fractional part means whole dollars. Rejects empty input, signs,
    /// non-digits, and non-positive amounts.
    pub fn parse(input: &str) -> Result<Self, DomainError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("price is required"));
        }

        let (whole, fraction) = match trimmed.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (trimmed, ""),
        };
        if whole.is_empty() && fraction.is_empty() {
            return Err(DomainError::validation("price must be a decimal number"));
        }
        if !whole.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(DomainError::validation("price must be a decimal number"));
        }
        if fraction.len() > MAX_FRACTION_DIGITS || !fraction.bytes().all(|byte| byte.is_ascii_digit())
        {
            return Err(DomainError::validation(
                "price may have at most two fractional digits",
            ));
        }

        let dollars: u64 = if whole.is_empty() {
            0
        } else {
            whole
                .parse()
                .map_err(|_| DomainError::validation("price is out of range"))?
        };
        let mut cents: u64 = if fraction.is_empty() {
            0
        } else {
            fraction
                .parse()
                .map_err(|_| DomainError::validation("price is out of range"))?
        };
        if fraction.len() == 1 {
            cents *= 10;
        }

        let minor_units = dollars
            .checked_mul(100)
            .and_then(|value| value.checked_add(cents))
            .ok_or_else(|| DomainError::validation("price is out of range"))?;
        if minor_units == 0 {
            return Err(DomainError::validation("price must be greater than zero"));
        }
        Ok(Self(minor_units))
    }
}

impl fmt::Display for Price {
    /// Render as dollars with thousands separators, e.g. `$1,299.00`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dollars = self.0 / 100;
        let cents = self.0 % 100;

        let digits = dollars.to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (index, ch) in digits.chars().enumerate() {
            if index > 0 && (digits.len() - index) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }
        write!(f, "${grouped}.{cents:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dollars_and_cents() {
        assert_eq!(Price::parse("1299.00").unwrap().minor_units(), 129_900);
        assert_eq!(Price::parse("1299").unwrap().minor_units(), 129_900);
        assert_eq!(Price::parse("0.5").unwrap().minor_units(), 50);
        assert_eq!(Price::parse(".99").unwrap().minor_units(), 99);
        assert_eq!(Price::parse(" 42.10 ").unwrap().minor_units(), 4_210);
    }

    #[test]
    fn rejects_non_positive_and_garbage() {
        assert!(Price::parse("").is_err());
        assert!(Price::parse("0").is_err());
        assert!(Price::parse("0.00").is_err());
        assert!(Price::parse("-5").is_err());
        assert!(Price::parse("12.345").is_err());
        assert!(Price::parse("1,299").is_err());
        assert!(Price::parse("abc").is_err());
        assert!(Price::parse(".").is_err());
    }

    #[test]
    fn rejects_overflow() {
        assert!(Price::parse("18446744073709551615").is_err());
    }

    #[test]
    fn displays_with_grouping() {
        assert_eq!(Price::from_minor_units(129_900).to_string(), "$1,299.00");
        assert_eq!(Price::from_minor_units(50).to_string(), "$0.50");
        assert_eq!(Price::from_minor_units(123_456_789).to_string(), "$1,234,567.89");
    }
}
