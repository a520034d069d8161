//! Value object trait: equality by value, not identity.
//!
//! Value objects have **no identity**; two value objects with the same values
//! are the same value. To "modify" one, build a new one.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value** (e.g. a tenant's
/// resolved policy bundle, a price currency).
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

/// Currency of a price or payment amount.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Pen,
    Usd,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Pen => "PEN",
            Currency::Usd => "USD",
        }
    }
}

impl ValueObject for Currency {}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Currency {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PEN" => Ok(Currency::Pen),
            "USD" => Ok(Currency::Usd),
            other => Err(DomainError::validation(format!(
                "currency must be one of: PEN, USD (got '{other}')"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_parses_case_insensitively() {
        assert_eq!("pen".parse::<Currency>().unwrap(), Currency::Pen);
        assert_eq!(" USD ".parse::<Currency>().unwrap(), Currency::Usd);
        assert!("EUR".parse::<Currency>().is_err());
    }
}
