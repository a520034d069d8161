use core::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use parcelhub_core::{Currency, DomainError, DomainResult, OfficeId, PriceRuleId, TenantId};
use parcelhub_parcels::ShipmentType;

/// Office value that matches any office.
pub const WILDCARD: &str = "*";

/// Origin or destination side of a rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OfficePattern {
    Any,
    Exact(OfficeId),
}

impl OfficePattern {
    /// Match weight against a concrete office: 10 exact, 1 wildcard.
    pub fn score(&self, office: &OfficeId) -> Option<u8> {
        match self {
            OfficePattern::Exact(id) if id == office => Some(10),
            OfficePattern::Exact(_) => None,
            OfficePattern::Any => Some(1),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, OfficePattern::Any)
    }

    pub fn as_str(&self) -> &str {
        match self {
            OfficePattern::Any => WILDCARD,
            OfficePattern::Exact(id) => id.as_str(),
        }
    }
}

impl core::fmt::Display for OfficePattern {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OfficePattern {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(DomainError::validation(
                "office must be an office id or '*'",
            ));
        }
        if s == WILDCARD {
            return Ok(OfficePattern::Any);
        }
        Ok(OfficePattern::Exact(OfficeId::new(s)?))
    }
}

impl TryFrom<String> for OfficePattern {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OfficePattern> for String {
    fn from(value: OfficePattern) -> Self {
        value.as_str().to_string()
    }
}

impl From<OfficeId> for OfficePattern {
    fn from(value: OfficeId) -> Self {
        OfficePattern::Exact(value)
    }
}

/// What the rule price is multiplied by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceUnit {
    PerKg,
    PerItem,
}

impl PriceUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceUnit::PerKg => "PER_KG",
            PriceUnit::PerItem => "PER_ITEM",
        }
    }
}

impl FromStr for PriceUnit {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PER_KG" => Ok(PriceUnit::PerKg),
            "PER_ITEM" => Ok(PriceUnit::PerItem),
            other => Err(DomainError::validation(format!(
                "unit must be one of: PER_KG, PER_ITEM (got '{other}')"
            ))),
        }
    }
}

/// Create/update payload for a price rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPriceRule {
    pub shipment_type: ShipmentType,
    pub origin: OfficePattern,
    pub destination: OfficePattern,
    pub unit: PriceUnit,
    pub price: Decimal,
    pub currency: Currency,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub priority: i32,
}

fn default_active() -> bool {
    true
}

impl NewPriceRule {
    pub fn validate(&self) -> DomainResult<()> {
        if self.price <= Decimal::ZERO {
            return Err(DomainError::validation("price must be positive"));
        }
        Ok(())
    }
}

/// Tenant-scoped billing rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRule {
    pub id: PriceRuleId,
    pub tenant_id: TenantId,
    pub shipment_type: ShipmentType,
    pub origin: OfficePattern,
    pub destination: OfficePattern,
    pub unit: PriceUnit,
    pub price: Decimal,
    pub currency: Currency,
    pub active: bool,
    pub priority: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PriceRule {
    pub fn create(tenant_id: TenantId, input: NewPriceRule, now: DateTime<Utc>) -> DomainResult<Self> {
        input.validate()?;
        Ok(Self {
            id: PriceRuleId::new(),
            tenant_id,
            shipment_type: input.shipment_type,
            origin: input.origin,
            destination: input.destination,
            unit: input.unit,
            price: input.price,
            currency: input.currency,
            active: input.active,
            priority: input.priority,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replace the editable fields; identity and `created_at` stay.
    pub fn updated(&self, input: NewPriceRule, now: DateTime<Utc>) -> DomainResult<Self> {
        let mut next = Self::create(self.tenant_id.clone(), input, now)?;
        next.id = self.id;
        next.created_at = self.created_at;
        Ok(next)
    }

    /// Suggested charge for one item line.
    pub fn suggested_charge(&self, quantity: u32, billable_weight: Decimal) -> DomainResult<Decimal> {
        let factor = match self.unit {
            PriceUnit::PerItem => Decimal::from(quantity),
            PriceUnit::PerKg => billable_weight,
        };
        self.price
            .checked_mul(factor)
            .ok_or_else(|| DomainError::validation("suggested charge out of range"))
    }
}
