//! Billable units inside a parcel and their weights.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use parcelhub_core::{
    Currency, DomainError, DomainResult, ParcelId, ParcelItemId, PriceRuleId, TenantId,
};

use crate::options::ParcelOptions;

/// Optional item dimensions, in centimetres.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub length_cm: Option<Decimal>,
    pub width_cm: Option<Decimal>,
    pub height_cm: Option<Decimal>,
}

impl Dimensions {
    pub fn new(length_cm: Decimal, width_cm: Decimal, height_cm: Decimal) -> Self {
        Self {
            length_cm: Some(length_cm),
            width_cm: Some(width_cm),
            height_cm: Some(height_cm),
        }
    }

    /// All three sides, if all are known.
    pub fn complete(&self) -> Option<(Decimal, Decimal, Decimal)> {
        Some((self.length_cm?, self.width_cm?, self.height_cm?))
    }

    fn validate(&self) -> DomainResult<()> {
        for (name, value) in [
            ("length_cm", self.length_cm),
            ("width_cm", self.width_cm),
            ("height_cm", self.height_cm),
        ] {
            if value.is_some_and(|v| v <= Decimal::ZERO) {
                return Err(DomainError::validation(format!("{name} must be positive")));
            }
        }
        Ok(())
    }
}

/// Weights derived for one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightBreakdown {
    /// Set only when volumetric weighing applied.
    pub volumetric_weight: Option<Decimal>,
    pub billable_weight: Decimal,
}

/// Billable weight of an item.
///
/// Volumetric weight is `L × W × H / divisor`, computed only when the tenant
/// enables it and all three dimensions are present. Billable weight is the
/// larger of real and volumetric weight, or the real weight otherwise.
/// Dimensions whose product does not fit a `Decimal` are a validation error.
pub fn compute_weights(
    weight_kg: Decimal,
    dimensions: &Dimensions,
    options: &ParcelOptions,
) -> DomainResult<WeightBreakdown> {
    let real_only = WeightBreakdown {
        volumetric_weight: None,
        billable_weight: weight_kg,
    };
    if !options.use_volumetric_weight {
        return Ok(real_only);
    }
    let Some((l, w, h)) = dimensions.complete() else {
        return Ok(real_only);
    };

    let volumetric = l
        .checked_mul(w)
        .and_then(|v| v.checked_mul(h))
        .and_then(|v| v.checked_div(options.effective_volumetric_divisor()))
        .ok_or_else(|| DomainError::validation("item dimensions out of range"))?;
    Ok(WeightBreakdown {
        volumetric_weight: Some(volumetric),
        billable_weight: weight_kg.max(volumetric),
    })
}

/// Where an item's price came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceSource {
    PriceTable {
        rule_id: PriceRuleId,
        currency: Currency,
    },
    Manual,
}

/// Input for adding an item to a parcel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewParcelItem {
    pub description: String,
    pub quantity: u32,
    pub weight_kg: Decimal,
    #[serde(flatten)]
    pub dimensions: Dimensions,
    /// Price typed in by the clerk; zero or absent means "none".
    #[serde(default)]
    pub manual_price: Option<Decimal>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewParcelItem {
    pub fn validate(&self) -> DomainResult<()> {
        if self.description.trim().is_empty() {
            return Err(DomainError::validation("description is required"));
        }
        if self.quantity == 0 {
            return Err(DomainError::validation("quantity must be at least 1"));
        }
        if self.weight_kg <= Decimal::ZERO {
            return Err(DomainError::validation("weight_kg must be positive"));
        }
        self.dimensions.validate()?;
        if self.manual_price.is_some_and(|p| p < Decimal::ZERO) {
            return Err(DomainError::validation("unit_price must not be negative"));
        }
        Ok(())
    }

    /// Manual price, when a positive one was supplied.
    pub fn positive_manual_price(&self) -> Option<Decimal> {
        self.manual_price.filter(|p| *p > Decimal::ZERO)
    }
}

/// One billable unit belonging to a parcel. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParcelItem {
    pub id: ParcelItemId,
    pub tenant_id: TenantId,
    pub parcel_id: ParcelId,
    pub description: String,
    pub quantity: u32,
    pub weight_kg: Decimal,
    pub length_cm: Option<Decimal>,
    pub width_cm: Option<Decimal>,
    pub height_cm: Option<Decimal>,
    pub volumetric_weight: Option<Decimal>,
    pub billable_weight: Decimal,
    pub unit_price: Decimal,
    pub price_source: PriceSource,
    pub content_type: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ParcelItem {
    pub fn new(
        tenant_id: TenantId,
        parcel_id: ParcelId,
        input: NewParcelItem,
        weights: WeightBreakdown,
        unit_price: Decimal,
        price_source: PriceSource,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ParcelItemId::new(),
            tenant_id,
            parcel_id,
            description: input.description.trim().to_string(),
            quantity: input.quantity,
            weight_kg: input.weight_kg,
            length_cm: input.dimensions.length_cm,
            width_cm: input.dimensions.width_cm,
            height_cm: input.dimensions.height_cm,
            volumetric_weight: weights.volumetric_weight,
            billable_weight: weights.billable_weight,
            unit_price,
            price_source,
            content_type: trimmed(input.content_type),
            notes: trimmed(input.notes),
            created_at,
        }
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
