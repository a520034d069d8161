//! Choosing the price of one item under the tenant's price-table policy.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use parcelhub_core::{DomainError, DomainResult, error::codes};
use parcelhub_parcels::{ParcelOptions, PriceSource};

use crate::resolver::PriceQuery;
use crate::rule::{PriceRule, WILDCARD};

/// Price chosen for an item and where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub unit_price: Decimal,
    pub source: PriceSource,
}

impl Quote {
    fn manual(price: Decimal) -> Self {
        Self {
            unit_price: price,
            source: PriceSource::Manual,
        }
    }

    fn from_rule(rule: &PriceRule, quantity: u32, billable_weight: Decimal) -> DomainResult<Self> {
        Ok(Self {
            unit_price: rule.suggested_charge(quantity, billable_weight)?,
            source: PriceSource::PriceTable {
                rule_id: rule.id,
                currency: rule.currency,
            },
        })
    }
}

fn manual_disabled() -> DomainError {
    DomainError::conflict(
        codes::MANUAL_PRICE_DISABLED,
        "manual prices are disabled for this tenant",
    )
}

/// Decide the item price.
///
/// `resolve` is only called when the tenant prices from the table.
/// `manual_price` counts only when positive.
pub fn quote_item<F>(
    options: &ParcelOptions,
    query: &PriceQuery,
    quantity: u32,
    billable_weight: Decimal,
    manual_price: Option<Decimal>,
    resolve: F,
) -> DomainResult<Quote>
where
    F: FnOnce(&PriceQuery) -> DomainResult<Option<PriceRule>>,
{
    let manual = manual_price.filter(|p| *p > Decimal::ZERO);

    if !options.use_price_table {
        if !options.allow_manual_price {
            return Err(manual_disabled());
        }
        return manual
            .map(Quote::manual)
            .ok_or_else(|| DomainError::validation("unit_price must be positive"));
    }

    let Some(rule) = resolve(query)? else {
        if options.allow_manual_price {
            if let Some(price) = manual {
                return Ok(Quote::manual(price));
            }
        }
        return Err(DomainError::conflict(
            codes::NO_MATCHING_PRICE_RULE,
            format!(
                "no price rule for shipment_type={} origin={} destination={}; \
                 add a rule or a '{WILDCARD}' rule for that route",
                query.shipment_type, query.origin_office_id, query.destination_office_id,
            ),
        ));
    };

    let suggested = Quote::from_rule(&rule, quantity, billable_weight)?;
    tracing::debug!(rule_id = %rule.id, suggested = %suggested.unit_price, "price rule matched");
    match manual {
        Some(price) if options.allow_override_price_table => Ok(Quote::manual(price)),
        Some(_) if !options.allow_manual_price => Err(manual_disabled()),
        _ => Ok(suggested),
    }
}
