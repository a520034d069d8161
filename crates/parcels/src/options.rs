//! Per-tenant parcel policy.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use parcelhub_core::ValueObject;

pub const DEFAULT_VOLUMETRIC_DIVISOR: i64 = 6000;

/// Policy switches resolved for one tenant at one point in time.
///
/// Passed explicitly into every operation that needs it; a refresh produces a
/// new value rather than mutating this one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParcelOptions {
    pub require_package_key: bool,
    pub use_price_table: bool,
    pub allow_manual_price: bool,
    pub allow_override_price_table: bool,
    pub use_volumetric_weight: bool,
    pub volumetric_divisor: Decimal,
    pub allow_pay_in_destination: bool,
    pub max_prints: i32,
    pub allow_reprint: bool,
    pub reprint_fee_enabled: bool,
}

impl Default for ParcelOptions {
    fn default() -> Self {
        Self {
            require_package_key: true,
            use_price_table: true,
            allow_manual_price: false,
            allow_override_price_table: true,
            use_volumetric_weight: false,
            volumetric_divisor: Decimal::from(DEFAULT_VOLUMETRIC_DIVISOR),
            allow_pay_in_destination: false,
            max_prints: 1,
            allow_reprint: false,
            reprint_fee_enabled: false,
        }
    }
}

impl ValueObject for ParcelOptions {}

impl ParcelOptions {
    /// Divisor for volumetric weight; non-positive values fall back to 6000.
    pub fn effective_volumetric_divisor(&self) -> Decimal {
        if self.volumetric_divisor > Decimal::ZERO {
            self.volumetric_divisor
        } else {
            Decimal::from(DEFAULT_VOLUMETRIC_DIVISOR)
        }
    }

    /// Print limit per document type; non-positive values mean one print.
    pub fn effective_max_prints(&self) -> u32 {
        if self.max_prints > 0 {
            self.max_prints as u32
        } else {
            1
        }
    }
}
