//! `parcelhub-pricing`: tenant price rules and how an item's price is chosen.
//!
//! - `rule`: the `PriceRule` record, office patterns (`*` wildcard), units.
//! - `resolver`: specificity scoring and best-match selection.
//! - `quote`: tenant price-table policy applied to one item.

pub mod quote;
pub mod resolver;
pub mod rule;

pub use quote::{Quote, quote_item};
pub use resolver::{PriceQuery, find_best_match, match_score};
pub use rule::{NewPriceRule, OfficePattern, PriceRule, PriceUnit, WILDCARD};
