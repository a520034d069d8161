//! Best-match selection over wildcarded price rules.
//!
//! A candidate must be active, belong to the tenant, have the same shipment
//! type and match both offices (exactly or through `*`). Candidates are
//! ranked by, in order:
//!
//! 1. specificity score (exact office = 10, wildcard = 1; range 2..=20),
//! 2. higher `priority`,
//! 3. earlier `created_at`,
//! 4. smaller rule id.
//!
//! The last two keys make the order total, so the same rule set always
//! yields the same answer regardless of storage order.

use core::cmp::Ordering;

use serde::{Deserialize, Serialize};

use parcelhub_core::{OfficeId, TenantId};
use parcelhub_parcels::ShipmentType;

use crate::rule::PriceRule;

/// Route a price is requested for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PriceQuery {
    pub shipment_type: ShipmentType,
    pub origin_office_id: OfficeId,
    pub destination_office_id: OfficeId,
}

impl PriceQuery {
    pub fn new(
        shipment_type: ShipmentType,
        origin_office_id: OfficeId,
        destination_office_id: OfficeId,
    ) -> Self {
        Self {
            shipment_type,
            origin_office_id,
            destination_office_id,
        }
    }
}

/// Specificity of `rule` for `query`, or `None` when it is not a candidate.
pub fn match_score(rule: &PriceRule, query: &PriceQuery) -> Option<u8> {
    if !rule.active || rule.shipment_type != query.shipment_type {
        return None;
    }
    let origin = rule.origin.score(&query.origin_office_id)?;
    let destination = rule.destination.score(&query.destination_office_id)?;
    Some(origin + destination)
}

/// `Greater` means `a` is the better match.
fn rank(a: (&PriceRule, u8), b: (&PriceRule, u8)) -> Ordering {
    let (ra, sa) = a;
    let (rb, sb) = b;
    sa.cmp(&sb)
        .then(ra.priority.cmp(&rb.priority))
        .then(rb.created_at.cmp(&ra.created_at))
        .then(rb.id.cmp(&ra.id))
}

/// Most specific rule of `tenant_id` for `query`.
pub fn find_best_match<'a, I>(
    rules: I,
    tenant_id: &TenantId,
    query: &PriceQuery,
) -> Option<&'a PriceRule>
where
    I: IntoIterator<Item = &'a PriceRule>,
{
    rules
        .into_iter()
        .filter(|r| &r.tenant_id == tenant_id)
        .filter_map(|r| match_score(r, query).map(|s| (r, s)))
        .max_by(|a, b| rank(*a, *b))
        .map(|(rule, _)| rule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{NewPriceRule, OfficePattern, PriceUnit};
    use chrono::{DateTime, Duration, Utc};
    use parcelhub_core::Currency;
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    fn test_tenant_id() -> TenantId {
        TenantId::new("T1").unwrap()
    }

    fn test_time() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn office(id: &str) -> OfficeId {
        OfficeId::new(id).unwrap()
    }

    fn rule(origin: &str, destination: &str, price: i64, priority: i32) -> PriceRule {
        PriceRule::create(
            test_tenant_id(),
            NewPriceRule {
                shipment_type: ShipmentType::Bus,
                origin: origin.parse().unwrap(),
                destination: destination.parse().unwrap(),
                unit: PriceUnit::PerItem,
                price: Decimal::from(price),
                currency: Currency::Pen,
                active: true,
                priority,
            },
            test_time(),
        )
        .unwrap()
    }

    fn query(origin: &str, destination: &str) -> PriceQuery {
        PriceQuery::new(ShipmentType::Bus, office(origin), office(destination))
    }

    #[test]
    fn more_specific_origin_wins() {
        let rules = vec![rule("O1", "*", 5, 0), rule("*", "*", 2, 0)];
        let q = query("O1", "D9");

        assert_eq!(match_score(&rules[0], &q), Some(11));
        assert_eq!(match_score(&rules[1], &q), Some(2));

        let best = find_best_match(&rules, &test_tenant_id(), &q).unwrap();
        assert_eq!(best.price, Decimal::from(5));
    }

    #[test]
    fn non_candidates_are_ignored() {
        let mut inactive = rule("O1", "D1", 9, 0);
        inactive.active = false;
        let mut cargo = rule("O1", "D1", 8, 0);
        cargo.shipment_type = ShipmentType::Carguero;
        let other_route = rule("O2", "D1", 7, 0);
        let mut other_tenant = rule("O1", "D1", 6, 0);
        other_tenant.tenant_id = TenantId::new("T2").unwrap();

        let rules = vec![inactive, cargo, other_route, other_tenant];
        assert!(find_best_match(&rules, &test_tenant_id(), &query("O1", "D1")).is_none());
    }

    #[test]
    fn priority_breaks_score_ties() {
        let rules = vec![rule("O1", "*", 5, 1), rule("*", "D1", 4, 3)];
        let best = find_best_match(&rules, &test_tenant_id(), &query("O1", "D1")).unwrap();
        assert_eq!(best.price, Decimal::from(4));
    }

    #[test]
    fn earliest_rule_breaks_full_ties() {
        let older = rule("O1", "D1", 5, 0);
        let mut newer = rule("O1", "D1", 6, 0);
        newer.created_at = test_time() + Duration::minutes(1);

        let rules = vec![newer, older.clone()];
        let best = find_best_match(&rules, &test_tenant_id(), &query("O1", "D1")).unwrap();
        assert_eq!(best.id, older.id);
    }

    fn pattern() -> impl Strategy<Value = &'static str> {
        prop_oneof![Just("*"), Just("O1"), Just("O2"), Just("D1"), Just("D2")]
    }

    fn rules_strategy() -> impl Strategy<Value = Vec<PriceRule>> {
        prop::collection::vec(
            (pattern(), pattern(), 1i64..100, -5i32..5, 0i64..3),
            0..20,
        )
        .prop_map(|specs| {
            specs
                .into_iter()
                .map(|(o, d, price, priority, minutes)| {
                    let mut r = rule(o, d, price, priority);
                    r.created_at = test_time() + Duration::minutes(minutes);
                    r
                })
                .collect()
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        #[test]
        fn selection_is_independent_of_storage_order(rules in rules_strategy()) {
            let q = query("O1", "D1");
            let forward = find_best_match(&rules, &test_tenant_id(), &q).map(|r| r.id);
            let reversed: Vec<PriceRule> = rules.iter().rev().cloned().collect();
            let backward = find_best_match(&reversed, &test_tenant_id(), &q).map(|r| r.id);
            prop_assert_eq!(forward, backward);
            prop_assert_eq!(forward, find_best_match(&rules, &test_tenant_id(), &q).map(|r| r.id));
        }

        #[test]
        fn exact_route_outranks_any_wildcard(
            mut rules in rules_strategy(),
            exact_priority in -1000i32..-500,
        ) {
            let exact = rule("O1", "D1", 42, exact_priority);
            rules.push(exact.clone());
            let best = find_best_match(&rules, &test_tenant_id(), &query("O1", "D1")).unwrap();
            prop_assert!(matches!(best.origin, OfficePattern::Exact(_)));
            prop_assert!(matches!(best.destination, OfficePattern::Exact(_)));
            prop_assert_eq!(match_score(best, &query("O1", "D1")), Some(20));
        }
    }
}
