use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chrono::{Duration, Utc};
use parcelhub_core::{Currency, OfficeId, TenantId};
use parcelhub_parcels::ShipmentType;
use parcelhub_pricing::{NewPriceRule, PriceQuery, PriceRule, PriceUnit, find_best_match};
use rust_decimal::Decimal;

/// Rule table with a mix of exact and wildcard routes across `offices` offices.
fn rule_table(tenant_id: &TenantId, size: usize, offices: usize) -> Vec<PriceRule> {
    let now = Utc::now();
    (0..size)
        .map(|i| {
            let origin = match i % 4 {
                0 => "*".to_string(),
                _ => format!("O{}", i % offices),
            };
            let destination = match i % 3 {
                0 => "*".to_string(),
                _ => format!("D{}", (i / 3) % offices),
            };
            let mut rule = PriceRule::create(
                tenant_id.clone(),
                NewPriceRule {
                    shipment_type: if i % 5 == 0 {
                        ShipmentType::Carguero
                    } else {
                        ShipmentType::Bus
                    },
                    origin: origin.parse().expect("valid origin"),
                    destination: destination.parse().expect("valid destination"),
                    unit: PriceUnit::PerKg,
                    price: Decimal::new(100 + i as i64, 2),
                    currency: Currency::Pen,
                    active: i % 7 != 0,
                    priority: (i % 5) as i32,
                },
                now,
            )
            .expect("valid rule");
            rule.created_at = now + Duration::milliseconds(i as i64);
            rule
        })
        .collect()
}

fn bench_find_best_match(c: &mut Criterion) {
    let tenant_id = TenantId::new("bench-tenant").expect("tenant");
    let query = PriceQuery::new(
        ShipmentType::Bus,
        OfficeId::new("O3").expect("office"),
        OfficeId::new("D7").expect("office"),
    );

    let mut group = c.benchmark_group("find_best_match");
    for size in [10usize, 100, 1_000, 10_000] {
        let rules = rule_table(&tenant_id, size, 20);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &rules, |b, rules| {
            b.iter(|| find_best_match(black_box(rules), &tenant_id, black_box(&query)))
        });
    }
    group.finish();
}

fn bench_suggested_charge(c: &mut Criterion) {
    let tenant_id = TenantId::new("bench-tenant").expect("tenant");
    let rules = rule_table(&tenant_id, 1, 1);
    let rule = &rules[0];
    c.bench_function("suggested_charge_per_kg", |b| {
        b.iter(|| rule.suggested_charge(black_box(3), black_box(Decimal::new(1234, 2))))
    });
}

criterion_group!(benches, bench_find_best_match, bench_suggested_charge);
criterion_main!(benches);
