//! Parcel items: weighing, pricing and removal.

use tracing::info;

use parcelhub_core::{DomainError, DomainResult, ParcelId, ParcelItemId, error::codes};
use parcelhub_events::{TrackingEvent, TrackingEventType};
use parcelhub_infra::RepositoryError;
use parcelhub_parcels::{NewParcelItem, ParcelItem, compute_weights};
use parcelhub_pricing::{PriceQuery, quote_item};

use crate::context::RequestContext;
use crate::services::ParcelService;

impl ParcelService {
    /// Add an item, computing its billable weight and price under tenant policy.
    pub fn add_item(
        &self,
        ctx: &RequestContext,
        parcel_id: ParcelId,
        input: NewParcelItem,
    ) -> DomainResult<ParcelItem> {
        input.validate()?;

        let parcel = self.load_parcel(ctx.tenant_id(), parcel_id)?;
        parcel.ensure_open_for_editing()?;

        let options = self.options_for(ctx.tenant_id());
        let weights = compute_weights(input.weight_kg, &input.dimensions, &options)?;
        let query = PriceQuery::new(
            parcel.shipment_type,
            parcel.origin_office_id.clone(),
            parcel.destination_office_id.clone(),
        );

        let quote = quote_item(
            &options,
            &query,
            input.quantity,
            weights.billable_weight,
            input.positive_manual_price(),
            |q: &PriceQuery| {
                self.deps
                    .rules
                    .find_best_match(ctx.tenant_id(), q)
                    .map_err(|err| match err {
                        RepositoryError::Unavailable(reason) => DomainError::conflict(
                            codes::PRICING_UNAVAILABLE,
                            format!("price table unavailable: {reason}"),
                        ),
                        other => other.into(),
                    })
            },
        )?;

        let item = self.deps.items.add(ParcelItem::new(
            ctx.tenant_id().clone(),
            parcel_id,
            input,
            weights,
            quote.unit_price,
            quote.source,
            self.now(),
        ))?;

        self.audit(
            TrackingEvent::new(
                ctx.tenant_id().clone(),
                parcel_id,
                TrackingEventType::ParcelItemAdded,
                item.created_at,
                ctx.user_id().clone(),
                ctx.user_name().map(str::to_string),
            )
            .with("item_id", item.id.to_string())
            .with("quantity", item.quantity)
            .with("weight_kg", item.weight_kg.to_string())
            .with("billable_weight", item.billable_weight.to_string())
            .with("unit_price", item.unit_price.to_string()),
        );

        info!(
            tenant_id = %ctx.tenant_id(),
            parcel_id = %parcel_id,
            item_id = %item.id,
            unit_price = %item.unit_price,
            "parcel item added"
        );
        Ok(item)
    }

    pub fn list_items(&self, ctx: &RequestContext, parcel_id: ParcelId) -> DomainResult<Vec<ParcelItem>> {
        self.load_parcel(ctx.tenant_id(), parcel_id)?;
        Ok(self.deps.items.list_by_parcel(ctx.tenant_id(), parcel_id)?)
    }

    pub fn delete_item(
        &self,
        ctx: &RequestContext,
        parcel_id: ParcelId,
        item_id: ParcelItemId,
    ) -> DomainResult<ParcelItem> {
        let parcel = self.load_parcel(ctx.tenant_id(), parcel_id)?;
        parcel.ensure_open_for_editing()?;

        let item = self
            .deps
            .items
            .delete(ctx.tenant_id(), parcel_id, item_id)?
            .ok_or_else(|| DomainError::not_found(format!("item {item_id}")))?;

        self.audit(
            TrackingEvent::new(
                ctx.tenant_id().clone(),
                parcel_id,
                TrackingEventType::ParcelItemRemoved,
                self.now(),
                ctx.user_id().clone(),
                ctx.user_name().map(str::to_string),
            )
            .with("item_id", item.id.to_string()),
        );

        info!(tenant_id = %ctx.tenant_id(), parcel_id = %parcel_id, item_id = %item_id, "parcel item removed");
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parcelhub_core::{Currency, OfficeId, PersonId, TenantId, UserId};
    use parcelhub_infra::clients::StaticOptionsProvider;
    use parcelhub_infra::config::CoreConfig;
    use parcelhub_parcels::{Dimensions, ParcelOptions, PriceSource, ShipmentType};
    use parcelhub_pricing::{NewPriceRule, PriceUnit};
    use rust_decimal::Decimal;

    use crate::lifecycle::CreateParcelRequest;
    use crate::services::Dependencies;

    fn ctx() -> RequestContext {
        RequestContext::new(TenantId::new("T1").unwrap(), UserId::new("clerk-1").unwrap())
    }

    fn service_with(options: ParcelOptions) -> ParcelService {
        ParcelService::new(Dependencies::in_memory_with_options(
            CoreConfig::default(),
            StaticOptionsProvider::new(options),
        ))
    }

    fn create(service: &ParcelService) -> ParcelId {
        service
            .create_parcel(
                &ctx(),
                CreateParcelRequest {
                    shipment_type: ShipmentType::Bus,
                    origin_office_id: OfficeId::new("O1").unwrap(),
                    destination_office_id: OfficeId::new("D9").unwrap(),
                    sender_person_id: PersonId::new("p-1").unwrap(),
                    recipient_person_id: PersonId::new("p-2").unwrap(),
                    notes: None,
                    package_key: "1234".to_string(),
                    package_key_confirm: "1234".to_string(),
                },
            )
            .unwrap()
            .id
    }

    fn box_item(manual_price: Option<Decimal>) -> NewParcelItem {
        NewParcelItem {
            description: "Box".to_string(),
            quantity: 1,
            weight_kg: Decimal::from(2),
            dimensions: Dimensions::new(Decimal::from(50), Decimal::from(40), Decimal::from(30)),
            manual_price,
            content_type: None,
            notes: None,
        }
    }

    #[test]
    fn volumetric_weight_drives_price_table_charge() {
        let service = service_with(ParcelOptions {
            use_volumetric_weight: true,
            ..ParcelOptions::default()
        });
        let rule = service
            .create_price_rule(
                &ctx(),
                NewPriceRule {
                    shipment_type: ShipmentType::Bus,
                    origin: "O1".parse().unwrap(),
                    destination: "*".parse().unwrap(),
                    unit: PriceUnit::PerKg,
                    price: Decimal::from(3),
                    currency: Currency::Pen,
                    active: true,
                    priority: 0,
                },
            )
            .unwrap();
        let parcel_id = create(&service);

        let item = service.add_item(&ctx(), parcel_id, box_item(None)).unwrap();
        assert_eq!(item.volumetric_weight, Some(Decimal::new(10, 0)));
        assert_eq!(item.billable_weight, Decimal::from(10));
        assert_eq!(item.unit_price, Decimal::from(30));
        assert_eq!(
            item.price_source,
            PriceSource::PriceTable {
                rule_id: rule.id,
                currency: Currency::Pen
            }
        );
    }

    #[test]
    fn missing_rule_is_conflict() {
        let service = service_with(ParcelOptions::default());
        let parcel_id = create(&service);

        let err = service.add_item(&ctx(), parcel_id, box_item(None)).unwrap_err();
        assert_eq!(err.as_conflict().unwrap().code, codes::NO_MATCHING_PRICE_RULE);
        assert!(service.list_items(&ctx(), parcel_id).unwrap().is_empty());
    }

    #[test]
    fn oversized_dimensions_fail_validation_without_storing() {
        let service = service_with(ParcelOptions {
            use_volumetric_weight: true,
            use_price_table: false,
            allow_manual_price: true,
            ..ParcelOptions::default()
        });
        let parcel_id = create(&service);
        let huge = Decimal::from(10_000_000_000i64);
        let input = NewParcelItem {
            dimensions: Dimensions::new(huge, huge, huge),
            ..box_item(Some(Decimal::from(15)))
        };

        let err = service.add_item(&ctx(), parcel_id, input).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert!(service.list_items(&ctx(), parcel_id).unwrap().is_empty());
    }

    #[test]
    fn delete_requires_item_on_that_parcel() {
        let service = service_with(ParcelOptions {
            use_price_table: false,
            allow_manual_price: true,
            ..ParcelOptions::default()
        });
        let first = create(&service);
        let second = create(&service);
        let item = service
            .add_item(&ctx(), first, box_item(Some(Decimal::from(15))))
            .unwrap();
        assert_eq!(item.price_source, PriceSource::Manual);

        let err = service.delete_item(&ctx(), second, item.id).unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));

        let removed = service.delete_item(&ctx(), first, item.id).unwrap();
        assert_eq!(removed.id, item.id);
        assert!(service.list_items(&ctx(), first).unwrap().is_empty());
    }
}
