use tracing::info;

use parcelhub_core::{DomainError, DomainResult, OfficeId, PriceRuleId};
use parcelhub_parcels::ShipmentType;
use parcelhub_pricing::{NewPriceRule, PriceQuery, PriceRule};

use crate::context::RequestContext;
use crate::services::ParcelService;

impl ParcelService {
    pub fn create_price_rule(&self, ctx: &RequestContext, input: NewPriceRule) -> DomainResult<PriceRule> {
        let rule = PriceRule::create(ctx.tenant_id().clone(), input, self.now())?;
        let rule = self.deps.rules.create(rule)?;
        info!(
            tenant_id = %ctx.tenant_id(),
            rule_id = %rule.id,
            origin = %rule.origin,
            destination = %rule.destination,
            "price rule created"
        );
        Ok(rule)
    }

    /// Replace the editable fields of an existing rule.
    pub fn update_price_rule(
        &self,
        ctx: &RequestContext,
        rule_id: PriceRuleId,
        input: NewPriceRule,
    ) -> DomainResult<PriceRule> {
        let current = self
            .deps
            .rules
            .get(ctx.tenant_id(), rule_id)?
            .ok_or_else(|| DomainError::not_found(format!("price rule {rule_id}")))?;

        let next = current.updated(input, self.now())?;
        let rule = self
            .deps
            .rules
            .update(next)?
            .ok_or_else(|| DomainError::not_found(format!("price rule {rule_id}")))?;

        info!(tenant_id = %ctx.tenant_id(), rule_id = %rule.id, active = rule.active, "price rule updated");
        Ok(rule)
    }

    pub fn list_price_rules(&self, ctx: &RequestContext) -> DomainResult<Vec<PriceRule>> {
        Ok(self.deps.rules.list(ctx.tenant_id())?)
    }

    /// Rule that would price a parcel on this route, if any.
    pub fn find_price_match(
        &self,
        ctx: &RequestContext,
        shipment_type: ShipmentType,
        origin_office_id: OfficeId,
        destination_office_id: OfficeId,
    ) -> DomainResult<Option<PriceRule>> {
        let query = PriceQuery::new(shipment_type, origin_office_id, destination_office_id);
        Ok(self.deps.rules.find_best_match(ctx.tenant_id(), &query)?)
    }
}
