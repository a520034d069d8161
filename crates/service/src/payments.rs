//! Parcel payments: one record per parcel, upserted until paid.

use tracing::{info, warn};

use parcelhub_core::{DomainError, DomainResult, ParcelId, error::codes};
use parcelhub_parcels::{ParcelPayment, PaymentInput};

use crate::context::RequestContext;
use crate::services::ParcelService;

impl ParcelService {
    /// Create or replace the parcel's payment; it goes back to `PENDING`.
    pub fn upsert_payment(
        &self,
        ctx: &RequestContext,
        parcel_id: ParcelId,
        input: PaymentInput,
    ) -> DomainResult<ParcelPayment> {
        input.validate()?;

        if let Some(cashbox_id) = input.cashbox() {
            match self.deps.cashbox.is_open(ctx.tenant_id(), cashbox_id) {
                Ok(true) => {}
                Ok(false) => {
                    return Err(DomainError::conflict(
                        codes::CASHBOX_CLOSED,
                        format!("cashbox {cashbox_id} is not open"),
                    ));
                }
                Err(err) => {
                    warn!(tenant_id = %ctx.tenant_id(), cashbox_id, error = %err, "cashbox check skipped");
                }
            }
        }

        let parcel = self.load_parcel(ctx.tenant_id(), parcel_id)?;
        parcel.ensure_open_for_editing()?;

        let options = self.options_for(ctx.tenant_id());
        input.ensure_allowed_by(&options)?;

        let existing = self.deps.payments.get_by_parcel(ctx.tenant_id(), parcel_id)?;
        let payment = ParcelPayment::upsert(
            existing.as_ref(),
            ctx.tenant_id().clone(),
            parcel_id,
            input,
            self.now(),
        );
        let payment = self.deps.payments.upsert(payment)?;

        info!(
            tenant_id = %ctx.tenant_id(),
            parcel_id = %parcel_id,
            payment_type = payment.payment_type.as_str(),
            amount = %payment.amount,
            "parcel payment saved"
        );
        Ok(payment)
    }

    pub fn get_payment(&self, ctx: &RequestContext, parcel_id: ParcelId) -> DomainResult<Option<ParcelPayment>> {
        self.load_parcel(ctx.tenant_id(), parcel_id)?;
        Ok(self.deps.payments.get_by_parcel(ctx.tenant_id(), parcel_id)?)
    }

    /// Settle the parcel's payment.
    ///
    /// Destination payments settle once the parcel has arrived; the others
    /// only while it is still at the counter.
    pub fn mark_payment_paid(&self, ctx: &RequestContext, parcel_id: ParcelId) -> DomainResult<ParcelPayment> {
        let parcel = self.load_parcel(ctx.tenant_id(), parcel_id)?;
        let mut payment = self
            .deps
            .payments
            .get_by_parcel(ctx.tenant_id(), parcel_id)?
            .ok_or_else(|| DomainError::not_found(format!("payment for parcel {parcel_id}")))?;

        let options = self.options_for(ctx.tenant_id());
        payment.ensure_can_be_paid(parcel.status(), &options)?;
        payment.mark_paid(Some(ctx.user_id().clone()), self.now());
        let payment = self.deps.payments.upsert(payment)?;

        info!(tenant_id = %ctx.tenant_id(), parcel_id = %parcel_id, "parcel payment paid");
        Ok(payment)
    }
}
