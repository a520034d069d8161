use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use parcelhub_core::{DomainResult, ParcelId};
use parcelhub_parcels::{DocumentType, PrintDecision, PrintRecord, decide_print};

use crate::context::RequestContext;
use crate::services::ParcelService;

/// A registered print and the policy outcome that allowed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintResult {
    pub record: PrintRecord,
    pub decision: PrintDecision,
    /// QR reference, for labels when the generator answered.
    pub qr: Option<String>,
}

impl ParcelService {
    /// Register one print of a document, enforcing the reprint limit.
    pub fn register_print(
        &self,
        ctx: &RequestContext,
        parcel_id: ParcelId,
        document_type: DocumentType,
    ) -> DomainResult<PrintResult> {
        let parcel = self.load_parcel(ctx.tenant_id(), parcel_id)?;
        let options = self.options_for(ctx.tenant_id());

        let current = self
            .deps
            .prints
            .count_by_parcel_and_type(ctx.tenant_id(), parcel_id, document_type)?;
        let decision = decide_print(current, &options)?;

        let qr = match document_type {
            DocumentType::Label => match self.deps.qr.generate(ctx.tenant_id(), parcel_id, &parcel.tracking_code) {
                Ok(reference) => Some(reference),
                Err(err) => {
                    warn!(tenant_id = %ctx.tenant_id(), parcel_id = %parcel_id, error = %err, "label qr not generated");
                    None
                }
            },
            _ => None,
        };

        let record = self.deps.prints.add(PrintRecord::new(
            ctx.tenant_id().clone(),
            parcel_id,
            document_type,
            Some(ctx.user_id().clone()),
            self.now(),
        ))?;

        info!(
            tenant_id = %ctx.tenant_id(),
            parcel_id = %parcel_id,
            document_type = document_type.as_str(),
            count = decision.count_after,
            reprint = decision.is_reprint,
            "document print registered"
        );
        Ok(PrintResult { record, decision, qr })
    }
}
