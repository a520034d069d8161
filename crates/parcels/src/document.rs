//! Printed documents and the reprint policy.

use chrono::{DateTime, Utc};
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use parcelhub_core::{
    DomainError, DomainResult, ParcelId, PrintRecordId, TenantId, UserId,
    error::{codes, Conflict},
};

use crate::options::ParcelOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    Label,
    Receipt,
    Manifest,
    Guide,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Label => "LABEL",
            DocumentType::Receipt => "RECEIPT",
            DocumentType::Manifest => "MANIFEST",
            DocumentType::Guide => "GUIDE",
        }
    }
}

impl FromStr for DocumentType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LABEL" => Ok(DocumentType::Label),
            "RECEIPT" => Ok(DocumentType::Receipt),
            "MANIFEST" => Ok(DocumentType::Manifest),
            "GUIDE" => Ok(DocumentType::Guide),
            other => Err(DomainError::validation(format!(
                "document_type must be one of: LABEL, RECEIPT, MANIFEST, GUIDE (got '{other}')"
            ))),
        }
    }
}

/// One print of one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintRecord {
    pub id: PrintRecordId,
    pub tenant_id: TenantId,
    pub parcel_id: ParcelId,
    pub document_type: DocumentType,
    pub printed_at: DateTime<Utc>,
    pub printed_by_user_id: Option<UserId>,
}

impl PrintRecord {
    pub fn new(
        tenant_id: TenantId,
        parcel_id: ParcelId,
        document_type: DocumentType,
        printed_by_user_id: Option<UserId>,
        printed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PrintRecordId::new(),
            tenant_id,
            parcel_id,
            document_type,
            printed_at,
            printed_by_user_id,
        }
    }
}

/// Outcome of the reprint policy for the next print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintDecision {
    pub count_after: u32,
    pub max_prints: u32,
    pub is_reprint: bool,
    pub reprint_fee_enabled: bool,
}

/// Decide whether one more print is allowed given prints already made.
pub fn decide_print(current: u32, options: &ParcelOptions) -> DomainResult<PrintDecision> {
    let max_prints = options.effective_max_prints();
    if current >= max_prints && !options.allow_reprint {
        return Err(DomainError::Conflict(
            Conflict::new(codes::REPRINT_NOT_ALLOWED, "print limit reached")
                .expected(max_prints.to_string())
                .actual(current.to_string()),
        ));
    }
    Ok(PrintDecision {
        count_after: current + 1,
        max_prints,
        is_reprint: current > 0,
        reprint_fee_enabled: options.reprint_fee_enabled,
    })
}
