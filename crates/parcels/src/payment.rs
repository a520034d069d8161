//! Payment intent attached to a parcel.
//!
//! Bookkeeping only: nothing here moves money.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use parcelhub_core::{
    Currency, DomainError, DomainResult, OfficeId, ParcelId, PaymentId, TenantId, UserId,
    error::codes,
};

use crate::options::ParcelOptions;
use crate::parcel::ParcelStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentType {
    Cash,
    /// Freight on board: paid by the recipient at destination.
    Fob,
    Card,
    Transfer,
    Ewallet,
    Free,
    CollectOnDelivery,
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::Cash => "CASH",
            PaymentType::Fob => "FOB",
            PaymentType::Card => "CARD",
            PaymentType::Transfer => "TRANSFER",
            PaymentType::Ewallet => "EWALLET",
            PaymentType::Free => "FREE",
            PaymentType::CollectOnDelivery => "COLLECT_ON_DELIVERY",
        }
    }

    /// Settled at the destination office rather than at origin.
    pub fn is_paid_at_destination(&self) -> bool {
        matches!(self, PaymentType::Fob | PaymentType::CollectOnDelivery)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentChannel {
    #[default]
    Counter,
    Web,
}

/// Upsert request for a parcel's payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInput {
    pub payment_type: PaymentType,
    pub amount: Decimal,
    pub currency: Currency,
    #[serde(default)]
    pub channel: Option<PaymentChannel>,
    #[serde(default)]
    pub office_id: Option<OfficeId>,
    #[serde(default)]
    pub cashbox_id: Option<String>,
    #[serde(default)]
    pub seller_user_id: Option<UserId>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl PaymentInput {
    /// Shape checks that need no stored state.
    pub fn validate(&self) -> DomainResult<()> {
        if self.amount < Decimal::ZERO {
            return Err(DomainError::validation("amount must not be negative"));
        }
        if self.payment_type != PaymentType::Free && self.amount <= Decimal::ZERO {
            return Err(DomainError::validation("amount must be positive"));
        }
        if self.effective_channel() == PaymentChannel::Counter && self.office_id.is_none() {
            return Err(DomainError::validation(
                "office_id is required for counter payments",
            ));
        }
        Ok(())
    }

    pub fn effective_channel(&self) -> PaymentChannel {
        self.channel.unwrap_or_default()
    }

    /// Cashbox to check, if one was named.
    pub fn cashbox(&self) -> Option<&str> {
        self.cashbox_id
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    /// Destination payment types need the tenant switch.
    pub fn ensure_allowed_by(&self, options: &ParcelOptions) -> DomainResult<()> {
        ensure_destination_payment_allowed(self.payment_type, options)
    }
}

fn ensure_destination_payment_allowed(
    payment_type: PaymentType,
    options: &ParcelOptions,
) -> DomainResult<()> {
    if payment_type.is_paid_at_destination() && !options.allow_pay_in_destination {
        return Err(DomainError::conflict(
            codes::PAY_IN_DESTINATION_DISABLED,
            format!("{} payments are disabled for this tenant", payment_type.as_str()),
        ));
    }
    Ok(())
}

/// The single payment record of a parcel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParcelPayment {
    pub id: PaymentId,
    pub tenant_id: TenantId,
    pub parcel_id: ParcelId,
    pub payment_type: PaymentType,
    pub currency: Currency,
    pub amount: Decimal,
    pub notes: Option<String>,
    pub status: PaymentStatus,
    pub channel: PaymentChannel,
    pub office_id: Option<OfficeId>,
    pub cashbox_id: Option<String>,
    pub seller_user_id: Option<UserId>,
    pub paid_at: Option<DateTime<Utc>>,
    pub paid_by_user_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ParcelPayment {
    /// Build the record to store for an upsert.
    ///
    /// An existing payment keeps its identity, creation time and paid
    /// details; optional fields the caller left out are carried over. The
    /// status always goes back to `PENDING`.
    pub fn upsert(
        existing: Option<&ParcelPayment>,
        tenant_id: TenantId,
        parcel_id: ParcelId,
        input: PaymentInput,
        now: DateTime<Utc>,
    ) -> Self {
        let channel = input.effective_channel();
        let cashbox_id = input.cashbox().map(str::to_string);
        let mut payment = Self {
            id: PaymentId::new(),
            tenant_id,
            parcel_id,
            payment_type: input.payment_type,
            currency: input.currency,
            amount: input.amount,
            notes: input.notes,
            status: PaymentStatus::Pending,
            channel,
            office_id: input.office_id,
            cashbox_id,
            seller_user_id: input.seller_user_id,
            paid_at: None,
            paid_by_user_id: None,
            created_at: now,
            updated_at: now,
        };

        if let Some(prev) = existing {
            payment.id = prev.id;
            payment.created_at = prev.created_at;
            payment.paid_at = prev.paid_at;
            payment.paid_by_user_id = prev.paid_by_user_id.clone();
            if input.channel.is_none() {
                payment.channel = prev.channel;
            }
            if payment.office_id.is_none() {
                payment.office_id = prev.office_id.clone();
            }
            if payment.cashbox_id.is_none() {
                payment.cashbox_id = prev.cashbox_id.clone();
            }
            if payment.seller_user_id.is_none() {
                payment.seller_user_id = prev.seller_user_id.clone();
            }
        }

        payment
    }

    /// Whether the payment may be settled given the parcel's status.
    ///
    /// Destination payments settle once the parcel reached its destination;
    /// everything else settles while the parcel is still at the counter.
    pub fn ensure_can_be_paid(
        &self,
        parcel_status: ParcelStatus,
        options: &ParcelOptions,
    ) -> DomainResult<()> {
        if self.payment_type.is_paid_at_destination() {
            ensure_destination_payment_allowed(self.payment_type, options)?;
            if !matches!(
                parcel_status,
                ParcelStatus::ArrivedAtDestination | ParcelStatus::Delivered
            ) {
                return Err(DomainError::invalid_state(
                    format!(
                        "{} or {}",
                        ParcelStatus::ArrivedAtDestination,
                        ParcelStatus::Delivered
                    ),
                    parcel_status.as_str(),
                ));
            }
        } else if !parcel_status.is_open_for_editing() {
            return Err(DomainError::invalid_state(
                format!("{} or {}", ParcelStatus::Created, ParcelStatus::Registered),
                parcel_status.as_str(),
            ));
        }
        Ok(())
    }

    pub fn mark_paid(&mut self, paid_by: Option<UserId>, at: DateTime<Utc>) {
        self.status = PaymentStatus::Paid;
        self.paid_at = Some(at);
        self.paid_by_user_id = paid_by;
        self.updated_at = at;
    }
}
