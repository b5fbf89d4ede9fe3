//! Manual Payments
//!
//! Self-reported bank-transfer/UPI payments awaiting human verification.
//! Records are created pending and finalized exactly once by an admin
//! verify or reject action.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::{Package, PackageCatalog};
use crate::error::{PaymentError, Result};
use crate::ledger::{ManualLedger, Verdict};
use crate::model::Currency;

/// How the payer says they transferred the money
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    BankTransfer,
    Upi,
}

/// Manual payment lifecycle status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManualPaymentStatus {
    Pending,
    Verified,
    Rejected,
}

impl ManualPaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ManualPaymentStatus::Pending => "pending",
            ManualPaymentStatus::Verified => "verified",
            ManualPaymentStatus::Rejected => "rejected",
        }
    }
}

/// Payer-submitted payment evidence
#[derive(Clone, Debug, Deserialize)]
pub struct ManualPaymentRequest {
    pub package_id: String,
    pub amount: Decimal,
    #[serde(default = "default_currency")]
    pub currency: Currency,
    pub payment_method: PaymentMethod,
    /// Bank/UPI reference number, if the payer has one
    #[serde(default)]
    pub transaction_reference: Option<String>,
    #[serde(default)]
    pub payment_screenshot_url: Option<String>,
    pub user_name: String,
    pub user_email: String,
    #[serde(default)]
    pub user_phone: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_currency() -> Currency {
    Currency::Inr
}

/// A manual payment awaiting (or past) verification
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ManualPaymentRecord {
    /// Internal id
    pub id: String,

    /// Human-shareable order id the payer quotes in transfer remarks
    pub order_id: String,

    pub package_id: String,
    pub package_name: String,
    pub amount: Decimal,
    pub currency: Currency,
    pub payment_method: PaymentMethod,
    pub transaction_reference: Option<String>,
    pub payment_screenshot_url: Option<String>,
    pub user_name: String,
    pub user_email: String,
    pub user_phone: Option<String>,
    pub notes: Option<String>,

    pub status: ManualPaymentStatus,
    pub created_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
    pub verified_by: Option<String>,
    pub rejection_reason: Option<String>,
}

impl ManualPaymentRecord {
    pub fn new(package: &Package, request: ManualPaymentRequest) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            order_id: generate_order_id(),
            package_id: package.id.clone(),
            package_name: package.name.clone(),
            amount: request.amount,
            currency: request.currency,
            payment_method: request.payment_method,
            transaction_reference: request.transaction_reference,
            payment_screenshot_url: request.payment_screenshot_url,
            user_name: request.user_name,
            user_email: request.user_email,
            user_phone: request.user_phone,
            notes: request.notes,
            status: ManualPaymentStatus::Pending,
            created_at: Utc::now(),
            verified_at: None,
            verified_by: None,
            rejection_reason: None,
        }
    }

    /// Payer-facing explanation of the current status
    pub fn status_message(&self) -> &'static str {
        match self.status {
            ManualPaymentStatus::Pending => {
                "Your payment is under verification. You'll receive an email once verified."
            }
            ManualPaymentStatus::Verified => "Payment verified! Your subscription is now active.",
            ManualPaymentStatus::Rejected => {
                "Payment verification failed. Please contact support."
            }
        }
    }
}

/// Order id format: ORD + 8 uppercase hex chars
fn generate_order_id() -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string().to_uppercase();
    format!("ORD{}", &hex[..8])
}

/// Bank account the payer transfers to
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BankDetails {
    pub account_name: String,
    pub account_number: String,
    pub ifsc_code: String,
    pub bank_name: String,
    pub branch: String,
    pub account_type: String,
}

/// UPI destination the payer pays to
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpiDetails {
    pub upi_id: String,
    pub upi_name: String,
    pub qr_code_url: Option<String>,
}

/// Manual payment submission and admin verification flows
pub struct ManualPayments {
    catalog: Arc<PackageCatalog>,
    ledger: Arc<dyn ManualLedger>,
}

impl ManualPayments {
    pub fn new(catalog: Arc<PackageCatalog>, ledger: Arc<dyn ManualLedger>) -> Self {
        Self { catalog, ledger }
    }

    /// Record payment evidence for later verification.
    ///
    /// The package must exist and the reported amount must match the
    /// catalog INR price within one rupee either way (payers round).
    pub async fn submit(&self, request: ManualPaymentRequest) -> Result<ManualPaymentRecord> {
        let package = self
            .catalog
            .lookup(&request.package_id)
            .ok_or_else(|| PaymentError::InvalidPackage(request.package_id.clone()))?;

        if let Some(expected) = package.price(Currency::Inr) {
            if (request.amount - expected).abs() > Decimal::ONE {
                return Err(PaymentError::AmountMismatch {
                    expected,
                    received: request.amount,
                });
            }
        }

        let record = ManualPaymentRecord::new(package, request);
        self.ledger.insert(&record).await?;

        tracing::info!(
            order_id = %record.order_id,
            email = %record.user_email,
            "Manual payment submitted"
        );

        Ok(record)
    }

    pub async fn status(&self, order_id: &str) -> Result<ManualPaymentRecord> {
        self.ledger
            .find_by_order(order_id)
            .await?
            .ok_or_else(|| PaymentError::TransactionNotFound(order_id.to_string()))
    }

    pub async fn pending(&self, skip: u64, limit: i64) -> Result<Vec<ManualPaymentRecord>> {
        self.ledger.list_pending(skip, limit).await
    }

    /// Admin accepts the payment evidence.
    ///
    /// Unlike the gateway paths, a zero-row conditional update here is an
    /// error: the operator acted on a record that is gone or already
    /// finalized, and must be told.
    pub async fn verify(&self, order_id: &str, verified_by: &str) -> Result<()> {
        let verdict = Verdict::Verified { by: verified_by.to_string() };
        if !self.ledger.finalize_if_pending(order_id, &verdict).await? {
            return Err(PaymentError::NotFoundOrAlreadyFinalized(order_id.to_string()));
        }

        tracing::info!(order_id = %order_id, verified_by = %verified_by, "Manual payment verified");
        Ok(())
    }

    /// Admin rejects the payment evidence
    pub async fn reject(&self, order_id: &str, reason: Option<String>) -> Result<()> {
        let verdict = Verdict::Rejected { reason };
        if !self.ledger.finalize_if_pending(order_id, &verdict).await? {
            return Err(PaymentError::NotFoundOrAlreadyFinalized(order_id.to_string()));
        }

        tracing::info!(order_id = %order_id, "Manual payment rejected");
        Ok(())
    }
}
