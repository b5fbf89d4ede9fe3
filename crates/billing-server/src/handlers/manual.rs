//! Manual Payment Handlers
//!
//! Bank-transfer/UPI submission, payer status polling, and the admin
//! verification queue.

use axum::Json;
use axum::extract::{Path, Query, State};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use billing_core::{
    BankDetails, Currency, ManualPaymentRecord, ManualPaymentRequest, ManualPaymentStatus,
    PaymentError, UpiDetails,
};

use super::{HandlerError, reject};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct BankDetailsResponse {
    pub bank_details: BankDetails,
    pub instructions: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct UpiDetailsResponse {
    pub upi_details: UpiDetails,
    pub instructions: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub order_id: String,
    pub message: &'static str,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ManualStatusResponse {
    pub order_id: String,
    pub status: ManualPaymentStatus,
    pub package_name: String,
    pub amount: Decimal,
    pub currency: Currency,
    pub submitted_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
    pub message: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct PendingParams {
    #[serde(default)]
    pub skip: u64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    50
}

#[derive(Debug, Serialize)]
pub struct PendingResponse {
    pub count: usize,
    pub payments: Vec<ManualPaymentRecord>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    #[serde(default)]
    pub verified_by: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RejectParams {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: &'static str,
}

// ============================================================================
// Handlers
// ============================================================================

/// Bank account details for manual transfer
pub async fn bank_details(
    State(state): State<AppState>,
) -> Result<Json<BankDetailsResponse>, HandlerError> {
    let bank = state
        .bank
        .as_ref()
        .ok_or_else(|| reject(PaymentError::Config("bank transfer details not configured".into())))?;

    Ok(Json(BankDetailsResponse {
        bank_details: bank.as_ref().clone(),
        instructions: vec![
            "Transfer the exact amount to the above bank account",
            "Use your Order ID as reference/remark",
            "Take a screenshot of the successful transaction",
            "Submit the payment details with the screenshot",
            "Your subscription will be activated within 2-24 hours after verification",
        ],
    }))
}

/// UPI details for manual payment
pub async fn upi_details(
    State(state): State<AppState>,
) -> Result<Json<UpiDetailsResponse>, HandlerError> {
    let upi = state
        .upi
        .as_ref()
        .ok_or_else(|| reject(PaymentError::Config("UPI details not configured".into())))?;

    Ok(Json(UpiDetailsResponse {
        upi_details: upi.as_ref().clone(),
        instructions: vec![
            "Open any UPI app (PhonePe, GPay, Paytm, etc.)",
            "Pay to the above UPI ID or scan QR code",
            "Enter the exact amount",
            "Use your Order ID in notes/remark",
            "Take a screenshot of the successful payment",
            "Submit the payment details with the screenshot",
            "Your subscription will be activated within 2-24 hours after verification",
        ],
    }))
}

/// Submit manual payment evidence for verification
pub async fn submit_manual_payment(
    State(state): State<AppState>,
    Json(request): Json<ManualPaymentRequest>,
) -> Result<Json<SubmitResponse>, HandlerError> {
    let record = state.manual.submit(request).await.map_err(reject)?;

    // TODO: notify the verification inbox once the email worker exists

    Ok(Json(SubmitResponse {
        success: true,
        order_id: record.order_id,
        message: "Payment details submitted successfully! We'll verify and activate your \
                  subscription within 2-24 hours.",
        status: "pending_verification",
    }))
}

/// Check manual payment verification status
pub async fn manual_payment_status(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<ManualStatusResponse>, HandlerError> {
    let record = state.manual.status(&order_id).await.map_err(reject)?;

    Ok(Json(ManualStatusResponse {
        order_id: record.order_id.clone(),
        status: record.status,
        package_name: record.package_name.clone(),
        amount: record.amount,
        currency: record.currency,
        submitted_at: record.created_at,
        verified_at: record.verified_at,
        message: record.status_message(),
    }))
}

/// All pending payments awaiting admin verification
pub async fn pending_manual_payments(
    State(state): State<AppState>,
    Query(params): Query<PendingParams>,
) -> Result<Json<PendingResponse>, HandlerError> {
    // TODO: require admin authentication once the operator console ships
    let payments = state.manual.pending(params.skip, params.limit).await.map_err(reject)?;
    Ok(Json(PendingResponse { count: payments.len(), payments }))
}

/// Admin endpoint to verify a payment
pub async fn verify_manual_payment(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    Query(params): Query<VerifyParams>,
) -> Result<Json<ActionResponse>, HandlerError> {
    // TODO: require admin authentication once the operator console ships
    let verified_by = params.verified_by.as_deref().unwrap_or("admin");
    state.manual.verify(&order_id, verified_by).await.map_err(reject)?;

    Ok(Json(ActionResponse { success: true, message: "Payment verified successfully" }))
}

/// Admin endpoint to reject a payment
pub async fn reject_manual_payment(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    Query(params): Query<RejectParams>,
) -> Result<Json<ActionResponse>, HandlerError> {
    // TODO: require admin authentication once the operator console ships
    state.manual.reject(&order_id, params.reason).await.map_err(reject)?;

    Ok(Json(ActionResponse { success: true, message: "Payment rejected" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testutil;
    use axum::http::StatusCode;
    use billing_core::PaymentMethod;
    use rust_decimal_macros::dec;

    fn submission(amount: Decimal) -> ManualPaymentRequest {
        ManualPaymentRequest {
            package_id: "starter".into(),
            amount,
            currency: Currency::Inr,
            payment_method: PaymentMethod::BankTransfer,
            transaction_reference: Some("NEFT123".into()),
            payment_screenshot_url: None,
            user_name: "Asha".into(),
            user_email: "asha@example.com".into(),
            user_phone: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_submit_then_verify_flow() {
        let state = testutil::state();

        let submitted =
            submit_manual_payment(State(state.clone()), Json(submission(dec!(2400.00))))
                .await
                .unwrap();
        assert!(submitted.0.success);
        let order_id = submitted.0.order_id.clone();

        let status =
            manual_payment_status(State(state.clone()), Path(order_id.clone())).await.unwrap();
        assert_eq!(status.0.status, ManualPaymentStatus::Pending);
        assert_eq!(status.0.amount, dec!(2400.00));

        let pending = pending_manual_payments(
            State(state.clone()),
            Query(PendingParams { skip: 0, limit: 50 }),
        )
        .await
        .unwrap();
        assert_eq!(pending.0.count, 1);

        verify_manual_payment(
            State(state.clone()),
            Path(order_id.clone()),
            Query(VerifyParams { verified_by: Some("ops@example.com".into()) }),
        )
        .await
        .unwrap();

        // Finalized records leave the queue and repeat actions conflict
        let pending =
            pending_manual_payments(State(state.clone()), Query(PendingParams { skip: 0, limit: 50 }))
                .await
                .unwrap();
        assert_eq!(pending.0.count, 0);

        let (status_code, response) = reject_manual_payment(
            State(state),
            Path(order_id),
            Query(RejectParams { reason: None }),
        )
        .await
        .unwrap_err();
        assert_eq!(status_code, StatusCode::NOT_FOUND);
        assert_eq!(response.0.code, "NOT_FOUND_OR_FINALIZED");
    }

    #[tokio::test]
    async fn test_submit_amount_mismatch_is_400() {
        let (status, response) =
            submit_manual_payment(State(testutil::state()), Json(submission(dec!(2402.00))))
                .await
                .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response.0.code, "AMOUNT_MISMATCH");
        assert!(response.0.error.contains("2400"));
    }

    #[tokio::test]
    async fn test_transfer_details_unconfigured_is_503() {
        let (status, _) = bank_details(State(testutil::state())).await.unwrap_err();
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let (status, _) = upi_details(State(testutil::state())).await.unwrap_err();
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
