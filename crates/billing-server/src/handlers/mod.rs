//! HTTP Handlers

pub mod manual;
pub mod payments;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;

use billing_core::PaymentError;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

pub type HandlerError = (StatusCode, Json<ErrorResponse>);

/// Map a billing error onto an HTTP rejection.
///
/// Validation failures carry their message; upstream gateway and storage
/// failures are logged here and surfaced generically.
pub fn reject(err: PaymentError) -> HandlerError {
    let (status, code) = match &err {
        PaymentError::InvalidPackage(_) => (StatusCode::BAD_REQUEST, "INVALID_PACKAGE"),
        PaymentError::UnsupportedTier(_) => (StatusCode::BAD_REQUEST, "CONTACT_SALES"),
        PaymentError::UnsupportedCurrency { .. } => {
            (StatusCode::BAD_REQUEST, "UNSUPPORTED_CURRENCY")
        }
        PaymentError::AmountMismatch { .. } => (StatusCode::BAD_REQUEST, "AMOUNT_MISMATCH"),
        PaymentError::InvalidSignature => (StatusCode::BAD_REQUEST, "INVALID_SIGNATURE"),
        PaymentError::TransactionNotFound(_) => (StatusCode::NOT_FOUND, "TRANSACTION_NOT_FOUND"),
        PaymentError::NotFoundOrAlreadyFinalized(_) => {
            (StatusCode::NOT_FOUND, "NOT_FOUND_OR_FINALIZED")
        }
        PaymentError::GatewayNotConfigured(_) => {
            (StatusCode::SERVICE_UNAVAILABLE, "GATEWAY_NOT_CONFIGURED")
        }
        PaymentError::Config(_) => (StatusCode::SERVICE_UNAVAILABLE, "NOT_CONFIGURED"),
        PaymentError::Gateway(_) => (StatusCode::BAD_GATEWAY, "GATEWAY_ERROR"),
        PaymentError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
    };

    if status.is_server_error() {
        tracing::error!(error = %err, code = code, "Request failed");
    } else {
        tracing::debug!(error = %err, code = code, "Request rejected");
    }

    (status, Json(ErrorResponse { error: err.user_message(), code: code.into() }))
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub stripe_configured: bool,
    pub razorpay_configured: bool,
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        stripe_configured: state.stripe.is_some(),
        razorpay_configured: state.razorpay.is_some(),
    })
}


#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_health_reports_gateway_config() {
        let response = health_check(State(testutil::state())).await;
        assert_eq!(response.0.status, "healthy");
        assert!(!response.0.stripe_configured);
        assert!(!response.0.razorpay_configured);
    }

    #[test]
    fn test_reject_mapping() {
        let (status, body) = reject(PaymentError::AmountMismatch {
            expected: dec!(2400.00),
            received: dec!(2500.00),
        });
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.0.code, "AMOUNT_MISMATCH");

        let (status, body) = reject(PaymentError::Storage("boom".into()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        // Internal detail must not leak
        assert!(!body.0.error.contains("boom"));
    }
}
