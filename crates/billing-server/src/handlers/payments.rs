//! Gateway Payment Handlers
//!
//! Checkout creation, status polling, webhook ingestion, and explicit
//! payment verification. All status writes go through the reconciler.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};

use billing_core::{
    CheckoutRequest, Currency, Gateway, GatewayAdapter, Intent, Package, PaymentError, StatusView,
    Transaction, WebhookSignal,
};

use super::{ErrorResponse, HandlerError, reject};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct AvailableGateways {
    pub stripe: bool,
    pub razorpay: bool,
}

#[derive(Debug, Serialize)]
pub struct PackagesResponse {
    pub packages: Vec<Package>,
    pub available_gateways: AvailableGateways,
}

#[derive(Debug, Deserialize)]
pub struct CreateCheckoutBody {
    pub package_id: String,
    #[serde(default = "default_currency")]
    pub currency: Currency,
    pub origin_url: String,
    #[serde(default)]
    pub user_email: Option<String>,
}

fn default_currency() -> Currency {
    Currency::Usd
}

#[derive(Debug, Serialize)]
pub struct CreateCheckoutResponse {
    /// Hosted checkout page to redirect the buyer to
    pub url: String,
    pub session_id: String,
    pub payment_gateway: Gateway,
}

#[derive(Debug, Deserialize)]
pub struct RazorpayOrderBody {
    pub package_id: String,
    #[serde(default)]
    pub user_email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RazorpayOrderResponse {
    pub order_id: String,
    /// Amount in paise, as the checkout widget expects
    pub amount: i64,
    pub currency: Currency,
    pub key_id: String,
    pub package_name: String,
    pub payment_gateway: Gateway,
}

#[derive(Debug, Deserialize)]
pub struct RazorpayVerifyBody {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub status: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub status: &'static str,
}

// ============================================================================
// Handlers
// ============================================================================

/// All packages plus which gateways are currently configured
pub async fn get_packages(State(state): State<AppState>) -> Json<PackagesResponse> {
    Json(PackagesResponse {
        packages: state.catalog.packages().to_vec(),
        available_gateways: AvailableGateways {
            stripe: state.stripe.is_some(),
            razorpay: state.razorpay.is_some(),
        },
    })
}

/// Create a Stripe checkout session
pub async fn create_stripe_checkout(
    State(state): State<AppState>,
    Json(body): Json<CreateCheckoutBody>,
) -> Result<Json<CreateCheckoutResponse>, HandlerError> {
    let stripe = state
        .stripe
        .as_ref()
        .ok_or_else(|| reject(PaymentError::GatewayNotConfigured(Gateway::Stripe)))?;

    let (tx, intent) = state
        .checkout
        .create(
            stripe.as_ref(),
            CheckoutRequest {
                package_id: body.package_id,
                currency: body.currency,
                origin_url: Some(body.origin_url),
                user_email: body.user_email,
            },
        )
        .await
        .map_err(reject)?;

    match intent {
        Intent::Redirect { session_id, url } => Ok(Json(CreateCheckoutResponse {
            url,
            session_id,
            payment_gateway: tx.gateway,
        })),
        Intent::Order { .. } => Err(reject(PaymentError::Gateway("unexpected intent kind".into()))),
    }
}

/// Poll Stripe payment status by session id
pub async fn stripe_status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<StatusView>, HandlerError> {
    let stripe = state
        .stripe
        .as_ref()
        .ok_or_else(|| reject(PaymentError::GatewayNotConfigured(Gateway::Stripe)))?;

    let view = state.reconciler.poll(stripe.as_ref(), &session_id).await.map_err(reject)?;
    Ok(Json(view))
}

/// Stripe webhook endpoint
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<WebhookAck>, HandlerError> {
    let stripe = state
        .stripe
        .as_ref()
        .ok_or_else(|| reject(PaymentError::GatewayNotConfigured(Gateway::Stripe)))?;

    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    process_webhook(&state, stripe.as_ref(), &body, signature).await
}

/// Create a Razorpay order
pub async fn create_razorpay_order(
    State(state): State<AppState>,
    Json(body): Json<RazorpayOrderBody>,
) -> Result<Json<RazorpayOrderResponse>, HandlerError> {
    let razorpay = state
        .razorpay
        .as_ref()
        .ok_or_else(|| reject(PaymentError::GatewayNotConfigured(Gateway::Razorpay)))?;

    // Razorpay settles in INR only
    let (tx, intent) = state
        .checkout
        .create(
            razorpay.as_ref(),
            CheckoutRequest {
                package_id: body.package_id,
                currency: Currency::Inr,
                origin_url: None,
                user_email: body.user_email,
            },
        )
        .await
        .map_err(reject)?;

    match intent {
        Intent::Order { order_id, amount_minor, currency, key_id } => {
            Ok(Json(RazorpayOrderResponse {
                order_id,
                amount: amount_minor,
                currency,
                key_id,
                package_name: tx.package_name,
                payment_gateway: tx.gateway,
            }))
        }
        Intent::Redirect { .. } => {
            Err(reject(PaymentError::Gateway("unexpected intent kind".into())))
        }
    }
}

/// Poll Razorpay order status
pub async fn razorpay_status(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<StatusView>, HandlerError> {
    let razorpay = state
        .razorpay
        .as_ref()
        .ok_or_else(|| reject(PaymentError::GatewayNotConfigured(Gateway::Razorpay)))?;

    let view = state.reconciler.poll(razorpay.as_ref(), &order_id).await.map_err(reject)?;
    Ok(Json(view))
}

/// Verify the signature triple the Razorpay widget reported to the client
pub async fn verify_razorpay_payment(
    State(state): State<AppState>,
    Json(body): Json<RazorpayVerifyBody>,
) -> Result<Json<VerifyResponse>, HandlerError> {
    let razorpay = state
        .razorpay
        .as_ref()
        .ok_or_else(|| reject(PaymentError::GatewayNotConfigured(Gateway::Razorpay)))?;

    razorpay
        .verify_payment_signature(
            &body.razorpay_order_id,
            &body.razorpay_payment_id,
            &body.razorpay_signature,
        )
        .map_err(reject)?;

    let confirmation = state
        .reconciler
        .confirm_captured(&body.razorpay_order_id, &body.razorpay_payment_id)
        .await
        .map_err(reject)?;

    let message = match confirmation {
        billing_core::Confirmation::Confirmed => "Payment verified successfully",
        billing_core::Confirmation::AlreadyProcessed => "Payment already processed",
    };
    Ok(Json(VerifyResponse { status: "success", message }))
}

/// Razorpay webhook endpoint
pub async fn razorpay_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<WebhookAck>, HandlerError> {
    let razorpay = state
        .razorpay
        .as_ref()
        .ok_or_else(|| reject(PaymentError::GatewayNotConfigured(Gateway::Razorpay)))?;

    let signature = headers
        .get("X-Razorpay-Signature")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    process_webhook(&state, razorpay.as_ref(), &body, signature).await
}

/// Transaction lookup by internal id
pub async fn get_transaction(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
) -> Result<Json<Transaction>, HandlerError> {
    let tx = state
        .transactions
        .find_by_id(&transaction_id)
        .await
        .map_err(reject)?
        .ok_or_else(|| reject(PaymentError::TransactionNotFound(transaction_id.clone())))?;
    Ok(Json(tx))
}

/// Shared webhook path: authenticate, apply a capture, acknowledge.
///
/// Only a failed signature or a payload we cannot decode is the sender's
/// problem (4xx). Authentic events we do not act on are acknowledged, so
/// the gateway does not treat us as a failing endpoint and retry forever.
async fn process_webhook(
    state: &AppState,
    adapter: &dyn GatewayAdapter,
    payload: &str,
    signature: &str,
) -> Result<Json<WebhookAck>, HandlerError> {
    let signal = match adapter.verify_webhook(payload, signature) {
        Ok(signal) => signal,
        Err(err @ PaymentError::InvalidSignature) => return Err(reject(err)),
        Err(err) => {
            tracing::warn!(gateway = %adapter.tag(), error = %err, "Malformed webhook payload");
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "malformed webhook payload".into(),
                    code: "MALFORMED_PAYLOAD".into(),
                }),
            ));
        }
    };

    match signal {
        WebhookSignal::Captured { reference, payment_id } => {
            state
                .reconciler
                .apply_captured(adapter.tag().key(&reference), &payment_id)
                .await
                .map_err(reject)?;
        }
        WebhookSignal::Ignored { event } => {
            tracing::debug!(gateway = %adapter.tag(), event = %event, "Ignoring webhook event");
        }
    }

    Ok(Json(WebhookAck { status: "success" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testutil;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_packages_lists_catalog() {
        let response = get_packages(State(testutil::state())).await;
        assert_eq!(response.0.packages.len(), 3);
        assert!(!response.0.available_gateways.stripe);
        assert!(!response.0.available_gateways.razorpay);

        let starter = &response.0.packages[0];
        assert_eq!(starter.id, "starter");
        assert_eq!(starter.amount_inr, Some(dec!(2400.00)));
    }

    #[tokio::test]
    async fn test_checkout_without_gateway_is_503() {
        let body = CreateCheckoutBody {
            package_id: "starter".into(),
            currency: Currency::Usd,
            origin_url: "https://app.example.com".into(),
            user_email: None,
        };
        let (status, response) = create_stripe_checkout(State(testutil::state()), Json(body))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.0.code, "GATEWAY_NOT_CONFIGURED");
    }

    #[tokio::test]
    async fn test_razorpay_order_without_gateway_is_503() {
        let body = RazorpayOrderBody { package_id: "starter".into(), user_email: None };
        let (status, _) = create_razorpay_order(State(testutil::state()), Json(body))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_unknown_transaction_is_404() {
        let (status, response) =
            get_transaction(State(testutil::state()), Path("no-such-id".into()))
                .await
                .unwrap_err();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(response.0.code, "TRANSACTION_NOT_FOUND");
    }
}
