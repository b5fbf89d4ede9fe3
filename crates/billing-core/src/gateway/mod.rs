//! Gateway Integration
//!
//! Abstraction over external payment gateways. Each gateway creates a
//! remote payment intent, reports checkout status, and authenticates
//! webhook payloads.

mod mock;

pub use mock::MockGateway;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::Result;
use crate::model::{Currency, Gateway, TransactionStatus};

/// Server-resolved parameters for creating a remote payment intent.
///
/// Carries only catalog-derived amounts; there is no field a client
/// amount could travel through.
#[derive(Clone, Debug)]
pub struct IntentRequest {
    pub package_id: String,
    pub package_name: String,
    pub amount: Decimal,
    pub currency: Currency,
    /// Origin for building success/cancel redirects (hosted checkout only)
    pub origin_url: Option<String>,
    pub user_email: Option<String>,
}

/// Result of creating a remote payment intent
#[derive(Clone, Debug)]
pub enum Intent {
    /// Hosted checkout: redirect the client to `url`
    Redirect { session_id: String, url: String },
    /// In-page order: the client opens the gateway widget with these params
    Order {
        order_id: String,
        amount_minor: i64,
        currency: Currency,
        key_id: String,
    },
}

impl Intent {
    /// The gateway-assigned reference the ledger is keyed by
    pub fn reference(&self) -> &str {
        match self {
            Intent::Redirect { session_id, .. } => session_id,
            Intent::Order { order_id, .. } => order_id,
        }
    }
}

/// Gateway-reported checkout status
#[derive(Clone, Debug)]
pub struct RemoteStatus {
    /// Raw checkout state as the gateway names it ("open", "complete", ...)
    pub session_state: String,
    /// Ledger status the state maps to
    pub status: TransactionStatus,
    /// Gateway payment id, when a payment exists
    pub payment_id: Option<String>,
}

/// Outcome of authenticating and decoding a webhook payload
#[derive(Clone, Debug)]
pub enum WebhookSignal {
    /// Payment captured: apply the paid transition for this reference
    Captured { reference: String, payment_id: String },
    /// Authentic but irrelevant event; acknowledge and ignore
    Ignored { event: String },
}

/// Payment gateway client trait (Strategy pattern)
///
/// Implement this for each gateway: Stripe, Razorpay, ...
#[async_trait]
pub trait GatewayAdapter: Send + Sync {
    /// Gateway tag recorded on transactions
    fn tag(&self) -> Gateway;

    /// Create a remote checkout session / order
    async fn create_intent(&self, request: &IntentRequest) -> Result<Intent>;

    /// Query current checkout status by gateway reference
    async fn get_status(&self, reference: &str) -> Result<RemoteStatus>;

    /// Verify payload authenticity and decode the event
    fn verify_webhook(&self, payload: &str, signature: &str) -> Result<WebhookSignal>;
}
