//! Mock Gateway
//!
//! For testing and demo purposes. Issues deterministic references and
//! reports whatever status the test scripted.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde::Deserialize;

use super::{GatewayAdapter, Intent, IntentRequest, RemoteStatus, WebhookSignal};
use crate::error::{PaymentError, Result};
use crate::model::{Gateway, TransactionStatus, to_minor_units};

const MOCK_SIGNATURE: &str = "mock-signature";

#[derive(Deserialize)]
struct MockWebhookPayload {
    event: String,
    reference: String,
    #[serde(default)]
    payment_id: Option<String>,
}

/// Mock gateway with scripted statuses
pub struct MockGateway {
    tag: Gateway,
    statuses: RwLock<HashMap<String, RemoteStatus>>,
    intents: AtomicUsize,
    status_calls: AtomicUsize,
}

impl MockGateway {
    pub fn new(tag: Gateway) -> Self {
        Self {
            tag,
            statuses: RwLock::new(HashMap::new()),
            intents: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
        }
    }

    /// Script the status the gateway reports for a reference
    pub fn set_status(&self, reference: impl Into<String>, status: RemoteStatus) {
        self.statuses.write().unwrap().insert(reference.into(), status);
    }

    /// How many times `get_status` was called
    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    /// The signature `verify_webhook` accepts
    pub fn valid_signature() -> &'static str {
        MOCK_SIGNATURE
    }
}

#[async_trait]
impl GatewayAdapter for MockGateway {
    fn tag(&self) -> Gateway {
        self.tag
    }

    async fn create_intent(&self, request: &IntentRequest) -> Result<Intent> {
        let n = self.intents.fetch_add(1, Ordering::SeqCst) + 1;
        let amount_minor = to_minor_units(request.amount)
            .ok_or_else(|| PaymentError::Gateway("amount out of range".into()))?;

        Ok(match self.tag {
            Gateway::Stripe => Intent::Redirect {
                session_id: format!("cs_mock_{n}"),
                url: format!("https://checkout.mock.test/session/cs_mock_{n}"),
            },
            Gateway::Razorpay => Intent::Order {
                order_id: format!("order_mock_{n}"),
                amount_minor,
                currency: request.currency,
                key_id: "rzp_test_mock".into(),
            },
        })
    }

    async fn get_status(&self, reference: &str) -> Result<RemoteStatus> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let statuses = self.statuses.read().unwrap();
        Ok(statuses.get(reference).cloned().unwrap_or(RemoteStatus {
            session_state: "open".into(),
            status: TransactionStatus::Pending,
            payment_id: None,
        }))
    }

    fn verify_webhook(&self, payload: &str, signature: &str) -> Result<WebhookSignal> {
        if signature != MOCK_SIGNATURE {
            return Err(PaymentError::InvalidSignature);
        }

        let event: MockWebhookPayload =
            serde_json::from_str(payload).map_err(|e| PaymentError::Gateway(e.to_string()))?;

        if event.event == "payment.captured" {
            Ok(WebhookSignal::Captured {
                payment_id: event.payment_id.unwrap_or_else(|| "pay_mock".into()),
                reference: event.reference,
            })
        } else {
            Ok(WebhookSignal::Ignored { event: event.event })
        }
    }
}
