//! Razorpay Integration
//!
//! Order creation against the Orders API, and HMAC-SHA256 verification
//! of both the client-reported payment signature and webhook payloads.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::json;
use sha2::Sha256;

use billing_core::{
    Gateway, GatewayAdapter, Intent, IntentRequest, PaymentError, RemoteStatus, Result,
    TransactionStatus, WebhookSignal, to_minor_units,
};

type HmacSha256 = Hmac<Sha256>;

const DEFAULT_BASE_URL: &str = "https://api.razorpay.com";

#[derive(Deserialize)]
struct OrderCreated {
    id: String,
}

#[derive(Deserialize)]
struct OrderFetched {
    status: String,
}

#[derive(Deserialize)]
struct WebhookEnvelope {
    event: String,
    #[serde(default)]
    payload: WebhookPayload,
}

#[derive(Default, Deserialize)]
struct WebhookPayload {
    #[serde(default)]
    payment: Option<PaymentWrapper>,
}

#[derive(Deserialize)]
struct PaymentWrapper {
    entity: PaymentEntity,
}

#[derive(Deserialize)]
struct PaymentEntity {
    id: String,
    #[serde(default)]
    order_id: Option<String>,
}

/// Razorpay gateway adapter
pub struct RazorpayGateway {
    http: reqwest::Client,
    base_url: String,
    key_id: String,
    key_secret: String,
    webhook_secret: Option<String>,
}

impl RazorpayGateway {
    pub fn new(key_id: &str, key_secret: &str, webhook_secret: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            key_id: key_id.to_string(),
            key_secret: key_secret.to_string(),
            webhook_secret,
        }
    }

    /// Point at a different API host (test servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Key id the checkout widget initializes with
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Verify the signature triple the checkout widget hands the client.
    ///
    /// Razorpay signs `"{order_id}|{payment_id}"` with the key secret.
    pub fn verify_payment_signature(
        &self,
        order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<()> {
        verify_hmac(&self.key_secret, &format!("{order_id}|{payment_id}"), signature)
    }
}

/// Constant-time HMAC-SHA256 check against a hex-encoded signature
fn verify_hmac(secret: &str, message: &str, signature_hex: &str) -> Result<()> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| PaymentError::Config(e.to_string()))?;
    mac.update(message.as_bytes());

    let signature = hex::decode(signature_hex).map_err(|_| PaymentError::InvalidSignature)?;
    mac.verify_slice(&signature).map_err(|_| PaymentError::InvalidSignature)
}

fn map_order_status(status: &str) -> TransactionStatus {
    match status {
        "paid" => TransactionStatus::Paid,
        // "created" and "attempted" are both still in flight
        _ => TransactionStatus::Pending,
    }
}

#[async_trait]
impl GatewayAdapter for RazorpayGateway {
    fn tag(&self) -> Gateway {
        Gateway::Razorpay
    }

    async fn create_intent(&self, request: &IntentRequest) -> Result<Intent> {
        let amount_minor = to_minor_units(request.amount)
            .ok_or_else(|| PaymentError::Gateway("amount out of range".into()))?;

        let body = json!({
            "amount": amount_minor,
            "currency": request.currency.code(),
            "payment_capture": 1,
            "notes": {
                "package_id": request.package_id,
                "package_name": request.package_name,
                "user_email": request.user_email.as_deref().unwrap_or("guest"),
            }
        });

        let response = self
            .http
            .post(format!("{}/v1/orders", self.base_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&body)
            .send()
            .await
            .map_err(|e| PaymentError::Gateway(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(200).collect();
            return Err(PaymentError::Gateway(format!(
                "order creation failed: HTTP {status}: {body}"
            )));
        }

        let order: OrderCreated = response
            .json()
            .await
            .map_err(|e| PaymentError::Gateway(e.to_string()))?;

        Ok(Intent::Order {
            order_id: order.id,
            amount_minor,
            currency: request.currency,
            key_id: self.key_id.clone(),
        })
    }

    async fn get_status(&self, reference: &str) -> Result<RemoteStatus> {
        let response = self
            .http
            .get(format!("{}/v1/orders/{reference}", self.base_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .send()
            .await
            .map_err(|e| PaymentError::Gateway(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(PaymentError::TransactionNotFound(reference.to_string()));
        }
        if !response.status().is_success() {
            return Err(PaymentError::Gateway(format!(
                "order fetch failed: HTTP {}",
                response.status()
            )));
        }

        let order: OrderFetched = response
            .json()
            .await
            .map_err(|e| PaymentError::Gateway(e.to_string()))?;

        Ok(RemoteStatus {
            status: map_order_status(&order.status),
            session_state: order.status,
            // The order view does not name a payment; the capture webhook
            // or the client-reported triple carries the payment id.
            payment_id: None,
        })
    }

    fn verify_webhook(&self, payload: &str, signature: &str) -> Result<WebhookSignal> {
        let Some(secret) = &self.webhook_secret else {
            tracing::warn!("Razorpay webhook secret not configured, ignoring event");
            return Ok(WebhookSignal::Ignored { event: "unverified".into() });
        };

        verify_hmac(secret, payload, signature)?;

        let envelope: WebhookEnvelope =
            serde_json::from_str(payload).map_err(|e| PaymentError::Gateway(e.to_string()))?;

        if envelope.event == "payment.captured" {
            if let Some(payment) = envelope.payload.payment {
                if let Some(order_id) = payment.entity.order_id {
                    return Ok(WebhookSignal::Captured {
                        reference: order_id,
                        payment_id: payment.entity.id,
                    });
                }
            }
        }

        Ok(WebhookSignal::Ignored { event: envelope.event })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, message: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(message.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn gateway(webhook_secret: Option<&str>) -> RazorpayGateway {
        RazorpayGateway::new("rzp_test_key", "rzp_test_secret", webhook_secret.map(String::from))
    }

    #[test]
    fn test_payment_signature_roundtrip() {
        let gateway = gateway(None);
        let signature = sign("rzp_test_secret", "order_1|pay_1");

        gateway.verify_payment_signature("order_1", "pay_1", &signature).unwrap();

        let err = gateway
            .verify_payment_signature("order_1", "pay_2", &signature)
            .unwrap_err();
        assert!(matches!(err, PaymentError::InvalidSignature));
    }

    #[test]
    fn test_payment_signature_rejects_garbage() {
        let gateway = gateway(None);
        let err = gateway
            .verify_payment_signature("order_1", "pay_1", "not-hex!")
            .unwrap_err();
        assert!(matches!(err, PaymentError::InvalidSignature));
    }

    #[test]
    fn test_webhook_captured_event() {
        let gateway = gateway(Some("whsec"));
        let payload = r#"{
            "event": "payment.captured",
            "payload": {"payment": {"entity": {"id": "pay_9", "order_id": "order_9"}}}
        }"#;
        let signature = sign("whsec", payload);

        let signal = gateway.verify_webhook(payload, &signature).unwrap();
        match signal {
            WebhookSignal::Captured { reference, payment_id } => {
                assert_eq!(reference, "order_9");
                assert_eq!(payment_id, "pay_9");
            }
            WebhookSignal::Ignored { .. } => panic!("expected captured signal"),
        }
    }

    #[test]
    fn test_webhook_other_events_ignored() {
        let gateway = gateway(Some("whsec"));
        let payload = r#"{
            "event": "payment.failed",
            "payload": {"payment": {"entity": {"id": "pay_9", "order_id": "order_9"}}}
        }"#;
        let signature = sign("whsec", payload);

        let signal = gateway.verify_webhook(payload, &signature).unwrap();
        assert!(matches!(signal, WebhookSignal::Ignored { .. }));
    }

    #[test]
    fn test_webhook_bad_signature() {
        let gateway = gateway(Some("whsec"));
        let payload = r#"{"event": "payment.captured", "payload": {}}"#;
        let signature = sign("wrong-secret", payload);

        let err = gateway.verify_webhook(payload, &signature).unwrap_err();
        assert!(matches!(err, PaymentError::InvalidSignature));
    }

    #[test]
    fn test_webhook_without_secret_is_ignored() {
        let gateway = gateway(None);
        let signal = gateway.verify_webhook("{}", "anything").unwrap();
        assert!(matches!(signal, WebhookSignal::Ignored { .. }));
    }

    #[test]
    fn test_order_status_mapping() {
        assert_eq!(map_order_status("paid"), TransactionStatus::Paid);
        assert_eq!(map_order_status("created"), TransactionStatus::Pending);
        assert_eq!(map_order_status("attempted"), TransactionStatus::Pending);
    }
}
