//! Stripe Checkout Integration
//!
//! Implements the "Stripe Checkout (Hosted)" approach: one-time payment
//! sessions created with the server-resolved amount, status retrieval by
//! session id, and webhook verification through the Stripe SDK.

use async_trait::async_trait;
use std::collections::HashMap;
use stripe::{
    CheckoutSession, CheckoutSessionId, CheckoutSessionMode, CheckoutSessionPaymentStatus,
    CheckoutSessionStatus, Client, CreateCheckoutSession, CreateCheckoutSessionLineItems,
    CreateCheckoutSessionLineItemsPriceData, CreateCheckoutSessionLineItemsPriceDataProductData,
    Currency as StripeCurrency, EventObject, EventType, Webhook,
};

use billing_core::{
    Currency, Gateway, GatewayAdapter, Intent, IntentRequest, PaymentError, RemoteStatus, Result,
    TransactionStatus, WebhookSignal, to_minor_units,
};

/// Stripe gateway adapter
pub struct StripeGateway {
    client: Client,
    webhook_secret: String,
}

impl StripeGateway {
    pub fn new(secret_key: &str, webhook_secret: &str) -> Self {
        Self {
            client: Client::new(secret_key),
            webhook_secret: webhook_secret.to_string(),
        }
    }
}

fn stripe_currency(currency: Currency) -> StripeCurrency {
    match currency {
        Currency::Usd => StripeCurrency::USD,
        Currency::Inr => StripeCurrency::INR,
    }
}

/// Success/cancel redirect targets built from the caller's origin.
///
/// Stripe substitutes the session id placeholder on redirect.
fn redirect_urls(origin: &str) -> (String, String) {
    let origin = origin.trim_end_matches('/');
    (
        format!("{origin}/payment-success?session_id={{CHECKOUT_SESSION_ID}}"),
        format!("{origin}/payment-cancelled"),
    )
}

fn map_status(
    payment_status: CheckoutSessionPaymentStatus,
    session_status: Option<CheckoutSessionStatus>,
) -> TransactionStatus {
    match payment_status {
        CheckoutSessionPaymentStatus::Paid | CheckoutSessionPaymentStatus::NoPaymentRequired => {
            TransactionStatus::Paid
        }
        CheckoutSessionPaymentStatus::Unpaid => match session_status {
            Some(CheckoutSessionStatus::Expired) => TransactionStatus::Expired,
            _ => TransactionStatus::Pending,
        },
    }
}

#[async_trait]
impl GatewayAdapter for StripeGateway {
    fn tag(&self) -> Gateway {
        Gateway::Stripe
    }

    async fn create_intent(&self, request: &IntentRequest) -> Result<Intent> {
        let origin = request
            .origin_url
            .as_deref()
            .ok_or_else(|| PaymentError::Gateway("origin url required for hosted checkout".into()))?;
        let (success_url, cancel_url) = redirect_urls(origin);

        let unit_amount = to_minor_units(request.amount)
            .ok_or_else(|| PaymentError::Gateway("amount out of range".into()))?;

        let mut params = CreateCheckoutSession::new();
        params.success_url = Some(&success_url);
        params.cancel_url = Some(&cancel_url);
        params.mode = Some(CheckoutSessionMode::Payment);
        params.customer_email = request.user_email.as_deref();

        let mut metadata = HashMap::new();
        metadata.insert("package_id".to_string(), request.package_id.clone());
        metadata.insert("package_name".to_string(), request.package_name.clone());
        metadata.insert(
            "user_email".to_string(),
            request.user_email.clone().unwrap_or_else(|| "guest".into()),
        );
        params.metadata = Some(metadata);

        params.line_items = Some(vec![CreateCheckoutSessionLineItems {
            quantity: Some(1),
            price_data: Some(CreateCheckoutSessionLineItemsPriceData {
                currency: stripe_currency(request.currency),
                unit_amount: Some(unit_amount),
                product_data: Some(CreateCheckoutSessionLineItemsPriceDataProductData {
                    name: request.package_name.clone(),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        }]);

        let session = CheckoutSession::create(&self.client, params)
            .await
            .map_err(|e| PaymentError::Gateway(e.to_string()))?;

        let url = session
            .url
            .ok_or_else(|| PaymentError::Gateway("no checkout URL returned".into()))?;

        Ok(Intent::Redirect {
            session_id: session.id.to_string(),
            url,
        })
    }

    async fn get_status(&self, reference: &str) -> Result<RemoteStatus> {
        let session_id: CheckoutSessionId = reference
            .parse()
            .map_err(|_| PaymentError::TransactionNotFound(reference.to_string()))?;

        let session = CheckoutSession::retrieve(&self.client, &session_id, &[])
            .await
            .map_err(|e| PaymentError::Gateway(e.to_string()))?;

        Ok(RemoteStatus {
            session_state: session
                .status
                .map_or_else(|| "open".to_string(), |s| s.as_str().to_string()),
            status: map_status(session.payment_status, session.status),
            payment_id: session.payment_intent.as_ref().map(|pi| pi.id().to_string()),
        })
    }

    fn verify_webhook(&self, payload: &str, signature: &str) -> Result<WebhookSignal> {
        let event = Webhook::construct_event(payload, signature, &self.webhook_secret)
            .map_err(|e| {
                tracing::warn!(error = %e, "Stripe webhook signature verification failed");
                PaymentError::InvalidSignature
            })?;

        match event.type_ {
            EventType::CheckoutSessionCompleted
            | EventType::CheckoutSessionAsyncPaymentSucceeded => {
                let EventObject::CheckoutSession(session) = &event.data.object else {
                    return Err(PaymentError::Gateway("unexpected webhook object".into()));
                };

                if session.payment_status == CheckoutSessionPaymentStatus::Paid {
                    let payment_id = session
                        .payment_intent
                        .as_ref()
                        .map_or_else(|| event.id.to_string(), |pi| pi.id().to_string());
                    Ok(WebhookSignal::Captured {
                        reference: session.id.to_string(),
                        payment_id,
                    })
                } else {
                    // Completed with a delayed payment method; the
                    // async_payment_succeeded event will carry the capture.
                    Ok(WebhookSignal::Ignored {
                        event: format!("{:?}", event.type_),
                    })
                }
            }
            other => Ok(WebhookSignal::Ignored { event: format!("{other:?}") }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_redirect_urls() {
        let (success, cancel) = redirect_urls("https://app.example.com/");
        assert_eq!(
            success,
            "https://app.example.com/payment-success?session_id={CHECKOUT_SESSION_ID}"
        );
        assert_eq!(cancel, "https://app.example.com/payment-cancelled");
    }

    #[test]
    fn test_unit_amounts() {
        assert_eq!(to_minor_units(dec!(29.00)), Some(2900));
        assert_eq!(to_minor_units(dec!(79.00)), Some(7900));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            map_status(CheckoutSessionPaymentStatus::Paid, Some(CheckoutSessionStatus::Complete)),
            TransactionStatus::Paid
        );
        assert_eq!(
            map_status(CheckoutSessionPaymentStatus::Unpaid, Some(CheckoutSessionStatus::Open)),
            TransactionStatus::Pending
        );
        assert_eq!(
            map_status(CheckoutSessionPaymentStatus::Unpaid, Some(CheckoutSessionStatus::Expired)),
            TransactionStatus::Expired
        );
    }
}
