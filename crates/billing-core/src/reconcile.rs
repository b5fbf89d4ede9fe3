//! Status Reconciliation
//!
//! Applies status signals from every source - client polls, webhook
//! deliveries, explicit verification - to the transaction ledger. All
//! paths share one invariant: a transaction reaches a terminal status at
//! most once, and re-delivery of the same signal is a no-op.
//!
//! The mechanism is the ledger's conditional transition: a single write
//! that only lands while the row is still pending. Concurrent deliveries
//! race safely; one applies, the loser matches zero rows.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{PaymentError, Result};
use crate::gateway::GatewayAdapter;
use crate::ledger::{StatusUpdate, TransactionLedger};
use crate::model::{Currency, Gateway, Transaction, TransactionStatus, TxKey};

/// Merged status view returned by polls: gateway-reported checkout state
/// plus ledger-authoritative amount/package fields.
#[derive(Clone, Debug, Serialize)]
pub struct StatusView {
    /// Gateway checkout state ("open", "complete", "expired", ...)
    pub status: String,
    pub payment_status: TransactionStatus,
    pub amount: Decimal,
    pub currency: Currency,
    pub package_name: String,
    pub payment_gateway: Gateway,
}

impl StatusView {
    fn merged(session_state: String, tx: &Transaction) -> Self {
        Self {
            status: session_state,
            payment_status: tx.status,
            amount: tx.amount,
            currency: tx.currency,
            package_name: tx.package_name.clone(),
            payment_gateway: tx.gateway,
        }
    }

    /// View for a transaction the ledger already settled
    fn settled(tx: &Transaction) -> Self {
        Self::merged("complete".into(), tx)
    }
}

/// Outcome of an explicit payment verification
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Confirmation {
    /// This call applied the paid transition
    Confirmed,
    /// The transaction was already paid; reported as success
    AlreadyProcessed,
}

/// Applies status signals to the transaction ledger
pub struct Reconciler {
    ledger: Arc<dyn TransactionLedger>,
}

impl Reconciler {
    pub fn new(ledger: Arc<dyn TransactionLedger>) -> Self {
        Self { ledger }
    }

    /// Client poll path.
    ///
    /// A ledger row that is already paid is returned as-is without
    /// querying the gateway: the gateway may report transient states on
    /// retry, and the extra remote call buys nothing. Otherwise the
    /// gateway-reported status is applied conditionally and the merged
    /// view is built from a re-read, so a concurrent paid transition is
    /// never shadowed by a stale remote answer.
    pub async fn poll(&self, adapter: &dyn GatewayAdapter, reference: &str) -> Result<StatusView> {
        let key = adapter.tag().key(reference);

        if let Some(tx) = self.ledger.find_paid(key).await? {
            return Ok(StatusView::settled(&tx));
        }

        let remote = adapter.get_status(reference).await?;
        let update = StatusUpdate {
            status: remote.status,
            payment_id: remote.payment_id.clone(),
            session_state: Some(remote.session_state.clone()),
        };
        self.ledger.apply_if_pending(key, &update).await?;

        let tx = self
            .ledger
            .find(key)
            .await?
            .ok_or_else(|| PaymentError::TransactionNotFound(reference.to_string()))?;

        Ok(StatusView::merged(remote.session_state, &tx))
    }

    /// Webhook path: apply a captured/paid event.
    ///
    /// Deliveries are at-least-once, so a signal that matches zero rows
    /// (already applied, or the reference was never ours) is discarded
    /// silently - a webhook must never fail for being late or repeated.
    /// Returns whether this delivery changed the ledger.
    pub async fn apply_captured(&self, key: TxKey<'_>, payment_id: &str) -> Result<bool> {
        let applied = self
            .ledger
            .apply_if_pending(key, &StatusUpdate::paid(payment_id))
            .await?;

        if applied {
            tracing::info!(reference = %key.reference(), payment_id = %payment_id, "Payment captured");
        } else {
            tracing::debug!(reference = %key.reference(), "Capture signal already applied, ignoring");
        }

        Ok(applied)
    }

    /// Explicit verification path (client-submitted, signature already
    /// checked by the caller).
    ///
    /// Unlike webhooks this caller deserves an answer: paid now or paid
    /// before both report success; a reference the ledger has never seen
    /// is an error.
    pub async fn confirm_captured(&self, order_id: &str, payment_id: &str) -> Result<Confirmation> {
        let key = TxKey::Order(order_id);

        if self.ledger.find_paid(key).await?.is_some() {
            return Ok(Confirmation::AlreadyProcessed);
        }

        if self.ledger.apply_if_pending(key, &StatusUpdate::paid(payment_id)).await? {
            tracing::info!(order_id = %order_id, payment_id = %payment_id, "Payment verified");
            return Ok(Confirmation::Confirmed);
        }

        // Lost a race with another delivery between the read and the
        // conditional write; paid still means success.
        if self.ledger.find_paid(key).await?.is_some() {
            return Ok(Confirmation::AlreadyProcessed);
        }

        Err(PaymentError::TransactionNotFound(order_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{MockGateway, RemoteStatus};
    use crate::ledger::MemoryTransactionLedger;
    use rust_decimal_macros::dec;

    fn pending_tx(gateway: Gateway, reference: &str) -> Transaction {
        Transaction::new(
            gateway,
            reference,
            "starter",
            "Starter",
            dec!(2400.00),
            Currency::Inr,
            Some("asha@example.com".into()),
        )
    }

    fn setup() -> (Arc<MemoryTransactionLedger>, Reconciler) {
        let ledger = Arc::new(MemoryTransactionLedger::new());
        let reconciler = Reconciler::new(ledger.clone());
        (ledger, reconciler)
    }

    #[tokio::test]
    async fn test_webhook_idempotent() {
        let (ledger, reconciler) = setup();
        ledger.insert(&pending_tx(Gateway::Razorpay, "order_1")).await.unwrap();

        assert!(reconciler.apply_captured(TxKey::Order("order_1"), "pay_1").await.unwrap());
        // Second delivery of the same event: no-op, no error
        assert!(!reconciler.apply_captured(TxKey::Order("order_1"), "pay_1").await.unwrap());

        let tx = ledger.find(TxKey::Order("order_1")).await.unwrap().unwrap();
        assert_eq!(tx.status, TransactionStatus::Paid);
        assert_eq!(tx.payment_id.as_deref(), Some("pay_1"));
    }

    #[tokio::test]
    async fn test_webhook_unknown_reference_is_silent() {
        let (_ledger, reconciler) = setup();
        // No row for this order: accepted, nothing created, no error
        assert!(!reconciler.apply_captured(TxKey::Order("order_ghost"), "pay_1").await.unwrap());
    }

    #[tokio::test]
    async fn test_concurrent_captures_apply_once() {
        let (ledger, reconciler) = setup();
        ledger.insert(&pending_tx(Gateway::Razorpay, "order_1")).await.unwrap();
        let reconciler = Arc::new(reconciler);

        let a = {
            let r = reconciler.clone();
            tokio::spawn(async move { r.apply_captured(TxKey::Order("order_1"), "pay_a").await })
        };
        let b = {
            let r = reconciler.clone();
            tokio::spawn(async move { r.apply_captured(TxKey::Order("order_1"), "pay_b").await })
        };

        let a = a.await.unwrap().unwrap();
        let b = b.await.unwrap().unwrap();
        assert!(a ^ b, "exactly one delivery must apply");

        let tx = ledger.find(TxKey::Order("order_1")).await.unwrap().unwrap();
        assert_eq!(tx.status, TransactionStatus::Paid);
    }

    #[tokio::test]
    async fn test_poll_skips_gateway_when_paid() {
        let (ledger, reconciler) = setup();
        ledger.insert(&pending_tx(Gateway::Stripe, "cs_1")).await.unwrap();
        ledger
            .apply_if_pending(TxKey::Session("cs_1"), &StatusUpdate::paid("pi_1"))
            .await
            .unwrap();

        let gateway = MockGateway::new(Gateway::Stripe);
        let view = reconciler.poll(&gateway, "cs_1").await.unwrap();

        assert_eq!(gateway.status_calls(), 0, "paid rows must not hit the gateway");
        assert_eq!(view.status, "complete");
        assert_eq!(view.payment_status, TransactionStatus::Paid);
        assert_eq!(view.amount, dec!(2400.00));
    }

    #[tokio::test]
    async fn test_poll_merges_remote_state() {
        let (ledger, reconciler) = setup();
        ledger.insert(&pending_tx(Gateway::Stripe, "cs_1")).await.unwrap();

        let gateway = MockGateway::new(Gateway::Stripe);
        gateway.set_status(
            "cs_1",
            RemoteStatus {
                session_state: "complete".into(),
                status: TransactionStatus::Paid,
                payment_id: Some("pi_1".into()),
            },
        );

        let view = reconciler.poll(&gateway, "cs_1").await.unwrap();
        assert_eq!(gateway.status_calls(), 1);
        assert_eq!(view.status, "complete");
        assert_eq!(view.payment_status, TransactionStatus::Paid);
        assert_eq!(view.package_name, "Starter");
        assert_eq!(view.currency, Currency::Inr);

        let tx = ledger.find(TxKey::Session("cs_1")).await.unwrap().unwrap();
        assert_eq!(tx.status, TransactionStatus::Paid);
        assert_eq!(tx.session_state.as_deref(), Some("complete"));
    }

    #[tokio::test]
    async fn test_poll_cannot_demote_paid() {
        let (ledger, reconciler) = setup();
        ledger.insert(&pending_tx(Gateway::Stripe, "cs_1")).await.unwrap();
        ledger
            .apply_if_pending(TxKey::Session("cs_1"), &StatusUpdate::paid("pi_1"))
            .await
            .unwrap();

        // Gateway scripted to report a stale expired state
        let gateway = MockGateway::new(Gateway::Stripe);
        gateway.set_status(
            "cs_1",
            RemoteStatus {
                session_state: "expired".into(),
                status: TransactionStatus::Expired,
                payment_id: None,
            },
        );

        let view = reconciler.poll(&gateway, "cs_1").await.unwrap();
        assert_eq!(view.payment_status, TransactionStatus::Paid);

        let tx = ledger.find(TxKey::Session("cs_1")).await.unwrap().unwrap();
        assert_eq!(tx.status, TransactionStatus::Paid);
    }

    #[tokio::test]
    async fn test_poll_unknown_reference() {
        let (_ledger, reconciler) = setup();
        let gateway = MockGateway::new(Gateway::Stripe);
        let err = reconciler.poll(&gateway, "cs_ghost").await.unwrap_err();
        assert!(matches!(err, PaymentError::TransactionNotFound(_)));
    }

    #[tokio::test]
    async fn test_confirm_paths() {
        let (ledger, reconciler) = setup();
        ledger.insert(&pending_tx(Gateway::Razorpay, "order_1")).await.unwrap();

        // Unknown order id is an error on this caller-facing path
        let err = reconciler.confirm_captured("order_ghost", "pay_1").await.unwrap_err();
        assert!(matches!(err, PaymentError::TransactionNotFound(_)));

        let first = reconciler.confirm_captured("order_1", "pay_1").await.unwrap();
        assert_eq!(first, Confirmation::Confirmed);

        let second = reconciler.confirm_captured("order_1", "pay_1").await.unwrap();
        assert_eq!(second, Confirmation::AlreadyProcessed);
    }
}
