//! In-Memory Ledgers
//!
//! For development and tests. The conditional transition runs under a
//! single write lock, which gives the same check-and-set atomicity the
//! document store provides with a conditional update.

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use super::{ManualLedger, StatusUpdate, TransactionLedger, Verdict};
use crate::error::Result;
use crate::manual::{ManualPaymentRecord, ManualPaymentStatus};
use crate::model::{Transaction, TransactionStatus, TxKey};

fn matches_key(tx: &Transaction, key: TxKey<'_>) -> bool {
    match key {
        TxKey::Session(s) => tx.session_id.as_deref() == Some(s),
        TxKey::Order(o) => tx.order_id.as_deref() == Some(o),
    }
}

/// In-memory transaction ledger
pub struct MemoryTransactionLedger {
    rows: RwLock<Vec<Transaction>>,
}

impl Default for MemoryTransactionLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTransactionLedger {
    pub fn new() -> Self {
        Self { rows: RwLock::new(Vec::new()) }
    }
}

#[async_trait]
impl TransactionLedger for MemoryTransactionLedger {
    async fn insert(&self, tx: &Transaction) -> Result<()> {
        self.rows.write().unwrap().push(tx.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Transaction>> {
        let rows = self.rows.read().unwrap();
        Ok(rows.iter().find(|tx| tx.id == id).cloned())
    }

    async fn find(&self, key: TxKey<'_>) -> Result<Option<Transaction>> {
        let rows = self.rows.read().unwrap();
        Ok(rows.iter().find(|tx| matches_key(tx, key)).cloned())
    }

    async fn find_paid(&self, key: TxKey<'_>) -> Result<Option<Transaction>> {
        let rows = self.rows.read().unwrap();
        Ok(rows
            .iter()
            .find(|tx| matches_key(tx, key) && tx.status == TransactionStatus::Paid)
            .cloned())
    }

    async fn apply_if_pending(&self, key: TxKey<'_>, update: &StatusUpdate) -> Result<bool> {
        let mut rows = self.rows.write().unwrap();
        let Some(tx) = rows
            .iter_mut()
            .find(|tx| matches_key(tx, key) && tx.status == TransactionStatus::Pending)
        else {
            return Ok(false);
        };

        tx.status = update.status;
        if let Some(payment_id) = &update.payment_id {
            tx.payment_id = Some(payment_id.clone());
        }
        if let Some(state) = &update.session_state {
            tx.session_state = Some(state.clone());
        }
        tx.updated_at = Utc::now();
        Ok(true)
    }
}

/// In-memory manual payment ledger
pub struct MemoryManualLedger {
    rows: RwLock<Vec<ManualPaymentRecord>>,
}

impl Default for MemoryManualLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryManualLedger {
    pub fn new() -> Self {
        Self { rows: RwLock::new(Vec::new()) }
    }
}

#[async_trait]
impl ManualLedger for MemoryManualLedger {
    async fn insert(&self, record: &ManualPaymentRecord) -> Result<()> {
        self.rows.write().unwrap().push(record.clone());
        Ok(())
    }

    async fn find_by_order(&self, order_id: &str) -> Result<Option<ManualPaymentRecord>> {
        let rows = self.rows.read().unwrap();
        Ok(rows.iter().find(|r| r.order_id == order_id).cloned())
    }

    async fn list_pending(&self, skip: u64, limit: i64) -> Result<Vec<ManualPaymentRecord>> {
        let rows = self.rows.read().unwrap();
        let mut pending: Vec<ManualPaymentRecord> = rows
            .iter()
            .filter(|r| r.status == ManualPaymentStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(pending
            .into_iter()
            .skip(skip as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn finalize_if_pending(&self, order_id: &str, verdict: &Verdict) -> Result<bool> {
        let mut rows = self.rows.write().unwrap();
        let Some(record) = rows
            .iter_mut()
            .find(|r| r.order_id == order_id && r.status == ManualPaymentStatus::Pending)
        else {
            return Ok(false);
        };

        record.verified_at = Some(Utc::now());
        match verdict {
            Verdict::Verified { by } => {
                record.status = ManualPaymentStatus::Verified;
                record.verified_by = Some(by.clone());
            }
            Verdict::Rejected { reason } => {
                record.status = ManualPaymentStatus::Rejected;
                record.rejection_reason = reason.clone();
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Currency, Gateway};
    use rust_decimal_macros::dec;

    fn pending_tx(order_id: &str) -> Transaction {
        Transaction::new(
            Gateway::Razorpay,
            order_id,
            "starter",
            "Starter",
            dec!(2400.00),
            Currency::Inr,
            None,
        )
    }

    #[tokio::test]
    async fn test_conditional_update_applies_once() {
        let ledger = MemoryTransactionLedger::new();
        ledger.insert(&pending_tx("order_1")).await.unwrap();

        let update = StatusUpdate::paid("pay_1");
        assert!(ledger.apply_if_pending(TxKey::Order("order_1"), &update).await.unwrap());
        // Re-delivery of the same signal matches zero rows
        assert!(!ledger.apply_if_pending(TxKey::Order("order_1"), &update).await.unwrap());

        let tx = ledger.find(TxKey::Order("order_1")).await.unwrap().unwrap();
        assert_eq!(tx.status, TransactionStatus::Paid);
        assert_eq!(tx.payment_id.as_deref(), Some("pay_1"));
    }

    #[tokio::test]
    async fn test_paid_is_terminal() {
        let ledger = MemoryTransactionLedger::new();
        ledger.insert(&pending_tx("order_1")).await.unwrap();
        ledger
            .apply_if_pending(TxKey::Order("order_1"), &StatusUpdate::paid("pay_1"))
            .await
            .unwrap();

        let demote = StatusUpdate {
            status: TransactionStatus::Failed,
            payment_id: None,
            session_state: None,
        };
        assert!(!ledger.apply_if_pending(TxKey::Order("order_1"), &demote).await.unwrap());

        let tx = ledger.find(TxKey::Order("order_1")).await.unwrap().unwrap();
        assert_eq!(tx.status, TransactionStatus::Paid);
    }

    #[tokio::test]
    async fn test_unknown_key_is_noop() {
        let ledger = MemoryTransactionLedger::new();
        let update = StatusUpdate::paid("pay_1");
        assert!(!ledger.apply_if_pending(TxKey::Order("order_missing"), &update).await.unwrap());
        assert!(ledger.find(TxKey::Order("order_missing")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_leaves_absent_fields() {
        let ledger = MemoryTransactionLedger::new();
        let mut tx = pending_tx("order_1");
        tx.payment_id = Some("pay_existing".into());
        ledger.insert(&tx).await.unwrap();

        let update = StatusUpdate {
            status: TransactionStatus::Pending,
            payment_id: None,
            session_state: Some("open".into()),
        };
        assert!(ledger.apply_if_pending(TxKey::Order("order_1"), &update).await.unwrap());

        let tx = ledger.find(TxKey::Order("order_1")).await.unwrap().unwrap();
        assert_eq!(tx.payment_id.as_deref(), Some("pay_existing"));
        assert_eq!(tx.session_state.as_deref(), Some("open"));
    }
}
