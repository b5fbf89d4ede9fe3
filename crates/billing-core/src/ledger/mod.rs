//! Payment Ledgers
//!
//! Persistence traits for transactions and manual payments. The single
//! write primitive both stores must provide is the conditional status
//! transition: one atomic "update where {key, status == pending}" write,
//! never a read-then-write pair.

mod memory;

pub use memory::{MemoryManualLedger, MemoryTransactionLedger};

use async_trait::async_trait;

use crate::error::Result;
use crate::manual::ManualPaymentRecord;
use crate::model::{Transaction, TransactionStatus, TxKey};

/// A status transition to apply to a pending transaction
#[derive(Clone, Debug)]
pub struct StatusUpdate {
    pub status: TransactionStatus,
    /// Gateway payment id; absent fields are left untouched
    pub payment_id: Option<String>,
    /// Gateway-reported checkout state, from polling
    pub session_state: Option<String>,
}

impl StatusUpdate {
    /// The paid transition applied by webhooks and explicit verification
    pub fn paid(payment_id: impl Into<String>) -> Self {
        Self {
            status: TransactionStatus::Paid,
            payment_id: Some(payment_id.into()),
            session_state: None,
        }
    }
}

/// Admin decision on a manual payment
#[derive(Clone, Debug)]
pub enum Verdict {
    Verified { by: String },
    Rejected { reason: Option<String> },
}

/// Transaction ledger storage trait
#[async_trait]
pub trait TransactionLedger: Send + Sync {
    /// Append a new transaction row
    async fn insert(&self, tx: &Transaction) -> Result<()>;

    /// Fetch by internal id
    async fn find_by_id(&self, id: &str) -> Result<Option<Transaction>>;

    /// Fetch by gateway-assigned key
    async fn find(&self, key: TxKey<'_>) -> Result<Option<Transaction>>;

    /// Fetch by key, only if the row is already paid
    async fn find_paid(&self, key: TxKey<'_>) -> Result<Option<Transaction>>;

    /// Conditionally apply a status transition.
    ///
    /// The write only lands if the row currently matches {key, pending};
    /// returns whether a row changed. Zero rows changed is NOT an error -
    /// it means the signal was already applied (or the key is unknown),
    /// and callers decide what that means for their path.
    async fn apply_if_pending(&self, key: TxKey<'_>, update: &StatusUpdate) -> Result<bool>;
}

/// Manual payment ledger storage trait
#[async_trait]
pub trait ManualLedger: Send + Sync {
    async fn insert(&self, record: &ManualPaymentRecord) -> Result<()>;

    async fn find_by_order(&self, order_id: &str) -> Result<Option<ManualPaymentRecord>>;

    /// Pending records, newest first
    async fn list_pending(&self, skip: u64, limit: i64) -> Result<Vec<ManualPaymentRecord>>;

    /// Conditionally finalize a pending record; returns whether a row changed
    async fn finalize_if_pending(&self, order_id: &str, verdict: &Verdict) -> Result<bool>;
}
