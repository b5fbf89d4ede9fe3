//! Transaction Ledger Collection
//!
//! One document per checkout/order creation in `payment_transactions`,
//! keyed by the gateway-assigned session or order id.

use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson::{Document, doc, to_bson};
use mongodb::{Collection, Database};

use billing_core::{
    PaymentError, Result, StatusUpdate, Transaction, TransactionLedger, TransactionStatus, TxKey,
};

const COLLECTION: &str = "payment_transactions";

fn storage_err(e: impl std::fmt::Display) -> PaymentError {
    PaymentError::Storage(e.to_string())
}

fn key_filter(key: TxKey<'_>) -> Document {
    match key {
        TxKey::Session(session_id) => doc! { "session_id": session_id },
        TxKey::Order(order_id) => doc! { "order_id": order_id },
    }
}

/// Filter matching a row that is still open for transitions
fn pending_filter(key: TxKey<'_>) -> Document {
    let mut filter = key_filter(key);
    filter.insert("status", TransactionStatus::Pending.as_str());
    filter
}

fn transition_set(update: &StatusUpdate) -> Result<Document> {
    let mut set = doc! { "status": update.status.as_str() };
    set.insert("updated_at", to_bson(&Utc::now()).map_err(storage_err)?);
    if let Some(payment_id) = &update.payment_id {
        set.insert("payment_id", payment_id.as_str());
    }
    if let Some(state) = &update.session_state {
        set.insert("session_state", state.as_str());
    }
    Ok(set)
}

/// MongoDB transaction ledger
pub struct MongoTransactionLedger {
    collection: Collection<Transaction>,
}

impl MongoTransactionLedger {
    pub fn new(db: &Database) -> Self {
        Self { collection: db.collection(COLLECTION) }
    }
}

#[async_trait]
impl TransactionLedger for MongoTransactionLedger {
    async fn insert(&self, tx: &Transaction) -> Result<()> {
        self.collection.insert_one(tx, None).await.map_err(storage_err)?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Transaction>> {
        self.collection
            .find_one(doc! { "id": id }, None)
            .await
            .map_err(storage_err)
    }

    async fn find(&self, key: TxKey<'_>) -> Result<Option<Transaction>> {
        self.collection
            .find_one(key_filter(key), None)
            .await
            .map_err(storage_err)
    }

    async fn find_paid(&self, key: TxKey<'_>) -> Result<Option<Transaction>> {
        let mut filter = key_filter(key);
        filter.insert("status", TransactionStatus::Paid.as_str());
        self.collection.find_one(filter, None).await.map_err(storage_err)
    }

    async fn apply_if_pending(&self, key: TxKey<'_>, update: &StatusUpdate) -> Result<bool> {
        let result = self
            .collection
            .update_one(pending_filter(key), doc! { "$set": transition_set(update)? }, None)
            .await
            .map_err(storage_err)?;
        Ok(result.modified_count > 0)
    }
}
