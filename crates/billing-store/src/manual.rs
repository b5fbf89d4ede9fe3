//! Manual Payment Collection
//!
//! One document per submitted bank-transfer/UPI payment in
//! `manual_payments`, keyed by the generated order id.

use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::{Document, doc, to_bson};
use mongodb::options::FindOptions;
use mongodb::{Collection, Database};

use billing_core::{
    ManualLedger, ManualPaymentRecord, ManualPaymentStatus, PaymentError, Result, Verdict,
};

const COLLECTION: &str = "manual_payments";

fn storage_err(e: impl std::fmt::Display) -> PaymentError {
    PaymentError::Storage(e.to_string())
}

fn pending_filter(order_id: &str) -> Document {
    doc! {
        "order_id": order_id,
        "status": ManualPaymentStatus::Pending.as_str(),
    }
}

fn verdict_set(verdict: &Verdict) -> Result<Document> {
    let mut set = doc! { "verified_at": to_bson(&Utc::now()).map_err(storage_err)? };
    match verdict {
        Verdict::Verified { by } => {
            set.insert("status", ManualPaymentStatus::Verified.as_str());
            set.insert("verified_by", by.as_str());
        }
        Verdict::Rejected { reason } => {
            set.insert("status", ManualPaymentStatus::Rejected.as_str());
            if let Some(reason) = reason {
                set.insert("rejection_reason", reason.as_str());
            }
        }
    }
    Ok(set)
}

/// MongoDB manual payment ledger
pub struct MongoManualLedger {
    collection: Collection<ManualPaymentRecord>,
}

impl MongoManualLedger {
    pub fn new(db: &Database) -> Self {
        Self { collection: db.collection(COLLECTION) }
    }
}

#[async_trait]
impl ManualLedger for MongoManualLedger {
    async fn insert(&self, record: &ManualPaymentRecord) -> Result<()> {
        self.collection.insert_one(record, None).await.map_err(storage_err)?;
        Ok(())
    }

    async fn find_by_order(&self, order_id: &str) -> Result<Option<ManualPaymentRecord>> {
        self.collection
            .find_one(doc! { "order_id": order_id }, None)
            .await
            .map_err(storage_err)
    }

    async fn list_pending(&self, skip: u64, limit: i64) -> Result<Vec<ManualPaymentRecord>> {
        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .skip(skip)
            .limit(limit)
            .build();

        let cursor = self
            .collection
            .find(doc! { "status": ManualPaymentStatus::Pending.as_str() }, options)
            .await
            .map_err(storage_err)?;

        cursor.try_collect().await.map_err(storage_err)
    }

    async fn finalize_if_pending(&self, order_id: &str, verdict: &Verdict) -> Result<bool> {
        let result = self
            .collection
            .update_one(pending_filter(order_id), doc! { "$set": verdict_set(verdict)? }, None)
            .await
            .map_err(storage_err)?;
        Ok(result.modified_count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_filter_shape() {
        let filter = pending_filter("ORD12AB34CD");
        assert_eq!(filter.get_str("order_id").unwrap(), "ORD12AB34CD");
        assert_eq!(filter.get_str("status").unwrap(), "pending");
    }

    #[test]
    fn test_verdict_sets() {
        let set = verdict_set(&Verdict::Verified { by: "admin".into() }).unwrap();
        assert_eq!(set.get_str("status").unwrap(), "verified");
        assert_eq!(set.get_str("verified_by").unwrap(), "admin");
        assert!(set.contains_key("verified_at"));

        let set = verdict_set(&Verdict::Rejected { reason: Some("no reference".into()) }).unwrap();
        assert_eq!(set.get_str("status").unwrap(), "rejected");
        assert_eq!(set.get_str("rejection_reason").unwrap(), "no reference");

        let set = verdict_set(&Verdict::Rejected { reason: None }).unwrap();
        assert!(!set.contains_key("rejection_reason"));
    }
}
