//! # billing-store
//!
//! MongoDB implementations of the billing-core ledger traits.
//!
//! The one property the store must uphold is that status transitions are
//! single conditional writes: `update_one` with a `{key, status:
//! "pending"}` filter, so concurrent deliveries of the same signal race
//! on the server and exactly one modifies the row. No document is ever
//! read-modified-written, and none is ever deleted.

pub mod manual;
pub mod transactions;

pub use manual::MongoManualLedger;
pub use transactions::MongoTransactionLedger;

use mongodb::{Client, Database, options::ClientOptions};

use billing_core::{PaymentError, Result};

/// Connect to the document store and select the database
pub async fn connect(url: &str, db_name: &str) -> Result<Database> {
    let mut options = ClientOptions::parse(url)
        .await
        .map_err(|e| PaymentError::Storage(e.to_string()))?;
    options.app_name = Some("scribe-billing".to_string());

    let client = Client::with_options(options).map_err(|e| PaymentError::Storage(e.to_string()))?;
    Ok(client.database(db_name))
}
