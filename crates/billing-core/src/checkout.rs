//! Checkout Initiation
//!
//! Creates a remote payment intent and records the pending transaction.
//! Amounts are always resolved from the catalog; the request type has no
//! amount field a client could smuggle one through.

use std::sync::Arc;

use crate::catalog::PackageCatalog;
use crate::error::Result;
use crate::gateway::{GatewayAdapter, Intent, IntentRequest};
use crate::ledger::TransactionLedger;
use crate::model::{Currency, Transaction};

/// A checkout request as the server sees it
#[derive(Clone, Debug)]
pub struct CheckoutRequest {
    pub package_id: String,
    pub currency: Currency,
    /// Origin for redirect targets; hosted checkout only
    pub origin_url: Option<String>,
    pub user_email: Option<String>,
}

/// Creates gateway intents and pending ledger rows
pub struct Checkout {
    catalog: Arc<PackageCatalog>,
    ledger: Arc<dyn TransactionLedger>,
}

impl Checkout {
    pub fn new(catalog: Arc<PackageCatalog>, ledger: Arc<dyn TransactionLedger>) -> Self {
        Self { catalog, ledger }
    }

    /// Create a remote intent and persist the pending transaction.
    ///
    /// Every call creates a fresh remote intent and a fresh row; repeated
    /// calls are deliberate new attempts, not retries.
    pub async fn create(
        &self,
        adapter: &dyn GatewayAdapter,
        request: CheckoutRequest,
    ) -> Result<(Transaction, Intent)> {
        let (package, amount) = self.catalog.checkout_price(&request.package_id, request.currency)?;

        let intent = adapter
            .create_intent(&IntentRequest {
                package_id: package.id.clone(),
                package_name: package.name.clone(),
                amount,
                currency: request.currency,
                origin_url: request.origin_url,
                user_email: request.user_email.clone(),
            })
            .await?;

        let tx = Transaction::new(
            adapter.tag(),
            intent.reference(),
            package.id.clone(),
            package.name.clone(),
            amount,
            request.currency,
            request.user_email,
        );
        self.ledger.insert(&tx).await?;

        tracing::info!(
            gateway = %tx.gateway,
            reference = %intent.reference(),
            package = %tx.package_id,
            "Checkout created"
        );

        Ok((tx, intent))
    }
}
