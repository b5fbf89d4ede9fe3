//! Application State

use std::sync::Arc;

use billing_core::{
    BankDetails, Checkout, ManualPayments, PackageCatalog, Reconciler, TransactionLedger,
    UpiDetails,
};
use billing_gateways::{RazorpayGateway, StripeGateway};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Authoritative pricing table
    pub catalog: Arc<PackageCatalog>,

    /// Checkout initiation (catalog + ledger)
    pub checkout: Arc<Checkout>,

    /// Status reconciliation core
    pub reconciler: Arc<Reconciler>,

    /// Transaction ledger, for direct lookups
    pub transactions: Arc<dyn TransactionLedger>,

    /// Manual payment flows
    pub manual: Arc<ManualPayments>,

    /// Stripe gateway (None if not configured)
    pub stripe: Option<Arc<StripeGateway>>,

    /// Razorpay gateway (None if not configured)
    pub razorpay: Option<Arc<RazorpayGateway>>,

    /// Manual transfer destinations (None if not configured)
    pub bank: Option<Arc<BankDetails>>,
    pub upi: Option<Arc<UpiDetails>>,
}
