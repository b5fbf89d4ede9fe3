//! # billing-core
//!
//! Package catalog, payment ledgers, and status reconciliation for
//! scribe-billing.
//!
//! The interesting property this crate guards is that a payment record
//! reaches a terminal status at most once, no matter how many times the
//! same signal arrives or from which source (client poll, gateway
//! webhook, admin action). Everything hangs off one primitive:
//!
//! ```text
//!           signal (poll / webhook / verify / admin)
//!                          │
//!                          ▼
//!          update where { key, status == pending }
//!                          │
//!            ┌─────────────┴─────────────┐
//!            ▼                           ▼
//!      1 row changed               0 rows changed
//!      transition applied          already applied → no-op
//! ```
//!
//! Gateway paths treat the zero-row case as success (at-least-once
//! delivery makes duplicates normal); operator paths report it as a
//! conflict, because a human acted on stale state and should know.
//!
//! Amounts are never taken from clients: checkout and manual-payment
//! flows resolve prices from the immutable [`catalog::PackageCatalog`].

pub mod catalog;
pub mod checkout;
pub mod error;
pub mod gateway;
pub mod ledger;
pub mod manual;
pub mod model;
pub mod reconcile;

pub use catalog::{Package, PackageCatalog};
pub use checkout::{Checkout, CheckoutRequest};
pub use error::{PaymentError, Result};
pub use gateway::{GatewayAdapter, Intent, IntentRequest, RemoteStatus, WebhookSignal};
pub use ledger::{
    ManualLedger, MemoryManualLedger, MemoryTransactionLedger, StatusUpdate, TransactionLedger,
    Verdict,
};
pub use manual::{
    BankDetails, ManualPaymentRecord, ManualPaymentRequest, ManualPaymentStatus, ManualPayments,
    PaymentMethod, UpiDetails,
};
pub use model::{Currency, Gateway, Transaction, TransactionStatus, TxKey, to_minor_units};
pub use reconcile::{Confirmation, Reconciler, StatusView};
