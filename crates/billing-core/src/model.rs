//! Domain Models
//!
//! Core data types for payment transactions.
//! Uses `rust_decimal` for all monetary values - never use f64 for money!

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Supported settlement currencies
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[serde(alias = "usd")]
    Usd,
    #[serde(alias = "inr")]
    Inr,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Inr => "INR",
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Payment gateway tag
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gateway {
    Stripe,
    Razorpay,
}

impl Gateway {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gateway::Stripe => "stripe",
            Gateway::Razorpay => "razorpay",
        }
    }

    /// Build the ledger key for a gateway-assigned reference.
    ///
    /// Stripe assigns checkout-session ids, Razorpay assigns order ids; the
    /// ledger stores them in separate fields.
    pub fn key<'a>(&self, reference: &'a str) -> TxKey<'a> {
        match self {
            Gateway::Stripe => TxKey::Session(reference),
            Gateway::Razorpay => TxKey::Order(reference),
        }
    }
}

impl std::fmt::Display for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Transaction lifecycle status
///
/// `pending` may transition to any of the other states exactly once;
/// the rest are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Paid,
    Failed,
    Expired,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Paid => "paid",
            TransactionStatus::Failed => "failed",
            TransactionStatus::Expired => "expired",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Gateway-assigned key identifying a transaction in the ledger
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxKey<'a> {
    /// Stripe checkout-session id
    Session(&'a str),
    /// Razorpay order id
    Order(&'a str),
}

impl TxKey<'_> {
    pub fn reference(&self) -> &str {
        match self {
            TxKey::Session(s) | TxKey::Order(s) => s,
        }
    }
}

/// A payment attempt recorded in the ledger
///
/// One row per checkout/order creation. Amount and currency always come
/// from the package catalog, never from client input.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Transaction {
    /// Internal id
    pub id: String,

    /// Stripe checkout-session id (card checkout only)
    pub session_id: Option<String>,

    /// Razorpay order id (regional checkout only)
    pub order_id: Option<String>,

    /// Gateway payment id, set once a payment is captured
    pub payment_id: Option<String>,

    /// Purchased package
    pub package_id: String,

    /// Denormalized package display name
    pub package_name: String,

    /// Authoritative amount in major units
    pub amount: Decimal,

    pub currency: Currency,

    #[serde(rename = "payment_gateway")]
    pub gateway: Gateway,

    pub status: TransactionStatus,

    /// Last gateway-reported checkout state ("open", "complete", ...)
    pub session_state: Option<String>,

    pub user_email: Option<String>,

    pub metadata: HashMap<String, String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a pending transaction keyed by the gateway-assigned reference.
    ///
    /// Exactly one of session/order id is set, determined by the gateway.
    pub fn new(
        gateway: Gateway,
        reference: impl Into<String>,
        package_id: impl Into<String>,
        package_name: impl Into<String>,
        amount: Decimal,
        currency: Currency,
        user_email: Option<String>,
    ) -> Self {
        let reference = reference.into();
        let (session_id, order_id) = match gateway {
            Gateway::Stripe => (Some(reference), None),
            Gateway::Razorpay => (None, Some(reference)),
        };

        let package_id = package_id.into();
        let package_name = package_name.into();
        let mut metadata = HashMap::new();
        metadata.insert("package_id".to_string(), package_id.clone());
        metadata.insert("package_name".to_string(), package_name.clone());

        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            session_id,
            order_id,
            payment_id: None,
            package_id,
            package_name,
            amount,
            currency,
            gateway,
            status: TransactionStatus::Pending,
            session_state: None,
            user_email,
            metadata,
            created_at: now,
            updated_at: now,
        }
    }

    /// Ledger key for this transaction
    pub fn key(&self) -> TxKey<'_> {
        match self.gateway {
            Gateway::Stripe => TxKey::Session(self.session_id.as_deref().unwrap_or_default()),
            Gateway::Razorpay => TxKey::Order(self.order_id.as_deref().unwrap_or_default()),
        }
    }
}

/// Convert a major-unit amount to gateway minor units (cents, paise).
///
/// Returns None when the amount does not fit an i64 after scaling.
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    (amount * Decimal::from(100)).round().to_i64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_transaction_keyed_by_gateway() {
        let tx = Transaction::new(
            Gateway::Stripe,
            "cs_test_1",
            "starter",
            "Starter",
            dec!(29.00),
            Currency::Usd,
            None,
        );
        assert_eq!(tx.session_id.as_deref(), Some("cs_test_1"));
        assert!(tx.order_id.is_none());
        assert_eq!(tx.status, TransactionStatus::Pending);

        let tx = Transaction::new(
            Gateway::Razorpay,
            "order_1",
            "starter",
            "Starter",
            dec!(2400.00),
            Currency::Inr,
            None,
        );
        assert!(tx.session_id.is_none());
        assert_eq!(tx.order_id.as_deref(), Some("order_1"));
        assert_eq!(tx.key(), TxKey::Order("order_1"));
    }

    #[test]
    fn test_minor_units() {
        assert_eq!(to_minor_units(dec!(29.00)), Some(2900));
        assert_eq!(to_minor_units(dec!(2400.00)), Some(240_000));
        assert_eq!(to_minor_units(dec!(0.50)), Some(50));
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&TransactionStatus::Pending).unwrap();
        assert_eq!(json, "\"pending\"");
        assert!(TransactionStatus::Paid.is_terminal());
        assert!(!TransactionStatus::Pending.is_terminal());
    }

    #[test]
    fn test_currency_accepts_lowercase_input() {
        let c: Currency = serde_json::from_str("\"usd\"").unwrap();
        assert_eq!(c, Currency::Usd);
        assert_eq!(serde_json::to_string(&Currency::Inr).unwrap(), "\"INR\"");
    }
}
