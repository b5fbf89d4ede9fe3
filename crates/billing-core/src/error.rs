//! Billing Error Types

use rust_decimal::Decimal;
use thiserror::Error;

use crate::model::{Currency, Gateway};

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Billing-related errors
#[derive(Error, Debug)]
pub enum PaymentError {
    /// Unknown package identifier
    #[error("invalid package: {0}")]
    InvalidPackage(String),

    /// Package has no fixed price and is sold through sales only
    #[error("package {0} requires contacting sales")]
    UnsupportedTier(String),

    /// Package has no price in the requested currency
    #[error("package {package} is not available in {currency}")]
    UnsupportedCurrency { package: String, currency: Currency },

    /// Submitted amount does not match the catalog price
    #[error("amount mismatch: expected {expected}, received {received}")]
    AmountMismatch { expected: Decimal, received: Decimal },

    /// Gateway credentials are absent from the environment
    #[error("{0} gateway is not configured")]
    GatewayNotConfigured(Gateway),

    /// Payment or webhook signature failed verification
    #[error("invalid payment signature")]
    InvalidSignature,

    /// No transaction matches the given identifier
    #[error("transaction not found: {0}")]
    TransactionNotFound(String),

    /// Manual payment missing, or already verified/rejected
    #[error("payment {0} not found or already finalized")]
    NotFoundOrAlreadyFinalized(String),

    /// Upstream gateway call failed
    #[error("gateway error: {0}")]
    Gateway(String),

    /// Ledger store failure
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl PaymentError {
    /// True for errors caused by the caller's input rather than this system
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PaymentError::InvalidPackage(_)
                | PaymentError::UnsupportedTier(_)
                | PaymentError::UnsupportedCurrency { .. }
                | PaymentError::AmountMismatch { .. }
                | PaymentError::InvalidSignature
                | PaymentError::TransactionNotFound(_)
                | PaymentError::NotFoundOrAlreadyFinalized(_)
        )
    }

    /// Message safe to surface to callers; upstream failures stay generic
    pub fn user_message(&self) -> String {
        match self {
            PaymentError::Gateway(_) => "Payment gateway request failed. Please try again.".into(),
            PaymentError::Storage(_) => "An internal error occurred processing your request.".into(),
            PaymentError::Config(_) => "Service configuration error.".into(),
            other => other.to_string(),
        }
    }
}
