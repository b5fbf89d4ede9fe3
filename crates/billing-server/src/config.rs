//! Environment Configuration
//!
//! Everything comes from the environment (or `.env` via dotenvy). Only
//! the document store is mandatory; each gateway and the manual-transfer
//! details are optional and their endpoints degrade to 503 when absent.

use billing_core::{BankDetails, PaymentError, Result, UpiDetails};

#[derive(Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub db_name: String,
}

#[derive(Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    pub webhook_secret: String,
}

#[derive(Clone)]
pub struct RazorpayConfig {
    pub key_id: String,
    pub key_secret: String,
    /// Without it, webhooks are acknowledged but never applied
    pub webhook_secret: Option<String>,
}

#[derive(Clone)]
pub struct Config {
    pub bind_addr: String,
    pub database: DatabaseConfig,
    pub stripe: Option<StripeConfig>,
    pub razorpay: Option<RazorpayConfig>,
    pub bank: Option<BankDetails>,
    pub upi: Option<UpiDetails>,
}

fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn require(name: &str) -> Result<String> {
    var(name).ok_or_else(|| PaymentError::Config(format!("{name} not set")))
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let database = DatabaseConfig {
            url: require("MONGO_URL")?,
            db_name: var("DB_NAME").unwrap_or_else(|| "scribe".into()),
        };

        let stripe = match (var("STRIPE_SECRET_KEY"), var("STRIPE_WEBHOOK_SECRET")) {
            (Some(secret_key), Some(webhook_secret)) => {
                Some(StripeConfig { secret_key, webhook_secret })
            }
            _ => None,
        };

        let razorpay = match (var("RAZORPAY_KEY_ID"), var("RAZORPAY_KEY_SECRET")) {
            (Some(key_id), Some(key_secret)) => Some(RazorpayConfig {
                key_id,
                key_secret,
                webhook_secret: var("RAZORPAY_WEBHOOK_SECRET"),
            }),
            _ => None,
        };

        let bank = match (
            var("BANK_ACCOUNT_NAME"),
            var("BANK_ACCOUNT_NUMBER"),
            var("BANK_IFSC_CODE"),
            var("BANK_NAME"),
        ) {
            (Some(account_name), Some(account_number), Some(ifsc_code), Some(bank_name)) => {
                Some(BankDetails {
                    account_name,
                    account_number,
                    ifsc_code,
                    bank_name,
                    branch: var("BANK_BRANCH").unwrap_or_default(),
                    account_type: var("BANK_ACCOUNT_TYPE")
                        .unwrap_or_else(|| "Savings Account".into()),
                })
            }
            _ => None,
        };

        let upi = match (var("UPI_ID"), var("UPI_NAME")) {
            (Some(upi_id), Some(upi_name)) => Some(UpiDetails {
                upi_id,
                upi_name,
                qr_code_url: var("UPI_QR_CODE_URL"),
            }),
            _ => None,
        };

        Ok(Self {
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".into()),
            database,
            stripe,
            razorpay,
            bank,
            upi,
        })
    }
}
