//! Package Catalog
//!
//! Immutable table of purchasable packages and authoritative prices.
//! Amounts are FIXED server side - never accepted from clients.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{PaymentError, Result};
use crate::model::Currency;

/// A purchasable subscription package
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Package {
    pub id: String,

    /// Display name
    pub name: String,

    /// Price in USD, None means not sold in USD
    pub amount_usd: Option<Decimal>,

    /// Price in INR, None means not sold in INR
    pub amount_inr: Option<Decimal>,

    pub features: Vec<String>,
}

impl Package {
    pub fn price(&self, currency: Currency) -> Option<Decimal> {
        match currency {
            Currency::Usd => self.amount_usd,
            Currency::Inr => self.amount_inr,
        }
    }

    /// Packages with no fixed price in any currency are sold through
    /// sales contact only and must be rejected by automated checkout.
    pub fn is_sales_only(&self) -> bool {
        self.amount_usd.is_none() && self.amount_inr.is_none()
    }
}

/// Read-only package catalog, defined at process start
#[derive(Clone, Debug)]
pub struct PackageCatalog {
    packages: Vec<Package>,
}

impl Default for PackageCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PackageCatalog {
    pub fn new(packages: Vec<Package>) -> Self {
        Self { packages }
    }

    /// The standard pricing table
    pub fn builtin() -> Self {
        Self::new(vec![
            Package {
                id: "starter".into(),
                name: "Starter".into(),
                amount_usd: Some(dec!(29.00)),
                amount_inr: Some(dec!(2400.00)),
                features: vec![
                    "10,000 words/month".into(),
                    "5 AI tools".into(),
                    "Basic templates".into(),
                    "Email support".into(),
                ],
            },
            Package {
                id: "pro".into(),
                name: "Pro".into(),
                amount_usd: Some(dec!(79.00)),
                amount_inr: Some(dec!(6500.00)),
                features: vec![
                    "100,000 words/month".into(),
                    "20+ AI tools".into(),
                    "Priority support".into(),
                    "Team collaboration".into(),
                ],
            },
            Package {
                id: "enterprise".into(),
                name: "Enterprise".into(),
                amount_usd: None,
                amount_inr: None,
                features: vec![
                    "Unlimited words".into(),
                    "All features".into(),
                    "Dedicated support".into(),
                    "Custom AI training".into(),
                ],
            },
        ])
    }

    pub fn lookup(&self, package_id: &str) -> Option<&Package> {
        self.packages.iter().find(|p| p.id == package_id)
    }

    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    /// Resolve the authoritative checkout price for a package.
    ///
    /// Rejects unknown packages, sales-only tiers, and currencies the
    /// package is not priced in.
    pub fn checkout_price(&self, package_id: &str, currency: Currency) -> Result<(&Package, Decimal)> {
        let package = self
            .lookup(package_id)
            .ok_or_else(|| PaymentError::InvalidPackage(package_id.to_string()))?;

        if package.is_sales_only() {
            return Err(PaymentError::UnsupportedTier(package.id.clone()));
        }

        let amount = package.price(currency).ok_or(PaymentError::UnsupportedCurrency {
            package: package.id.clone(),
            currency,
        })?;

        Ok((package, amount))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let catalog = PackageCatalog::builtin();
        assert!(catalog.lookup("starter").is_some());
        assert!(catalog.lookup("pro").is_some());
        assert!(catalog.lookup("nope").is_none());
    }

    #[test]
    fn test_starter_inr_price() {
        let catalog = PackageCatalog::builtin();
        let (package, amount) = catalog.checkout_price("starter", Currency::Inr).unwrap();
        assert_eq!(package.name, "Starter");
        assert_eq!(amount, dec!(2400.00));
    }

    #[test]
    fn test_unknown_package_rejected() {
        let catalog = PackageCatalog::builtin();
        let err = catalog.checkout_price("platinum", Currency::Usd).unwrap_err();
        assert!(matches!(err, PaymentError::InvalidPackage(_)));
    }

    #[test]
    fn test_sales_only_tier_rejected() {
        let catalog = PackageCatalog::builtin();
        let err = catalog.checkout_price("enterprise", Currency::Usd).unwrap_err();
        assert!(matches!(err, PaymentError::UnsupportedTier(_)));
    }

    #[test]
    fn test_missing_currency_rejected() {
        let catalog = PackageCatalog::new(vec![Package {
            id: "inr-only".into(),
            name: "INR Only".into(),
            amount_usd: None,
            amount_inr: Some(dec!(100.00)),
            features: vec![],
        }]);
        let err = catalog.checkout_price("inr-only", Currency::Usd).unwrap_err();
        assert!(matches!(err, PaymentError::UnsupportedCurrency { .. }));
    }
}
