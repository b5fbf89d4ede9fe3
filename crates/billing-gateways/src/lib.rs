//! # billing-gateways
//!
//! Gateway adapters implementing [`billing_core::GatewayAdapter`].
//!
//! ## Stripe Checkout (Hosted)
//!
//! **Flow:** Your site → Redirect to Stripe's hosted page → Redirect back
//!
//! ```text
//! ┌─────────────┐     ┌─────────────────┐     ┌─────────────┐
//! │  Your Site  │────▶│  Stripe Hosted  │────▶│  Your Site  │
//! │  (pricing)  │     │  Checkout Page  │     │  (success)  │
//! └─────────────┘     └─────────────────┘     └─────────────┘
//! ```
//!
//! Stripe handles the payment page entirely; we create the session with
//! the server-resolved amount and redirect the buyer to it.
//!
//! ## Razorpay Orders (In-page)
//!
//! **Flow:** Order created server-side, checkout widget opens in-page
//!
//! ```text
//! ┌────────────────────────────────────────┐
//! │            Your Pricing Page            │
//! │  ┌────────────────────────────────┐    │
//! │  │   Razorpay Checkout (widget)   │    │
//! │  │   UPI / card / netbanking      │    │
//! │  └────────────────────────────────┘    │
//! └────────────────────────────────────────┘
//! ```
//!
//! The widget reports a signature triple back to the client, which the
//! server re-verifies (HMAC-SHA256) before crediting anything. Webhooks
//! arrive independently and are verified the same way.

mod checkout;
mod razorpay;

pub use checkout::StripeGateway;
pub use razorpay::RazorpayGateway;
