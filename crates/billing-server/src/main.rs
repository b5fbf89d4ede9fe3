//! scribe-billing HTTP Server
//!
//! Axum-based server exposing checkout creation, payment status polling,
//! gateway webhooks, and the manual bank-transfer/UPI flow.

mod config;
mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use billing_core::{Checkout, ManualLedger, ManualPayments, PackageCatalog, Reconciler, TransactionLedger};
use billing_gateways::{RazorpayGateway, StripeGateway};
use billing_store::{MongoManualLedger, MongoTransactionLedger};

use crate::config::Config;
use crate::handlers::health_check;
use crate::handlers::manual::{
    bank_details, manual_payment_status, pending_manual_payments, reject_manual_payment,
    submit_manual_payment, upi_details, verify_manual_payment,
};
use crate::handlers::payments::{
    create_razorpay_order, create_stripe_checkout, get_packages, get_transaction, razorpay_status,
    razorpay_webhook, stripe_status, stripe_webhook, verify_razorpay_payment,
};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    // Document store
    let db = billing_store::connect(&config.database.url, &config.database.db_name).await?;
    tracing::info!(db = %config.database.db_name, "✓ Document store configured");

    let catalog = Arc::new(PackageCatalog::builtin());
    let transactions: Arc<dyn TransactionLedger> = Arc::new(MongoTransactionLedger::new(&db));
    let manual_ledger: Arc<dyn ManualLedger> = Arc::new(MongoManualLedger::new(&db));

    // Gateways are optional; their endpoints answer 503 when absent
    let stripe = config
        .stripe
        .as_ref()
        .map(|c| Arc::new(StripeGateway::new(&c.secret_key, &c.webhook_secret)));
    if stripe.is_some() {
        tracing::info!("✓ Stripe configured");
    } else {
        tracing::warn!("⚠ Stripe not configured - card checkout disabled");
        tracing::warn!("  Set STRIPE_SECRET_KEY and STRIPE_WEBHOOK_SECRET in .env");
    }

    let razorpay = config
        .razorpay
        .as_ref()
        .map(|c| Arc::new(RazorpayGateway::new(&c.key_id, &c.key_secret, c.webhook_secret.clone())));
    if let Some(rc) = &config.razorpay {
        tracing::info!("✓ Razorpay configured");
        if rc.webhook_secret.is_none() {
            tracing::warn!("⚠ RAZORPAY_WEBHOOK_SECRET not set - webhooks will be ignored");
        }
    } else {
        tracing::warn!("⚠ Razorpay not configured - UPI/INR checkout disabled");
        tracing::warn!("  Set RAZORPAY_KEY_ID and RAZORPAY_KEY_SECRET in .env");
    }

    // Build application state
    let state = AppState {
        catalog: catalog.clone(),
        checkout: Arc::new(Checkout::new(catalog.clone(), transactions.clone())),
        reconciler: Arc::new(Reconciler::new(transactions.clone())),
        transactions,
        manual: Arc::new(ManualPayments::new(catalog, manual_ledger)),
        stripe,
        razorpay,
        bank: config.bank.clone().map(Arc::new),
        upi: config.upi.clone().map(Arc::new),
    };

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        .route("/health", get(health_check))
        // Gateway payments
        .route("/api/payments/packages", get(get_packages))
        .route("/api/payments/stripe/create-checkout", post(create_stripe_checkout))
        .route("/api/payments/stripe/status/{session_id}", get(stripe_status))
        .route("/api/payments/stripe/webhook", post(stripe_webhook))
        .route("/api/payments/razorpay/create-order", post(create_razorpay_order))
        .route("/api/payments/razorpay/status/{order_id}", get(razorpay_status))
        .route("/api/payments/razorpay/verify", post(verify_razorpay_payment))
        .route("/api/payments/razorpay/webhook", post(razorpay_webhook))
        .route("/api/payments/transaction/{transaction_id}", get(get_transaction))
        // Manual payments
        .route("/api/manual-payments/bank-details", get(bank_details))
        .route("/api/manual-payments/upi-details", get(upi_details))
        .route("/api/manual-payments/submit", post(submit_manual_payment))
        .route("/api/manual-payments/status/{order_id}", get(manual_payment_status))
        .route("/api/manual-payments/pending", get(pending_manual_payments))
        .route("/api/manual-payments/verify/{order_id}", post(verify_manual_payment))
        .route("/api/manual-payments/reject/{order_id}", post(reject_manual_payment))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("🚀 scribe-billing server running on http://{}", config.bind_addr);
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                                  - Health check");
    tracing::info!("  GET  /api/payments/packages                   - Pricing catalog");
    tracing::info!("  POST /api/payments/stripe/create-checkout     - Hosted card checkout");
    tracing::info!("  GET  /api/payments/stripe/status/{{id}}         - Poll session status");
    tracing::info!("  POST /api/payments/razorpay/create-order      - In-page UPI/INR order");
    tracing::info!("  POST /api/payments/razorpay/verify            - Verify payment signature");
    tracing::info!("  POST /api/manual-payments/submit              - Manual transfer evidence");
    tracing::info!("  GET  /api/manual-payments/pending             - Admin verification queue");
    tracing::info!("");

    axum::serve(listener, app).await?;

    Ok(())
}
