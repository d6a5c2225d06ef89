//! billing-reconciler entry point.
//!
//! Loads configuration, wires adapters into the reconciliation pipeline and
//! serves the webhook endpoint until Ctrl-C.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use secrecy::ExposeSecret;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use billing_reconciler::adapters::directory::{
    InMemoryUserDirectory, PostgresUserDirectory, MIGRATOR,
};
use billing_reconciler::adapters::http::{app_router, TrustGate, WebhookAppState};
use billing_reconciler::adapters::notifier::{LoggingNotifier, ResendNotifier};
use billing_reconciler::adapters::stripe::{StripeConfig, StripeSubscriptionSource};
use billing_reconciler::adapters::{
    Acknowledger, InMemoryWebhookEventRepository, QueueConfig, ReconciliationQueue,
};
use billing_reconciler::application::{billing_router, ReconciliationEngine};
use billing_reconciler::config::{AppConfig, ServerConfig};
use billing_reconciler::domain::billing::{WebhookProcessor, WebhookVerifier};
use billing_reconciler::ports::{Notifier, UserDirectory, WebhookEventRepository};

/// Days processed-event records are kept.
const LEDGER_RETENTION_DAYS: i64 = 7;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config.server);
    config.validate().context("invalid configuration")?;

    let directory = build_directory(&config).await?;
    let notifier = build_notifier(&config)?;
    let source = StripeSubscriptionSource::new(
        StripeConfig::new(config.payment.stripe_api_key.clone())
            .with_base_url(config.payment.api_base_url.clone())
            .with_request_timeout(config.reconciliation.snapshot_timeout()),
    )?;

    let engine = Arc::new(
        ReconciliationEngine::new(directory, notifier, Arc::new(source))
            .with_grace_period(config.reconciliation.grace_period())
            .with_snapshot_timeout(config.reconciliation.snapshot_timeout()),
    );

    let ledger = Arc::new(InMemoryWebhookEventRepository::new());
    let processor = Arc::new(
        WebhookProcessor::new(billing_router(engine), ledger.clone())
            .with_retry_policy(config.reconciliation.retry_policy()),
    );
    let (queue, workers) = ReconciliationQueue::start(
        processor,
        QueueConfig::default()
            .with_workers(config.reconciliation.workers)
            .with_capacity(config.reconciliation.queue_capacity),
    );

    let allow_list = config.webhook.allow_list()?;
    info!(addresses = allow_list.len(), "Webhook origin allow-list loaded");
    let gate = TrustGate::new(
        allow_list,
        WebhookVerifier::new(config.payment.stripe_webhook_secret.clone())
            .with_tolerance_secs(config.webhook.signature_tolerance_secs),
    )
    .with_forwarded_headers(config.webhook.trust_forwarded_headers)
    .with_max_body_bytes(config.webhook.max_body_bytes)
    .with_signature_header(config.webhook.signature_header_name()?);

    let state = WebhookAppState::new(gate, Acknowledger::new(queue, ledger.clone()));
    let app = app_router(state, config.server.request_timeout());

    let pruner = spawn_ledger_pruning(ledger);

    let addr = config.server.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("billing-reconciler listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server crashed")?;

    pruner.abort();
    info!("Server stopped, draining reconciliation workers");
    for worker in workers {
        if let Err(err) = worker.await {
            warn!(error = %err, "Reconciliation worker ended abnormally");
        }
    }
    info!("Shutdown complete");

    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&server.log_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if server.json_logs() {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn build_directory(config: &AppConfig) -> anyhow::Result<Arc<dyn UserDirectory>> {
    let Some(database) = &config.database else {
        warn!("No database configured, accounts are kept in memory");
        return Ok(Arc::new(InMemoryUserDirectory::new()));
    };

    let pool = database
        .pool_options()
        .connect(database.url.expose_secret())
        .await
        .context("failed to connect to database")?;

    if database.run_migrations {
        MIGRATOR
            .run(&pool)
            .await
            .context("failed to run migrations")?;
        info!("Database migrations applied");
    }

    Ok(Arc::new(PostgresUserDirectory::new(pool)))
}

fn build_notifier(config: &AppConfig) -> anyhow::Result<Arc<dyn Notifier>> {
    match &config.email {
        Some(email) => Ok(Arc::new(ResendNotifier::new(
            email.resend_api_key.clone(),
            email.from.clone(),
        )?)),
        None => {
            warn!("No email provider configured, credential deliveries are only logged");
            Ok(Arc::new(LoggingNotifier::new()))
        }
    }
}

/// Prune processed-event records past retention, hourly.
fn spawn_ledger_pruning(ledger: Arc<InMemoryWebhookEventRepository>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(3600));
        loop {
            interval.tick().await;
            let cutoff = chrono::Utc::now() - chrono::Duration::days(LEDGER_RETENTION_DAYS);
            match ledger.delete_before(cutoff).await {
                Ok(0) => {}
                Ok(deleted) => info!(deleted, "Pruned processed-event records"),
                Err(err) => warn!(error = %err, "Failed to prune processed-event records"),
            }
        }
    })
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
