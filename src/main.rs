use actix::prelude::*;
use actix_web::{web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod actors;
mod alerts;
mod config;
mod domain;
mod http;
mod metrics;
mod notifications;
mod store;
mod utils;

#[cfg(test)]
mod test_support;

use actors::NotificationActor;
use alerts::{AlertCooldownTracker, CooldownStore, InMemoryCooldownStore, LowStockAlerter, RedisCooldownStore};
use crate::config::{AppConfig, DispatchMode};
use domain::order::OrderService;
use http::{AppState, HeaderAuthenticator};
use notifications::{
    EmailTransport, FailoverEmailTransport, HttpApiEmailTransport, InlineSink, NotificationDispatcher,
    NotificationSink, RelayTransport, SmtpRelayTransport, TemplateCatalog, TemplateMessagingClient,
};
use store::{PgOrderStore, PgReferenceData};
use utils::{ProbeGate, ProbeGateConfig};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Default to INFO level, override with RUST_LOG
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,order_notify=debug"))
        )
        .init();

    tracing::info!("🚀 Starting order notification service");

    let config = AppConfig::load()?;

    // === 1. Metrics ===
    let metrics = Arc::new(metrics::Metrics::new()?);
    tracing::info!("📊 Metrics registry created with {} metrics", metrics.registry().gather().len());

    // === 2. Database ===
    tracing::info!("Connecting to PostgreSQL...");
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;
    store::migrate(&pool).await?;
    tracing::info!("✅ Database ready");

    let orders_store = Arc::new(PgOrderStore::new(pool.clone()));
    let reference = Arc::new(PgReferenceData::new(pool));

    // === 3. Email transports ===
    let relay: Option<Arc<dyn RelayTransport>> = match &config.email.smtp {
        Some(smtp) => match SmtpRelayTransport::connect(smtp, &config.email.from).await {
            Ok(relay) => Some(Arc::new(relay) as Arc<dyn RelayTransport>),
            Err(e) => {
                tracing::warn!(host = %smtp.host, error = %e, "SMTP relay unavailable at startup");
                None
            }
        },
        None => None,
    };
    let http_api = Arc::new(HttpApiEmailTransport::new(&config.email.http_api, config.email.from.clone())?);
    let email: Arc<dyn EmailTransport> = Arc::new(FailoverEmailTransport::new(
        relay,
        http_api,
        config.email.mode,
        ProbeGate::new(ProbeGateConfig { ttl: config.email.probe_cache_ttl() }),
        metrics.clone(),
    ));

    // === 4. Messaging ===
    let messaging = Arc::new(TemplateMessagingClient::new(&config.messaging)?);
    let templates = TemplateCatalog::new(config.messaging.templates.clone());

    // === 5. Cooldown store (shared when Redis is configured) ===
    let cooldown_store: Arc<dyn CooldownStore> = match &config.redis.url {
        Some(url) => Arc::new(RedisCooldownStore::connect(url, "order-notify").await?),
        None => {
            tracing::info!("No Redis configured, using in-process cooldown store");
            Arc::new(InMemoryCooldownStore::new())
        }
    };
    let tracker = AlertCooldownTracker::new(cooldown_store);

    // === 6. Dispatch ===
    let dispatcher = Arc::new(NotificationDispatcher::new(
        email.clone(),
        messaging,
        templates,
        metrics.clone(),
    ));
    let sink: Arc<dyn NotificationSink> = match config.dispatch.mode {
        DispatchMode::Queued => Arc::new(
            NotificationActor::new(
                dispatcher,
                tracker.clone(),
                config.dispatch.dedupe_window(),
                metrics.clone(),
            )
            .start(),
        ),
        DispatchMode::Inline => Arc::new(InlineSink::new(dispatcher)),
    };
    tracing::info!(mode = ?config.dispatch.mode, "Notification sink ready");

    // === 7. Services ===
    let orders = Arc::new(OrderService::new(
        orders_store,
        reference.clone(),
        reference.clone(),
        reference,
        sink,
        metrics.clone(),
    ));
    let alerter = Arc::new(LowStockAlerter::new(
        email,
        tracker,
        config.alerts.recipient.clone(),
        config.alerts.low_stock_window(),
        metrics.clone(),
    ));

    let state = web::Data::new(AppState {
        orders,
        alerts: alerter,
        auth: Arc::new(HeaderAuthenticator::default()),
    });
    let metrics_data = web::Data::new(metrics);

    // === 8. HTTP server ===
    let bind = (config.server.host.clone(), config.server.port);
    tracing::info!("🌐 Listening on {}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(metrics_data.clone())
            .configure(http::configure)
            .configure(metrics::configure)
    })
    .bind(bind)?
    .run()
    .await?;

    tracing::info!("👋 Server stopped");
    Ok(())
}
