//! Atelier Commerce - custom furniture order and payment service

use anyhow::Result;
use atelier_commerce::clients::{KomerceRateClient, SnapClient};
use atelier_commerce::config::AppConfig;
use atelier_commerce::http::{self, AppState};
use atelier_commerce::publisher::EventPublisher;
use atelier_commerce::services::{DeliveryFeeResolver, DesignService, OrderService, PaymentService, PricingEngine};
use atelier_commerce::store::PgStore;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();
    let config = AppConfig::from_env()?;

    let db = PgPoolOptions::new().max_connections(10).connect(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&db).await?;
    let store = Arc::new(PgStore::new(db));
    let events = EventPublisher::connect(config.nats_url.as_deref()).await;

    let rates = Arc::new(KomerceRateClient::new(config.delivery.cost_url.clone(), config.upstream_timeout)?);
    let gateway = Arc::new(SnapClient::new(config.gateway.clone(), config.upstream_timeout)?);
    if config.delivery.api_key.is_none() {
        tracing::warn!("RAJAONGKIR_API_COST_KEY is not set, delivery orders will be rejected");
    }

    let orders = OrderService::new(
        store.clone(), store.clone(), store.clone(),
        PricingEngine::new(store.clone()),
        DeliveryFeeResolver::new(rates, config.delivery.clone()),
        events.clone(),
    );
    let payments = PaymentService::new(store.clone(), store.clone(), store.clone(), gateway, &config.gateway, events.clone());
    let designs = DesignService::new(store.clone(), store.clone(), store, events);
    let state = AppState { orders: Arc::new(orders), payments: Arc::new(payments), designs: Arc::new(designs) };

    let app = http::router(state);
    tracing::info!("Atelier Commerce listening on 0.0.0.0:{}", config.port);
    axum::serve(tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?, app).await?;
    Ok(())
}
