//! HTTP surface: router, shared state and request DTOs.

use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use crate::services::{DesignService, OrderService, PaymentService};

pub mod auth;
pub mod error;
pub mod extract;
mod handlers;

pub use auth::AuthUser;

#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<OrderService>,
    pub payments: Arc<PaymentService>,
    pub designs: Arc<DesignService>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "atelier-commerce"})) }))
        .route("/api/v1/orders", get(handlers::list_orders).post(handlers::create_order))
        .route("/api/v1/orders/:id", get(handlers::get_order))
        .route("/api/v1/payments/snap", post(handlers::create_snap_transaction))
        .route("/api/v1/payments/webhook", post(handlers::handle_webhook))
        .route("/api/v1/designs", get(handlers::list_designs).post(handlers::save_design))
        .route("/api/v1/designs/:code", get(handlers::get_design).put(handlers::update_design).delete(handlers::delete_design))
        .route("/api/v1/shared-designs", post(handlers::share_design))
        .route("/api/v1/shared-designs/:code", get(handlers::get_shared_design))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
