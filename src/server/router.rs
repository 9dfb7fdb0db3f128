//! Route table of the HTTP surface

use super::handlers::{self, AppState};
use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
};
use serde_json::{Value, json};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Largest accepted request body
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Build every route of the service
///
/// - POST /payments/sale, /payments/tokenize, /payments/refund, /payments/void
/// - GET /payments/lookup?transaction_id=...
/// - POST /payments/recurring/create
/// - PUT /payments/recurring/update/{subscription_id}
/// - DELETE /payments/recurring/cancel/{subscription_id}
/// - POST /plans/add, PUT /plans/update, DELETE /plans/cancel/{id}, GET /plans/list
/// - GET /health, GET /healthz
pub fn build_router(state: AppState) -> Router {
    health_routes()
        .merge(payment_routes(state.clone()))
        .merge(plan_routes(state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
}

fn payment_routes(state: AppState) -> Router {
    Router::new()
        .route("/payments/sale", post(handlers::sale))
        .route("/payments/tokenize", post(handlers::tokenize))
        .route("/payments/refund", post(handlers::refund))
        .route("/payments/void", post(handlers::void))
        .route("/payments/lookup", get(handlers::lookup))
        .route(
            "/payments/recurring/create",
            post(handlers::create_recurring),
        )
        .route(
            "/payments/recurring/update/{subscription_id}",
            put(handlers::update_recurring),
        )
        .route(
            "/payments/recurring/cancel/{subscription_id}",
            delete(handlers::cancel_recurring),
        )
        .with_state(state)
}

fn plan_routes(state: AppState) -> Router {
    Router::new()
        .route("/plans/add", post(handlers::add_plan))
        .route("/plans/update", put(handlers::update_plan))
        .route("/plans/cancel/{id}", delete(handlers::cancel_plan))
        .route("/plans/list", get(handlers::list_plans))
        .with_state(state)
}

fn health_routes() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "nmi-pay-rs",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
