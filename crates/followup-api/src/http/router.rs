//! Axum router configuration with middleware.
//!
//! All routes are under `/api/v1/`. CORS is pinned to the embed origin
//! (plus the marketing site when configured) because the widget runs
//! inside a CRM iframe, not on our own domain.

use axum::extract::State;
use axum::http::{HeaderValue, Method, header};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use followup_infra::config::Settings;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.settings);

    let api_routes = Router::new()
        // Widget session
        .route("/auth/iframe-login", post(handlers::auth::iframe_login))
        .route("/auth/refresh", get(handlers::auth::refresh))
        // Assistant
        .route("/chat/message", post(handlers::chat::ask))
        .route("/chat/history", get(handlers::chat::history))
        // CRM
        .route("/fub/note", post(handlers::note::create_note))
        .route("/fub/webhook", post(handlers::crm_webhook::fub_webhook))
        // Billing
        .route("/stripe/checkout", post(handlers::billing::create_checkout))
        .route("/stripe/portal", post(handlers::billing::create_portal))
        .route("/stripe/webhook", post(handlers::billing::stripe_webhook))
        // Dashboard
        .route("/stats", get(handlers::stats::get_stats));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/", get(service_info))
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS restricted to the configured browser origins.
fn cors_layer(settings: &Settings) -> CorsLayer {
    let mut origins: Vec<HeaderValue> = Vec::new();
    if let Ok(origin) = settings.frontend_embed_origin.parse() {
        origins.push(origin);
    }
    if let Some(marketing) = &settings.marketing_origin {
        if let Ok(origin) = marketing.parse() {
            origins.push(origin);
        }
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// GET / - Service identification for anyone poking at the root URL.
async fn service_info() -> Json<serde_json::Value> {
    Json(json!({
        "service": "followup-assistant",
        "version": env!("CARGO_PKG_VERSION"),
        "api": "/api/v1",
        "health": "/health",
    }))
}

/// GET /health - Liveness check including database reachability (no auth required).
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let database = match state.db_pool.ping().await {
        Ok(()) => "up",
        Err(e) => {
            tracing::error!(error = %e, "health check database ping failed");
            "down"
        }
    };

    Json(json!({
        "status": if database == "up" { "ok" } else { "degraded" },
        "database": database,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
