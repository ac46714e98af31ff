//! API 层

pub mod auth;
pub mod middleware;
pub mod payments;
pub mod reservations;
pub mod salons;
pub mod state;

pub use state::AppState;

use axum::Router;
use axum::extract::State;
use axum::http::HeaderValue;
use axum::routing::get;
use axum::{Json, response::IntoResponse};
use chrono::Utc;
use manikura_common::{AggregatedHealthResult, BaseHealthResult};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

/// 组装路由
pub fn build_router(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/metrics", get(render_metrics))
        .nest("/api/auth", auth::routes())
        .nest("/api/salons", salons::routes())
        .nest("/api/reservations", reservations::routes())
        .nest("/api/payments", payments::routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(allowed_origins))
        .with_state(state)
}

/// 按配置构建 CORS 层（仅放行配置的来源）
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

#[derive(Debug, Serialize)]
struct RootResponse {
    message: String,
}

async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "API Manikura - Réservez votre manucure facilement !".to_string(),
    })
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    timestamp: chrono::DateTime<Utc>,
    components: Vec<manikura_common::ComponentHealth>,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let mut result = AggregatedHealthResult::new();

    let started = std::time::Instant::now();
    match manikura_adapter_postgres::check_connection(&state.pool).await {
        Ok(()) => result.add_component(
            "postgres",
            BaseHealthResult::healthy(started.elapsed().as_millis() as u64),
        ),
        Err(e) => result.add_component("postgres", BaseHealthResult::unhealthy(e.to_string())),
    }

    Json(HealthResponse {
        status: if result.healthy {
            "healthy".to_string()
        } else {
            "unhealthy".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        components: result.components,
    })
}

async fn render_metrics(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => handle.render(),
        None => String::new(),
    }
}
