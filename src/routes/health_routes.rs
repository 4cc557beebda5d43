use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::state::AppState;

pub fn create_health_router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "vehicle-rental-api",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.environment,
        "storage": format!("{:?}", state.config.storage).to_lowercase(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
