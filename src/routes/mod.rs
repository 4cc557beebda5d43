//! Rutas HTTP
//!
//! Cada recurso expone su propio router; las rutas protegidas resuelven el
//! principal con `auth_middleware` antes de llegar al handler.

pub mod booking_routes;
pub mod health_routes;
pub mod message_routes;
pub mod review_routes;
pub mod user_routes;
pub mod vehicle_routes;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::middleware::cors::{cors_middleware, cors_middleware_with_origins};
use crate::state::AppState;

/// Router completo de la API
pub fn create_router(state: AppState) -> Router {
    let cors = if state.config.cors_origins.is_empty() && !state.config.is_production() {
        cors_middleware()
    } else {
        cors_middleware_with_origins(&state.config.cors_origins)
    };

    Router::new()
        .merge(health_routes::create_health_router())
        .nest("/api/vehicles", vehicle_routes::create_vehicle_router(state.clone()))
        .nest("/api/bookings", booking_routes::create_booking_router(state.clone()))
        .nest("/api/messages", message_routes::create_message_router(state.clone()))
        .nest("/api/reviews", review_routes::create_review_router(state.clone()))
        .nest("/api/users", user_routes::create_user_router(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
