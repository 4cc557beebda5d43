use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::get,
    Extension, Json, Router,
};
use chrono::Utc;
use uuid::Uuid;

use crate::dto::ApiResponse;
use crate::middleware::auth::auth_middleware;
use crate::models::message::{CreateMessageRequest, Message};
use crate::models::principal::Principal;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_message_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/:booking_id", get(list_messages).post(send_message))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

async fn list_messages(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<Message>>>, AppError> {
    let messages = state.conversations.list_messages(&principal, booking_id).await?;
    Ok(Json(ApiResponse::success(messages)))
}

async fn send_message(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(booking_id): Path<Uuid>,
    Json(request): Json<CreateMessageRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Message>>), AppError> {
    let message = state
        .conversations
        .send_message(&principal, booking_id, request, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(message))))
}
