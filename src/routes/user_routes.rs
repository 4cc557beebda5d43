use axum::{
    extract::{Path, State},
    middleware,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use chrono::Utc;
use uuid::Uuid;

use crate::dto::ApiResponse;
use crate::middleware::auth::auth_middleware;
use crate::models::principal::Principal;
use crate::models::user::{ReviewLicenseRequest, UploadLicenseRequest, UserResponse};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_user_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me))
        .route("/license", post(upload_license))
        .route("/licenses/pending", get(list_pending_licenses))
        .route("/:id/license", patch(review_license))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

async fn get_me(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let user = state.licenses.get_profile(&principal).await?;
    Ok(Json(ApiResponse::success(user.into())))
}

async fn upload_license(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<UploadLicenseRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let user = state.licenses.upload_license(&principal, request, Utc::now()).await?;
    Ok(Json(ApiResponse::success_with_message(
        user.into(),
        "Licencia enviada, pendiente de revisión",
    )))
}

async fn list_pending_licenses(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<ApiResponse<Vec<UserResponse>>>, AppError> {
    let users = state.licenses.list_pending_licenses(&principal).await?;
    Ok(Json(ApiResponse::success(users.into_iter().map(UserResponse::from).collect())))
}

async fn review_license(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(request): Json<ReviewLicenseRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let user = state.licenses.review_license(&principal, id, request, Utc::now()).await?;
    Ok(Json(ApiResponse::success(user.into())))
}
