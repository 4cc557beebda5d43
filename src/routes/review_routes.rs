use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use uuid::Uuid;

use crate::dto::ApiResponse;
use crate::middleware::auth::auth_middleware;
use crate::models::principal::Principal;
use crate::models::review::{CreateReviewRequest, MerchantReviews, Review};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_review_router(state: AppState) -> Router<AppState> {
    let public = Router::new().route("/merchant/:merchant_id", get(get_merchant_reviews));

    let protected = Router::new()
        .route("/", post(create_review))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    public.merge(protected)
}

async fn create_review(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Review>>), AppError> {
    let review = state.reviews.submit_review(&principal, request, Utc::now()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(review, "Review publicada")),
    ))
}

async fn get_merchant_reviews(
    State(state): State<AppState>,
    Path(merchant_id): Path<Uuid>,
) -> Result<Json<ApiResponse<MerchantReviews>>, AppError> {
    let reviews = state.reviews.get_merchant_reviews(merchant_id).await?;
    Ok(Json(ApiResponse::success(reviews)))
}
