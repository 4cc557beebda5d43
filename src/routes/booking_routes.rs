use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::dto::ApiResponse;
use crate::middleware::auth::auth_middleware;
use crate::models::booking::{Booking, CreateBookingRequest, RespondBookingRequest, UpdateBookingNotesRequest};
use crate::models::principal::Principal;
use crate::services::MerchantDecision;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_booking_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(create_booking).get(list_my_bookings))
        .route("/:id", get(get_booking))
        .route("/:id/accept", patch(accept_booking))
        .route("/:id/reject", patch(reject_booking))
        .route("/:id/complete", patch(complete_booking))
        .route("/:id/cancel", patch(cancel_booking))
        .route("/:id/notes", patch(update_notes))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

type BookingResponse = Result<Json<ApiResponse<Booking>>, AppError>;

async fn create_booking(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Booking>>), AppError> {
    let booking = state.bookings.request_booking(&principal, request, Utc::now()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(booking, "Reserva solicitada")),
    ))
}

async fn list_my_bookings(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<ApiResponse<Vec<Booking>>>, AppError> {
    let bookings = state.bookings.list_my_bookings(&principal).await?;
    Ok(Json(ApiResponse::success(bookings)))
}

async fn get_booking(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> BookingResponse {
    let booking = state.bookings.get_booking(&principal, id).await?;
    Ok(Json(ApiResponse::success(booking)))
}

async fn accept_booking(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> BookingResponse {
    respond(state, principal, id, MerchantDecision::Accept, body).await
}

async fn reject_booking(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> BookingResponse {
    respond(state, principal, id, MerchantDecision::Reject, body).await
}

async fn respond(
    state: AppState,
    principal: Principal,
    id: Uuid,
    decision: MerchantDecision,
    body: Bytes,
) -> BookingResponse {
    let request = parse_respond_body(&body)?;
    request.validate()?;

    let booking = state
        .bookings
        .respond_to_booking(&principal, id, decision, request.merchant_notes, Utc::now())
        .await?;
    Ok(Json(ApiResponse::success(booking)))
}

async fn complete_booking(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> BookingResponse {
    let booking = state.bookings.complete_booking(&principal, id, Utc::now()).await?;
    Ok(Json(ApiResponse::success(booking)))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> BookingResponse {
    let booking = state.bookings.cancel_booking(&principal, id, Utc::now()).await?;
    Ok(Json(ApiResponse::success(booking)))
}

async fn update_notes(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateBookingNotesRequest>,
) -> BookingResponse {
    let booking = state
        .bookings
        .update_booking_notes(&principal, id, request, Utc::now())
        .await?;
    Ok(Json(ApiResponse::success(booking)))
}

/// El body de accept/reject es opcional, pero si llega tiene que ser válido
fn parse_respond_body(body: &[u8]) -> Result<RespondBookingRequest, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(RespondBookingRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e)))
}
