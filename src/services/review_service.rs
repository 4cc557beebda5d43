//! Reviews de reservas completadas
//!
//! Solo el renter de la reserva, solo una vez y solo cuando está COMPLETED.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::models::booking::BookingStatus;
use crate::models::principal::Principal;
use crate::models::review::{CreateReviewRequest, MerchantReviews, NewReview, Review};
use crate::repositories::{BookingRepository, Repositories, ReviewRepository};
use crate::services::authorization_service::{self, Action, Resource};
use crate::utils::errors::{not_found_error, AppError, AppResult};

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

pub struct ReviewService {
    bookings: Arc<dyn BookingRepository>,
    reviews: Arc<dyn ReviewRepository>,
}

impl ReviewService {
    pub fn new(repositories: &Repositories) -> Self {
        Self {
            bookings: repositories.bookings.clone(),
            reviews: repositories.reviews.clone(),
        }
    }

    pub async fn submit_review(
        &self,
        principal: &Principal,
        request: CreateReviewRequest,
        now: DateTime<Utc>,
    ) -> AppResult<Review> {
        let booking = self
            .bookings
            .get_booking(request.booking_id)
            .await?
            .ok_or_else(|| not_found_error("Booking", &request.booking_id))?;

        authorization_service::require(principal, Action::CreateReview, &Resource::from(&booking))?;

        if booking.status != BookingStatus::Completed {
            return Err(AppError::BookingNotCompleted);
        }

        if self.reviews.get_review_by_booking(booking.id).await?.is_some() {
            return Err(AppError::DuplicateReview);
        }

        if !(MIN_RATING..=MAX_RATING).contains(&request.rating) {
            return Err(AppError::InvalidRating(request.rating));
        }
        request.validate()?;

        // La unicidad definitiva la garantiza el repositorio
        let review = self
            .reviews
            .create_review(NewReview {
                booking_id: booking.id,
                renter_id: booking.renter_id,
                merchant_id: booking.merchant_id,
                rating: request.rating,
                comment: request
                    .comment
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty()),
                created_at: now,
            })
            .await?;

        info!("⭐ Review {} ({}) para el merchant {}", review.id, review.rating, review.merchant_id);

        Ok(review)
    }

    /// Reviews públicas de un merchant, más recientes primero
    pub async fn get_merchant_reviews(&self, merchant_id: Uuid) -> AppResult<MerchantReviews> {
        let reviews = self.reviews.list_reviews_for_merchant(merchant_id).await?;
        Ok(MerchantReviews::new(merchant_id, reviews))
    }
}
