//! Modelo de Review
//!
//! Una review por reserva completada, escrita por el renter. `merchant_id` y
//! `renter_id` se copian de la reserva al crearla.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Review - mapea a la tabla reviews
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Review {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub renter_id: Uuid,
    pub merchant_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub booking_id: Uuid,
    pub renter_id: Uuid,
    pub merchant_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewReview {
    pub fn into_review(self, id: Uuid) -> Review {
        Review {
            id,
            booking_id: self.booking_id,
            renter_id: self.renter_id,
            merchant_id: self.merchant_id,
            rating: self.rating,
            comment: self.comment,
            created_at: self.created_at,
        }
    }
}

/// Request para crear una review
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateReviewRequest {
    pub booking_id: Uuid,
    pub rating: i32,
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
}

/// Reviews públicas de un merchant con su media
#[derive(Debug, Clone, Serialize)]
pub struct MerchantReviews {
    pub merchant_id: Uuid,
    pub count: usize,
    pub average_rating: Option<f64>,
    pub reviews: Vec<Review>,
}

impl MerchantReviews {
    pub fn new(merchant_id: Uuid, reviews: Vec<Review>) -> Self {
        let count = reviews.len();
        let average_rating = if count == 0 {
            None
        } else {
            let total: i64 = reviews.iter().map(|r| r.rating as i64).sum();
            Some(total as f64 / count as f64)
        };

        Self { merchant_id, count, average_rating, reviews }
    }
}
