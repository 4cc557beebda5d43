use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::review::{NewReview, Review};
use crate::utils::errors::{AppError, AppResult};

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Falla con `DuplicateReview` si la reserva ya tiene review
    async fn create_review(&self, review: NewReview) -> AppResult<Review>;
    async fn get_review_by_booking(&self, booking_id: Uuid) -> AppResult<Option<Review>>;
    /// Reviews del merchant, más recientes primero
    async fn list_reviews_for_merchant(&self, merchant_id: Uuid) -> AppResult<Vec<Review>>;
}

pub struct PgReviewRepository {
    pool: PgPool,
}

impl PgReviewRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReviewRepository for PgReviewRepository {
    async fn create_review(&self, review: NewReview) -> AppResult<Review> {
        let review = review.into_review(Uuid::new_v4());

        sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews (id, booking_id, renter_id, merchant_id, rating, comment, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(review.id)
        .bind(review.booking_id)
        .bind(review.renter_id)
        .bind(review.merchant_id)
        .bind(review.rating)
        .bind(review.comment)
        .bind(review.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if AppError::is_unique_violation(&e) {
                AppError::DuplicateReview
            } else {
                AppError::from(e)
            }
        })
    }

    async fn get_review_by_booking(&self, booking_id: Uuid) -> AppResult<Option<Review>> {
        let review = sqlx::query_as::<_, Review>("SELECT * FROM reviews WHERE booking_id = $1")
            .bind(booking_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(review)
    }

    async fn list_reviews_for_merchant(&self, merchant_id: Uuid) -> AppResult<Vec<Review>> {
        let reviews = sqlx::query_as::<_, Review>(
            "SELECT * FROM reviews WHERE merchant_id = $1 ORDER BY created_at DESC",
        )
        .bind(merchant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(reviews)
    }
}
