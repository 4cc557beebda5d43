use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::booking::{Booking, BookingStatus, NewBooking};
use crate::utils::errors::{not_found_error, AppError, AppResult};

/// Qué campo de notas se edita
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotesAuthor {
    Renter,
    Merchant,
}

/// Acceso a reservas. Las reservas nunca se borran, solo cambian de estado.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn get_booking(&self, id: Uuid) -> AppResult<Option<Booking>>;

    /// Reservas PENDING o APPROVED del vehículo
    async fn list_active_bookings_for_vehicle(&self, vehicle_id: Uuid) -> AppResult<Vec<Booking>>;

    /// Reservas donde el usuario es renter o merchant, más recientes primero
    async fn list_bookings_for_user(&self, user_id: Uuid) -> AppResult<Vec<Booking>>;

    /// Inserta la reserva volviendo a comprobar solapamientos en la misma unidad atómica.
    /// Falla con `VehicleUnavailable` si otra reserva activa ocupa el rango.
    async fn create_booking(&self, booking: NewBooking) -> AppResult<Booking>;

    /// Escritura condicional: solo aplica si el estado guardado sigue siendo `expected`.
    /// `merchant_notes = None` conserva las notas actuales.
    async fn update_booking_status(
        &self,
        id: Uuid,
        expected: BookingStatus,
        new_status: BookingStatus,
        merchant_notes: Option<String>,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Booking>>;

    /// Edita las notas de una parte mientras la reserva siga activa
    async fn update_booking_notes(
        &self,
        id: Uuid,
        author: NotesAuthor,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Booking>>;
}

pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn get_booking(&self, id: Uuid) -> AppResult<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(booking)
    }

    async fn list_active_bookings_for_vehicle(&self, vehicle_id: Uuid) -> AppResult<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT * FROM bookings
            WHERE vehicle_id = $1 AND status IN ('PENDING', 'APPROVED')
            ORDER BY start_date ASC
            "#,
        )
        .bind(vehicle_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    async fn list_bookings_for_user(&self, user_id: Uuid) -> AppResult<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT * FROM bookings
            WHERE renter_id = $1 OR merchant_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    async fn create_booking(&self, booking: NewBooking) -> AppResult<Booking> {
        let booking = booking.into_booking(Uuid::new_v4());
        let mut tx = self.pool.begin().await?;

        // Bloquear la fila del vehículo serializa las inserciones concurrentes sobre él
        let locked: Option<(Uuid,)> = sqlx::query_as(
            "SELECT id FROM vehicles WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
        )
        .bind(booking.vehicle_id)
        .fetch_optional(&mut *tx)
        .await?;

        if locked.is_none() {
            return Err(not_found_error("Vehicle", &booking.vehicle_id));
        }

        let conflict: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM bookings
                WHERE vehicle_id = $1
                AND status IN ('PENDING', 'APPROVED')
                AND start_date < $3
                AND $2 < end_date
            )
            "#,
        )
        .bind(booking.vehicle_id)
        .bind(booking.start_date)
        .bind(booking.end_date)
        .fetch_one(&mut *tx)
        .await?;

        if conflict.0 {
            return Err(AppError::VehicleUnavailable);
        }

        let created = sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (
                id, vehicle_id, renter_id, merchant_id, start_date, end_date,
                status, total_price, renter_notes, merchant_notes, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
            RETURNING *
            "#,
        )
        .bind(booking.id)
        .bind(booking.vehicle_id)
        .bind(booking.renter_id)
        .bind(booking.merchant_id)
        .bind(booking.start_date)
        .bind(booking.end_date)
        .bind(booking.status)
        .bind(booking.total_price)
        .bind(booking.renter_notes)
        .bind(booking.merchant_notes)
        .bind(booking.created_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(created)
    }

    async fn update_booking_status(
        &self,
        id: Uuid,
        expected: BookingStatus,
        new_status: BookingStatus,
        merchant_notes: Option<String>,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET status = $3,
                merchant_notes = COALESCE($4, merchant_notes),
                updated_at = $5
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(expected)
        .bind(new_status)
        .bind(merchant_notes)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(booking)
    }

    async fn update_booking_notes(
        &self,
        id: Uuid,
        author: NotesAuthor,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Booking>> {
        let query = match author {
            NotesAuthor::Renter => {
                r#"
                UPDATE bookings SET renter_notes = $2, updated_at = $3
                WHERE id = $1 AND status IN ('PENDING', 'APPROVED')
                RETURNING *
                "#
            }
            NotesAuthor::Merchant => {
                r#"
                UPDATE bookings SET merchant_notes = $2, updated_at = $3
                WHERE id = $1 AND status IN ('PENDING', 'APPROVED')
                RETURNING *
                "#
            }
        };

        let booking = sqlx::query_as::<_, Booking>(query)
            .bind(id)
            .bind(notes)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;

        Ok(booking)
    }
}
