//! Modelo de Booking
//!
//! Este módulo contiene la reserva, su estado y el rango de fechas semiabierto
//! `[start, end)` que se usa para detectar solapamientos.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use validator::Validate;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;
use rust_decimal::Decimal;
use std::fmt;

use crate::utils::errors::{AppError, AppResult};

/// Estado de la reserva - mapea al ENUM booking_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "booking_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Approved => "APPROVED",
            BookingStatus::Rejected => "REJECTED",
            BookingStatus::Completed => "COMPLETED",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }

    /// Solo PENDING y APPROVED ocupan el vehículo
    pub fn is_active(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Approved)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    /// Tabla de transiciones. `None` si la acción no aplica al estado actual.
    pub fn next(self, action: BookingAction) -> Option<BookingStatus> {
        match (self, action) {
            (BookingStatus::Pending, BookingAction::Accept) => Some(BookingStatus::Approved),
            (BookingStatus::Pending, BookingAction::Reject) => Some(BookingStatus::Rejected),
            (BookingStatus::Approved, BookingAction::Complete) => Some(BookingStatus::Completed),
            (BookingStatus::Pending | BookingStatus::Approved, BookingAction::Cancel) => {
                Some(BookingStatus::Cancelled)
            }
            _ => None,
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Acciones que mueven una reserva existente
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BookingAction {
    Accept,
    Reject,
    Complete,
    Cancel,
}

impl BookingAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingAction::Accept => "accept",
            BookingAction::Reject => "reject",
            BookingAction::Complete => "complete",
            BookingAction::Cancel => "cancel",
        }
    }
}

impl fmt::Display for BookingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rango semiabierto `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> AppResult<Self> {
        if start >= end {
            return Err(AppError::InvalidDateRange);
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// `[s1,e1)` y `[s2,e2)` se solapan sii `s1 < e2 && s2 < e1`
    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Booking principal - mapea a la tabla bookings
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub renter_id: Uuid,
    pub merchant_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: BookingStatus,
    pub total_price: Decimal,
    pub renter_notes: Option<String>,
    pub merchant_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Rango de la reserva. Las filas guardadas ya cumplen `start < end`.
    pub fn range(&self) -> DateRange {
        DateRange { start: self.start_date, end: self.end_date }
    }

    pub fn is_party(&self, user_id: Uuid) -> bool {
        self.renter_id == user_id || self.merchant_id == user_id
    }
}

/// Reserva lista para insertar; `merchant_id` es una copia del dueño del vehículo
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub vehicle_id: Uuid,
    pub renter_id: Uuid,
    pub merchant_id: Uuid,
    pub range: DateRange,
    pub total_price: Decimal,
    pub renter_notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewBooking {
    pub fn into_booking(self, id: Uuid) -> Booking {
        Booking {
            id,
            vehicle_id: self.vehicle_id,
            renter_id: self.renter_id,
            merchant_id: self.merchant_id,
            start_date: self.range.start(),
            end_date: self.range.end(),
            status: BookingStatus::Pending,
            total_price: self.total_price,
            renter_notes: self.renter_notes,
            merchant_notes: None,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// Request para solicitar una reserva
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateBookingRequest {
    pub vehicle_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[validate(length(max = 2000))]
    pub renter_notes: Option<String>,
}

/// Request de accept/reject con nota opcional del merchant
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct RespondBookingRequest {
    #[validate(length(max = 2000))]
    pub merchant_notes: Option<String>,
}

/// Request para editar las notas propias
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateBookingNotesRequest {
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}
