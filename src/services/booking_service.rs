//! Servicio de reservas
//!
//! Máquina de estados de la reserva:
//!
//! ```text
//! PENDING --accept--> APPROVED --complete--> COMPLETED
//! PENDING --reject--> REJECTED
//! PENDING|APPROVED --cancel--> CANCELLED
//! ```
//!
//! Cada transición se evalúa en este orden: existencia, autorización, tabla de
//! estados, precondición temporal y escritura condicional sobre el estado leído.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::models::booking::{
    Booking, BookingAction, CreateBookingRequest, DateRange, NewBooking, UpdateBookingNotesRequest,
};
use crate::models::principal::Principal;
use crate::repositories::{BookingRepository, NotesAuthor, Repositories, VehicleRepository};
use crate::services::authorization_service::{self, Action, Resource};
use crate::services::availability_service::AvailabilityService;
use crate::services::notification_service::{dispatch, DomainEvent, NotificationHook};
use crate::utils::errors::{not_found_error, AppError, AppResult, DenyReason};

const SECONDS_PER_HOUR: i64 = 3_600;
const SECONDS_PER_DAY: i64 = 86_400;

/// Mayor total que cabe en `bookings.total_price` (NUMERIC(12, 2))
fn max_total_price() -> Decimal {
    Decimal::new(999_999_999_999, 2)
}

/// Precio total: días completos (redondeando hacia arriba) a partir de 24h,
/// horas (redondeando hacia arriba) por debajo. Nunca cobra menos de una hora.
pub fn total_price(range: &DateRange, price_per_hour: Decimal, price_per_day: Decimal) -> AppResult<Decimal> {
    let seconds = range.duration().num_seconds();

    let total = if seconds >= SECONDS_PER_DAY {
        let days = (seconds + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY;
        price_per_day.checked_mul(Decimal::from(days))
    } else {
        let hours = ((seconds + SECONDS_PER_HOUR - 1) / SECONDS_PER_HOUR).max(1);
        price_per_hour.checked_mul(Decimal::from(hours))
    };

    total
        .filter(|total| *total <= max_total_price())
        .ok_or_else(|| AppError::BadRequest("Total price exceeds the supported amount".to_string()))
}

/// Decisión del merchant sobre una reserva pendiente
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MerchantDecision {
    Accept,
    Reject,
}

impl From<MerchantDecision> for BookingAction {
    fn from(decision: MerchantDecision) -> Self {
        match decision {
            MerchantDecision::Accept => BookingAction::Accept,
            MerchantDecision::Reject => BookingAction::Reject,
        }
    }
}

pub struct BookingService {
    bookings: Arc<dyn BookingRepository>,
    vehicles: Arc<dyn VehicleRepository>,
    availability: AvailabilityService,
    notifier: Arc<dyn NotificationHook>,
}

impl BookingService {
    pub fn new(repositories: &Repositories, notifier: Arc<dyn NotificationHook>) -> Self {
        Self {
            bookings: repositories.bookings.clone(),
            vehicles: repositories.vehicles.clone(),
            availability: AvailabilityService::new(repositories.bookings.clone()),
            notifier,
        }
    }

    /// Solicitar una reserva (queda en PENDING)
    pub async fn request_booking(
        &self,
        principal: &Principal,
        request: CreateBookingRequest,
        now: DateTime<Utc>,
    ) -> AppResult<Booking> {
        // 1. Solo un renter con licencia aprobada
        authorization_service::require(principal, Action::CreateBooking, &Resource::None)?;
        request.validate()?;

        // 2. Rango válido y en el futuro
        let range = DateRange::new(request.start_date, request.end_date)?;
        if range.start() <= now {
            return Err(AppError::StartInPast);
        }

        // 3. Vehículo existente y publicado
        let vehicle = self
            .vehicles
            .get_vehicle(request.vehicle_id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", &request.vehicle_id))?;

        if !vehicle.is_available {
            return Err(AppError::VehicleUnavailable);
        }

        // 4. Comprobación previa; la definitiva la hace el repositorio al insertar
        if self.availability.has_conflict(vehicle.id, &range, None).await? {
            info!("📅 Vehículo {} ocupado entre {} y {}", vehicle.id, range.start(), range.end());
            return Err(AppError::VehicleUnavailable);
        }

        let price = total_price(&range, vehicle.price_per_hour, vehicle.price_per_day)?;

        let new_booking = NewBooking {
            vehicle_id: vehicle.id,
            renter_id: principal.id,
            merchant_id: vehicle.merchant_id,
            total_price: price,
            range,
            renter_notes: normalize_notes(request.renter_notes),
            created_at: now,
        };

        // 5. Inserción atómica
        let booking = self.bookings.create_booking(new_booking).await.map_err(|e| {
            if matches!(e, AppError::VehicleUnavailable) {
                warn!("⚠️ Reserva concurrente perdida para el vehículo {}", vehicle.id);
            }
            e
        })?;

        info!(
            "✅ Reserva {} solicitada por {} (vehículo {}, total {})",
            booking.id, booking.renter_id, booking.vehicle_id, booking.total_price
        );

        dispatch(
            &self.notifier,
            DomainEvent::BookingRequested {
                booking_id: booking.id,
                merchant_id: booking.merchant_id,
                renter_id: booking.renter_id,
            },
        )
        .await;

        Ok(booking)
    }

    /// Aceptar o rechazar una reserva pendiente
    pub async fn respond_to_booking(
        &self,
        principal: &Principal,
        booking_id: Uuid,
        decision: MerchantDecision,
        merchant_notes: Option<String>,
        now: DateTime<Utc>,
    ) -> AppResult<Booking> {
        self.transition(principal, booking_id, decision.into(), normalize_notes(merchant_notes), now)
            .await
    }

    /// Marcar como completada una reserva aprobada cuyo periodo ya terminó
    pub async fn complete_booking(
        &self,
        principal: &Principal,
        booking_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Booking> {
        self.transition(principal, booking_id, BookingAction::Complete, None, now).await
    }

    /// Cancelar una reserva activa antes de su inicio
    pub async fn cancel_booking(
        &self,
        principal: &Principal,
        booking_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Booking> {
        self.transition(principal, booking_id, BookingAction::Cancel, None, now).await
    }

    pub async fn get_booking(&self, principal: &Principal, booking_id: Uuid) -> AppResult<Booking> {
        let booking = self.load(booking_id).await?;
        authorization_service::require(principal, Action::ViewBooking, &Resource::from(&booking))?;
        Ok(booking)
    }

    /// Reservas donde el principal es renter o merchant
    pub async fn list_my_bookings(&self, principal: &Principal) -> AppResult<Vec<Booking>> {
        self.bookings.list_bookings_for_user(principal.id).await
    }

    /// Editar las notas propias de una reserva activa
    pub async fn update_booking_notes(
        &self,
        principal: &Principal,
        booking_id: Uuid,
        request: UpdateBookingNotesRequest,
        now: DateTime<Utc>,
    ) -> AppResult<Booking> {
        request.validate()?;

        let booking = self.load(booking_id).await?;
        authorization_service::require(principal, Action::UpdateBookingNotes, &Resource::from(&booking))?;

        let author = if principal.id == booking.renter_id {
            NotesAuthor::Renter
        } else if principal.id == booking.merchant_id {
            NotesAuthor::Merchant
        } else {
            return Err(DenyReason::NotParty.into());
        };

        if booking.status.is_terminal() {
            return Err(AppError::Conflict(format!(
                "Booking '{}' is {} and can no longer be edited",
                booking.id, booking.status
            )));
        }

        // La reserva sigue ocupando su rango; otra activa no debería solaparse
        if self.availability.has_conflict(booking.vehicle_id, &booking.range(), Some(booking.id)).await? {
            warn!("⚠️ La reserva {} se solapa con otra reserva activa", booking.id);
            return Err(AppError::VehicleUnavailable);
        }

        match self
            .bookings
            .update_booking_notes(booking.id, author, normalize_notes(request.notes), now)
            .await?
        {
            Some(updated) => Ok(updated),
            None => {
                let current = self.load(booking_id).await?;
                Err(AppError::Conflict(format!(
                    "Booking '{}' is {} and can no longer be edited",
                    current.id, current.status
                )))
            }
        }
    }

    async fn load(&self, booking_id: Uuid) -> AppResult<Booking> {
        self.bookings
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| not_found_error("Booking", &booking_id))
    }

    async fn transition(
        &self,
        principal: &Principal,
        booking_id: Uuid,
        action: BookingAction,
        merchant_notes: Option<String>,
        now: DateTime<Utc>,
    ) -> AppResult<Booking> {
        // 1. Existencia
        let booking = self.load(booking_id).await?;

        // 2. Autorización sobre la reserva
        authorization_service::require(principal, action.into(), &Resource::from(&booking))?;

        // 3. Tabla de estados
        let next = booking
            .status
            .next(action)
            .ok_or(AppError::InvalidTransition { current: booking.status, action })?;

        // 4. Precondiciones temporales
        match action {
            BookingAction::Complete if now < booking.end_date => return Err(AppError::TooEarly),
            BookingAction::Cancel if now >= booking.start_date => return Err(AppError::AlreadyStarted),
            _ => {}
        }

        // 5. Escritura condicional sobre el estado leído
        let updated = match self
            .bookings
            .update_booking_status(booking.id, booking.status, next, merchant_notes, now)
            .await?
        {
            Some(updated) => updated,
            None => {
                let current = self.load(booking_id).await?;
                warn!(
                    "⚠️ Transición {} sobre la reserva {} perdida: estado actual {}",
                    action, booking_id, current.status
                );
                return Err(AppError::InvalidTransition { current: current.status, action });
            }
        };

        info!(
            "🔄 Reserva {}: {} -> {} por {}",
            updated.id, booking.status, updated.status, principal.id
        );

        dispatch(&self.notifier, event_for(action, &updated, principal)).await;

        Ok(updated)
    }
}

fn event_for(action: BookingAction, booking: &Booking, principal: &Principal) -> DomainEvent {
    match action {
        BookingAction::Accept => DomainEvent::BookingAccepted {
            booking_id: booking.id,
            renter_id: booking.renter_id,
        },
        BookingAction::Reject => DomainEvent::BookingRejected {
            booking_id: booking.id,
            renter_id: booking.renter_id,
        },
        BookingAction::Complete => DomainEvent::BookingCompleted {
            booking_id: booking.id,
            renter_id: booking.renter_id,
        },
        BookingAction::Cancel => DomainEvent::BookingCancelled {
            booking_id: booking.id,
            cancelled_by: principal.id,
            notify: if principal.id == booking.renter_id {
                booking.merchant_id
            } else {
                booking.renter_id
            },
        },
    }
}

fn normalize_notes(notes: Option<String>) -> Option<String> {
    notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn range(hours: i64) -> DateRange {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap();
        DateRange::new(start, start + Duration::hours(hours)).unwrap()
    }

    #[test]
    fn test_two_days_charged_per_day() {
        let price = total_price(&range(48), Decimal::new(10, 0), Decimal::new(100, 0)).unwrap();
        assert_eq!(price, Decimal::new(200, 0));
    }

    #[test]
    fn test_partial_day_rounds_up() {
        let price = total_price(&range(25), Decimal::new(10, 0), Decimal::new(100, 0)).unwrap();
        assert_eq!(price, Decimal::new(200, 0));

        let exactly_one_day = total_price(&range(24), Decimal::new(10, 0), Decimal::new(100, 0)).unwrap();
        assert_eq!(exactly_one_day, Decimal::new(100, 0));
    }

    #[test]
    fn test_short_rental_charged_per_hour() {
        let price = total_price(&range(5), Decimal::new(1250, 2), Decimal::new(100, 0)).unwrap();
        assert_eq!(price, Decimal::new(6250, 2));

        let start = Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap();
        let ninety_minutes = DateRange::new(start, start + Duration::minutes(90)).unwrap();
        assert_eq!(
            total_price(&ninety_minutes, Decimal::new(10, 0), Decimal::new(100, 0)).unwrap(),
            Decimal::new(20, 0)
        );
    }

    #[test]
    fn test_price_overflow_is_an_error() {
        let overflow = total_price(&range(48), Decimal::new(10, 0), Decimal::MAX);
        assert!(matches!(overflow, Err(AppError::BadRequest(_))));

        let hourly_overflow = total_price(&range(5), Decimal::MAX, Decimal::new(100, 0));
        assert!(matches!(hourly_overflow, Err(AppError::BadRequest(_))));

        // Cabe en la aritmética pero no en la columna del total
        let too_long = total_price(&range(24 * 200), Decimal::new(10, 0), Decimal::new(9_999_999_999, 2));
        assert!(matches!(too_long, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_notes_are_trimmed() {
        assert_eq!(normalize_notes(Some("  hola ".to_string())), Some("hola".to_string()));
        assert_eq!(normalize_notes(Some("   ".to_string())), None);
        assert_eq!(normalize_notes(None), None);
    }

    #[test]
    fn test_cancel_notifies_other_party() {
        let renter = Uuid::new_v4();
        let merchant = Uuid::new_v4();
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap();
        let booking = Booking {
            id: Uuid::new_v4(),
            vehicle_id: Uuid::new_v4(),
            renter_id: renter,
            merchant_id: merchant,
            start_date: start,
            end_date: start + Duration::days(1),
            status: crate::models::booking::BookingStatus::Cancelled,
            total_price: Decimal::new(100, 0),
            renter_notes: None,
            merchant_notes: None,
            created_at: start,
            updated_at: start,
        };

        let by_renter = event_for(
            BookingAction::Cancel,
            &booking,
            &Principal::renter(renter, crate::models::user::LicenseStatus::Approved),
        );
        assert_eq!(
            by_renter,
            DomainEvent::BookingCancelled { booking_id: booking.id, cancelled_by: renter, notify: merchant }
        );

        let by_merchant = event_for(BookingAction::Cancel, &booking, &Principal::merchant(merchant));
        assert_eq!(
            by_merchant,
            DomainEvent::BookingCancelled { booking_id: booking.id, cancelled_by: merchant, notify: renter }
        );
    }
}
