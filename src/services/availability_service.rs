//! Comprobación de disponibilidad por fechas
//!
//! Solo las reservas activas (PENDING, APPROVED) ocupan el vehículo. La regla
//! depende únicamente del estado, no de la fecha actual.

use std::sync::Arc;
use uuid::Uuid;

use crate::models::booking::{Booking, DateRange};
use crate::repositories::BookingRepository;
use crate::utils::errors::AppResult;

/// Primera reserva activa que se solapa con `range`, ignorando `exclude`.
/// El llamador filtra por vehículo.
pub fn find_conflict<'a, I>(bookings: I, range: &DateRange, exclude: Option<Uuid>) -> Option<&'a Booking>
where
    I: IntoIterator<Item = &'a Booking>,
{
    bookings
        .into_iter()
        .filter(|b| b.status.is_active())
        .filter(|b| Some(b.id) != exclude)
        .find(|b| b.range().overlaps(range))
}

pub struct AvailabilityService {
    bookings: Arc<dyn BookingRepository>,
}

impl AvailabilityService {
    pub fn new(bookings: Arc<dyn BookingRepository>) -> Self {
        Self { bookings }
    }

    /// `true` si alguna reserva activa del vehículo se solapa con el rango
    pub async fn has_conflict(
        &self,
        vehicle_id: Uuid,
        range: &DateRange,
        exclude_booking_id: Option<Uuid>,
    ) -> AppResult<bool> {
        let active = self.bookings.list_active_bookings_for_vehicle(vehicle_id).await?;
        let conflict = find_conflict(active.iter().filter(|b| b.vehicle_id == vehicle_id), range, exclude_booking_id);

        if let Some(existing) = conflict {
            tracing::debug!(
                vehicle = %vehicle_id,
                conflicting_booking = %existing.id,
                "Rango solapado con una reserva activa"
            );
        }

        Ok(conflict.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::booking::BookingStatus;
    use chrono::{DateTime, TimeZone, Utc};
    use rust_decimal::Decimal;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0).unwrap()
    }

    fn booking(start: u32, end: u32, status: BookingStatus) -> Booking {
        Booking {
            id: Uuid::new_v4(),
            vehicle_id: Uuid::nil(),
            renter_id: Uuid::new_v4(),
            merchant_id: Uuid::new_v4(),
            start_date: at(start),
            end_date: at(end),
            status,
            total_price: Decimal::new(100, 0),
            renter_notes: None,
            merchant_notes: None,
            created_at: at(1),
            updated_at: at(1),
        }
    }

    #[test]
    fn test_only_active_bookings_conflict() {
        let range = DateRange::new(at(10), at(12)).unwrap();
        for status in [BookingStatus::Rejected, BookingStatus::Cancelled, BookingStatus::Completed] {
            let bookings = vec![booking(9, 13, status)];
            assert!(find_conflict(&bookings, &range, None).is_none(), "{:?}", status);
        }
        for status in [BookingStatus::Pending, BookingStatus::Approved] {
            let bookings = vec![booking(9, 13, status)];
            assert!(find_conflict(&bookings, &range, None).is_some(), "{:?}", status);
        }
    }

    #[test]
    fn test_adjacent_ranges_do_not_conflict() {
        let bookings = vec![booking(10, 12, BookingStatus::Approved)];
        let before = DateRange::new(at(8), at(10)).unwrap();
        let after = DateRange::new(at(12), at(14)).unwrap();
        assert!(find_conflict(&bookings, &before, None).is_none());
        assert!(find_conflict(&bookings, &after, None).is_none());
    }

    #[test]
    fn test_excluded_booking_is_ignored() {
        let existing = booking(10, 12, BookingStatus::Pending);
        let range = existing.range();
        let id = existing.id;
        let bookings = vec![existing];
        assert!(find_conflict(&bookings, &range, Some(id)).is_none());
        assert!(find_conflict(&bookings, &range, Some(Uuid::new_v4())).is_some());
    }
}
