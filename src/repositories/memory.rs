//! Store en memoria
//!
//! Implementa todos los repositorios sobre un único `RwLock`, de modo que la
//! comprobación de solapamiento y la inserción ocurren bajo el mismo lock de
//! escritura. Se usa en desarrollo (`STORAGE_BACKEND=memory`) y en los tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::booking::{Booking, BookingStatus, NewBooking};
use crate::models::message::{Message, NewMessage};
use crate::models::review::{NewReview, Review};
use crate::models::user::{LicenseStatus, User, UserProfile};
use crate::models::vehicle::{NewVehicle, Vehicle, VehicleFilters};
use crate::services::availability_service::find_conflict;
use crate::utils::errors::{conflict_error, not_found_error, AppError, AppResult};

use super::booking_repository::{BookingRepository, NotesAuthor};
use super::message_repository::MessageRepository;
use super::review_repository::ReviewRepository;
use super::user_repository::UserRepository;
use super::vehicle_repository::VehicleRepository;

#[derive(Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    vehicles: HashMap<Uuid, Vehicle>,
    bookings: HashMap<Uuid, Booking>,
    messages: Vec<Message>,
    reviews: HashMap<Uuid, Review>,
}

#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<MemoryState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registrar un usuario (el registro vive fuera del núcleo)
    pub async fn insert_user(&self, user: User) {
        self.state.write().await.users.insert(user.id, user);
    }

    pub async fn insert_vehicle(&self, vehicle: Vehicle) {
        self.state.write().await.vehicles.insert(vehicle.id, vehicle);
    }

    /// Insertar una reserva tal cual, sin comprobaciones (datos semilla)
    pub async fn insert_booking(&self, booking: Booking) {
        self.state.write().await.bookings.insert(booking.id, booking);
    }
}

fn newest_first<T, F>(items: &mut [T], created_at: F)
where
    F: Fn(&T) -> DateTime<Utc>,
{
    items.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn update_renter_license(
        &self,
        id: Uuid,
        license_url: Option<String>,
        status: LicenseStatus,
        now: DateTime<Utc>,
    ) -> AppResult<Option<User>> {
        let mut state = self.state.write().await;
        let Some(user) = state.users.get_mut(&id) else {
            return Ok(None);
        };

        let UserProfile::Renter(renter) = &mut user.profile else {
            return Ok(None);
        };

        renter.license_status = status;
        if license_url.is_some() {
            renter.license_url = license_url;
        }
        user.updated_at = now;

        Ok(Some(user.clone()))
    }

    async fn list_pending_licenses(&self) -> AppResult<Vec<User>> {
        let state = self.state.read().await;
        let mut users: Vec<User> = state
            .users
            .values()
            .filter(|u| u.license_status() == Some(LicenseStatus::Pending))
            .cloned()
            .collect();
        newest_first(&mut users, |u| u.created_at);
        Ok(users)
    }
}

#[async_trait]
impl VehicleRepository for InMemoryStore {
    async fn get_vehicle(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        let state = self.state.read().await;
        Ok(state.vehicles.get(&id).filter(|v| !v.is_deleted()).cloned())
    }

    async fn list_vehicles(&self, filters: &VehicleFilters) -> AppResult<Vec<Vehicle>> {
        let state = self.state.read().await;
        let mut vehicles: Vec<Vehicle> = state
            .vehicles
            .values()
            .filter(|v| !v.is_deleted())
            .filter(|v| filters.available.map_or(true, |available| v.is_available == available))
            .cloned()
            .collect();
        newest_first(&mut vehicles, |v| v.created_at);
        Ok(vehicles)
    }

    async fn list_by_merchant(&self, merchant_id: Uuid) -> AppResult<Vec<Vehicle>> {
        let state = self.state.read().await;
        let mut vehicles: Vec<Vehicle> = state
            .vehicles
            .values()
            .filter(|v| v.merchant_id == merchant_id && !v.is_deleted())
            .cloned()
            .collect();
        newest_first(&mut vehicles, |v| v.created_at);
        Ok(vehicles)
    }

    async fn license_plate_exists(&self, license_plate: &str) -> AppResult<bool> {
        let state = self.state.read().await;
        Ok(state
            .vehicles
            .values()
            .any(|v| !v.is_deleted() && v.license_plate == license_plate))
    }

    async fn create_vehicle(&self, vehicle: NewVehicle) -> AppResult<Vehicle> {
        let mut state = self.state.write().await;
        let vehicle = vehicle.into_vehicle(Uuid::new_v4());

        let duplicate = state
            .vehicles
            .values()
            .any(|v| !v.is_deleted() && v.license_plate == vehicle.license_plate);
        if duplicate {
            return Err(conflict_error("Vehicle", "license plate", &vehicle.license_plate));
        }

        state.vehicles.insert(vehicle.id, vehicle.clone());
        Ok(vehicle)
    }

    async fn update_vehicle(&self, vehicle: &Vehicle) -> AppResult<Option<Vehicle>> {
        let mut state = self.state.write().await;
        let Some(stored) = state.vehicles.get_mut(&vehicle.id).filter(|v| !v.is_deleted()) else {
            return Ok(None);
        };

        let merchant_id = stored.merchant_id;
        let created_at = stored.created_at;
        *stored = Vehicle {
            merchant_id,
            created_at,
            ..vehicle.clone()
        };

        Ok(Some(stored.clone()))
    }

    async fn delete_vehicle(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<bool> {
        let mut state = self.state.write().await;
        match state.vehicles.get_mut(&id).filter(|v| !v.is_deleted()) {
            Some(vehicle) => {
                vehicle.deleted_at = Some(now);
                vehicle.is_available = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl BookingRepository for InMemoryStore {
    async fn get_booking(&self, id: Uuid) -> AppResult<Option<Booking>> {
        Ok(self.state.read().await.bookings.get(&id).cloned())
    }

    async fn list_active_bookings_for_vehicle(&self, vehicle_id: Uuid) -> AppResult<Vec<Booking>> {
        let state = self.state.read().await;
        let mut bookings: Vec<Booking> = state
            .bookings
            .values()
            .filter(|b| b.vehicle_id == vehicle_id && b.status.is_active())
            .cloned()
            .collect();
        bookings.sort_by_key(|b| b.start_date);
        Ok(bookings)
    }

    async fn list_bookings_for_user(&self, user_id: Uuid) -> AppResult<Vec<Booking>> {
        let state = self.state.read().await;
        let mut bookings: Vec<Booking> = state
            .bookings
            .values()
            .filter(|b| b.is_party(user_id))
            .cloned()
            .collect();
        newest_first(&mut bookings, |b| b.created_at);
        Ok(bookings)
    }

    async fn create_booking(&self, booking: NewBooking) -> AppResult<Booking> {
        let mut state = self.state.write().await;

        if !state.vehicles.get(&booking.vehicle_id).map_or(false, |v| !v.is_deleted()) {
            return Err(not_found_error("Vehicle", &booking.vehicle_id));
        }

        let same_vehicle = state.bookings.values().filter(|b| b.vehicle_id == booking.vehicle_id);
        if find_conflict(same_vehicle, &booking.range, None).is_some() {
            return Err(AppError::VehicleUnavailable);
        }

        let booking = booking.into_booking(Uuid::new_v4());
        state.bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn update_booking_status(
        &self,
        id: Uuid,
        expected: BookingStatus,
        new_status: BookingStatus,
        merchant_notes: Option<String>,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Booking>> {
        let mut state = self.state.write().await;
        let Some(booking) = state.bookings.get_mut(&id).filter(|b| b.status == expected) else {
            return Ok(None);
        };

        booking.status = new_status;
        if merchant_notes.is_some() {
            booking.merchant_notes = merchant_notes;
        }
        booking.updated_at = now;

        Ok(Some(booking.clone()))
    }

    async fn update_booking_notes(
        &self,
        id: Uuid,
        author: NotesAuthor,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Booking>> {
        let mut state = self.state.write().await;
        let Some(booking) = state.bookings.get_mut(&id).filter(|b| b.status.is_active()) else {
            return Ok(None);
        };

        match author {
            NotesAuthor::Renter => booking.renter_notes = notes,
            NotesAuthor::Merchant => booking.merchant_notes = notes,
        }
        booking.updated_at = now;

        Ok(Some(booking.clone()))
    }
}

#[async_trait]
impl MessageRepository for InMemoryStore {
    async fn create_message(&self, message: NewMessage) -> AppResult<Message> {
        let mut state = self.state.write().await;
        let message = message.into_message(Uuid::new_v4());
        state.messages.push(message.clone());
        Ok(message)
    }

    async fn list_messages(&self, booking_id: Uuid) -> AppResult<Vec<Message>> {
        let state = self.state.read().await;
        let mut messages: Vec<Message> = state
            .messages
            .iter()
            .filter(|m| m.booking_id == booking_id)
            .cloned()
            .collect();
        // sort estable: a igual instante se conserva el orden de inserción
        messages.sort_by_key(|m| m.created_at);
        Ok(messages)
    }
}

#[async_trait]
impl ReviewRepository for InMemoryStore {
    async fn create_review(&self, review: NewReview) -> AppResult<Review> {
        let mut state = self.state.write().await;
        if state.reviews.contains_key(&review.booking_id) {
            return Err(AppError::DuplicateReview);
        }

        let review = review.into_review(Uuid::new_v4());
        state.reviews.insert(review.booking_id, review.clone());
        Ok(review)
    }

    async fn get_review_by_booking(&self, booking_id: Uuid) -> AppResult<Option<Review>> {
        Ok(self.state.read().await.reviews.get(&booking_id).cloned())
    }

    async fn list_reviews_for_merchant(&self, merchant_id: Uuid) -> AppResult<Vec<Review>> {
        let state = self.state.read().await;
        let mut reviews: Vec<Review> = state
            .reviews
            .values()
            .filter(|r| r.merchant_id == merchant_id)
            .cloned()
            .collect();
        newest_first(&mut reviews, |r| r.created_at);
        Ok(reviews)
    }
}
