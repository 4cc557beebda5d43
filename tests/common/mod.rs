#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use vehicle_rental::models::booking::{Booking, BookingStatus};
use vehicle_rental::models::principal::Principal;
use vehicle_rental::models::user::{LicenseStatus, MerchantProfile, RenterProfile, User, UserProfile};
use vehicle_rental::models::vehicle::{CreateVehicleRequest, NewVehicle, Vehicle};
use vehicle_rental::repositories::{InMemoryStore, Repositories};
use vehicle_rental::services::notification_service::NotificationError;
use vehicle_rental::services::{
    BookingService, ConversationService, DomainEvent, LicenseService, NotificationHook, ReviewService,
    VehicleService,
};

/// Instante de referencia de los tests
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()
}

pub fn day(n: i64) -> DateTime<Utc> {
    t0() + Duration::days(n)
}

/// Guarda los eventos publicados
#[derive(Default)]
pub struct RecordingNotifier {
    pub events: Mutex<Vec<DomainEvent>>,
}

#[async_trait]
impl NotificationHook for RecordingNotifier {
    async fn notify(&self, event: &DomainEvent) -> Result<(), NotificationError> {
        self.events.lock().await.push(event.clone());
        Ok(())
    }
}

/// Siempre falla
pub struct FailingNotifier;

#[async_trait]
impl NotificationHook for FailingNotifier {
    async fn notify(&self, _event: &DomainEvent) -> Result<(), NotificationError> {
        Err(NotificationError("smtp down".to_string()))
    }
}

pub fn user(profile: UserProfile) -> User {
    let id = Uuid::new_v4();
    User {
        id,
        email: format!("{}@example.com", id),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        phone: None,
        profile,
        created_at: t0(),
        updated_at: t0(),
    }
}

pub fn renter_user(status: LicenseStatus) -> User {
    user(UserProfile::Renter(RenterProfile {
        license_status: status,
        license_url: Some("https://files.example.com/license.png".to_string()),
    }))
}

pub fn merchant_user() -> User {
    user(UserProfile::Merchant(MerchantProfile {
        business_name: Some("Rent & Go".to_string()),
        business_address: None,
    }))
}

pub fn vehicle_request(plate: &str) -> CreateVehicleRequest {
    CreateVehicleRequest {
        make: "Toyota".to_string(),
        model: "Corolla".to_string(),
        year: 2022,
        color: "Blanco".to_string(),
        license_plate: plate.to_string(),
        price_per_hour: Decimal::new(10, 0),
        price_per_day: Decimal::new(100, 0),
        seats: 5,
        fuel_type: "gasoline".to_string(),
        transmission: "automatic".to_string(),
        mileage: Some(12_000),
        description: None,
        features: vec!["gps".to_string()],
        images: Vec::new(),
        location: Some("Madrid".to_string()),
        is_available: true,
    }
}

pub fn vehicle_for(merchant_id: Uuid, plate: &str) -> Vehicle {
    NewVehicle {
        merchant_id,
        request: vehicle_request(plate),
        created_at: t0(),
    }
    .into_vehicle(Uuid::new_v4())
}

/// Usuarios, vehículo y servicios sobre un store en memoria
pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub bookings: Arc<BookingService>,
    pub conversations: ConversationService,
    pub reviews: Arc<ReviewService>,
    pub vehicles: VehicleService,
    pub licenses: LicenseService,
    pub renter: Principal,
    pub other_renter: Principal,
    pub unlicensed: Principal,
    pub merchant: Principal,
    pub other_merchant: Principal,
    pub admin: Principal,
    pub vehicle: Vehicle,
}

impl Harness {
    pub async fn new() -> Self {
        let notifier = Arc::new(RecordingNotifier::default());
        Self::with_notifier(notifier.clone(), notifier).await
    }

    pub async fn with_notifier(recorder: Arc<RecordingNotifier>, hook: Arc<dyn NotificationHook>) -> Self {
        let store = Arc::new(InMemoryStore::new());

        let renter = renter_user(LicenseStatus::Approved);
        let other_renter = renter_user(LicenseStatus::Approved);
        let unlicensed = renter_user(LicenseStatus::Pending);
        let merchant = merchant_user();
        let other_merchant = merchant_user();
        let admin = user(UserProfile::Admin);
        let vehicle = vehicle_for(merchant.id, "AB-123-CD");

        let principals = [&renter, &other_renter, &unlicensed, &merchant, &other_merchant, &admin]
            .map(|u| Principal::from(u));

        for u in [renter, other_renter, unlicensed, merchant, other_merchant, admin] {
            store.insert_user(u).await;
        }
        store.insert_vehicle(vehicle.clone()).await;

        let repositories = Repositories::in_memory(store.clone());

        Self {
            bookings: Arc::new(BookingService::new(&repositories, hook.clone())),
            conversations: ConversationService::new(&repositories, hook.clone()),
            reviews: Arc::new(ReviewService::new(&repositories)),
            vehicles: VehicleService::new(&repositories),
            licenses: LicenseService::new(&repositories, hook),
            store,
            notifier: recorder,
            renter: principals[0],
            other_renter: principals[1],
            unlicensed: principals[2],
            merchant: principals[3],
            other_merchant: principals[4],
            admin: principals[5],
            vehicle,
        }
    }

    /// Inserta una reserva ya existente en el estado indicado
    pub async fn seed_booking(&self, start: DateTime<Utc>, end: DateTime<Utc>, status: BookingStatus) -> Booking {
        let booking = Booking {
            id: Uuid::new_v4(),
            vehicle_id: self.vehicle.id,
            renter_id: self.renter.id,
            merchant_id: self.merchant.id,
            start_date: start,
            end_date: end,
            status,
            total_price: Decimal::new(100, 0),
            renter_notes: None,
            merchant_notes: None,
            created_at: t0(),
            updated_at: t0(),
        };
        self.store.insert_booking(booking.clone()).await;
        booking
    }

    pub async fn events(&self) -> Vec<DomainEvent> {
        self.notifier.events.lock().await.clone()
    }
}
