//! Repositorios
//!
//! Contratos de lectura/escritura que consume el núcleo, con implementación
//! PostgreSQL (SQLx) y una implementación en memoria.

pub mod user_repository;
pub mod vehicle_repository;
pub mod booking_repository;
pub mod message_repository;
pub mod review_repository;
pub mod memory;

use sqlx::PgPool;
use std::sync::Arc;

pub use booking_repository::{BookingRepository, NotesAuthor, PgBookingRepository};
pub use memory::InMemoryStore;
pub use message_repository::{MessageRepository, PgMessageRepository};
pub use review_repository::{PgReviewRepository, ReviewRepository};
pub use user_repository::{PgUserRepository, UserRepository};
pub use vehicle_repository::{PgVehicleRepository, VehicleRepository};

/// Conjunto de repositorios compartido por los servicios
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub vehicles: Arc<dyn VehicleRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub reviews: Arc<dyn ReviewRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            vehicles: Arc::new(PgVehicleRepository::new(pool.clone())),
            bookings: Arc::new(PgBookingRepository::new(pool.clone())),
            messages: Arc::new(PgMessageRepository::new(pool.clone())),
            reviews: Arc::new(PgReviewRepository::new(pool)),
        }
    }

    pub fn in_memory(store: Arc<InMemoryStore>) -> Self {
        Self {
            users: store.clone(),
            vehicles: store.clone(),
            bookings: store.clone(),
            messages: store.clone(),
            reviews: store,
        }
    }
}
