//! Services module
//!
//! Este módulo contiene la lógica de negocio del marketplace: autorización,
//! disponibilidad, ciclo de vida de la reserva, conversación y reviews.

pub mod authorization_service;
pub mod availability_service;
pub mod booking_service;
pub mod conversation_service;
pub mod license_service;
pub mod notification_service;
pub mod review_service;
pub mod vehicle_service;

pub use authorization_service::{authorize, require, Action, Decision, Resource};
pub use availability_service::AvailabilityService;
pub use booking_service::{BookingService, MerchantDecision};
pub use conversation_service::ConversationService;
pub use license_service::LicenseService;
pub use notification_service::{DomainEvent, LogNotifier, NotificationHook};
pub use review_service::ReviewService;
pub use vehicle_service::VehicleService;
