//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use std::sync::Arc;

use crate::config::environment::EnvironmentConfig;
use crate::repositories::{Repositories, UserRepository};
use crate::services::{
    BookingService, ConversationService, LicenseService, NotificationHook, ReviewService, VehicleService,
};
use crate::utils::jwt::JwtConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: EnvironmentConfig,
    pub jwt: JwtConfig,
    pub users: Arc<dyn UserRepository>,
    pub vehicles: Arc<VehicleService>,
    pub bookings: Arc<BookingService>,
    pub conversations: Arc<ConversationService>,
    pub reviews: Arc<ReviewService>,
    pub licenses: Arc<LicenseService>,
}

impl AppState {
    pub fn new(
        config: EnvironmentConfig,
        repositories: Repositories,
        notifier: Arc<dyn NotificationHook>,
    ) -> Self {
        Self {
            jwt: JwtConfig::from(&config),
            config,
            users: repositories.users.clone(),
            vehicles: Arc::new(VehicleService::new(&repositories)),
            bookings: Arc::new(BookingService::new(&repositories, notifier.clone())),
            conversations: Arc::new(ConversationService::new(&repositories, notifier.clone())),
            reviews: Arc::new(ReviewService::new(&repositories)),
            licenses: Arc::new(LicenseService::new(&repositories, notifier)),
        }
    }
}
