//! Flujo de licencias de conducir
//!
//! El renter sube su licencia (vuelve a PENDING) y un admin la aprueba o la
//! rechaza. Solo con la licencia APPROVED se pueden solicitar reservas.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::models::principal::Principal;
use crate::models::user::{LicenseStatus, ReviewLicenseRequest, Role, UploadLicenseRequest, User};
use crate::repositories::{Repositories, UserRepository};
use crate::services::authorization_service::{self, Action, Resource};
use crate::services::notification_service::{dispatch, DomainEvent, NotificationHook};
use crate::utils::errors::{field_error, not_found_error, AppError, AppResult, DenyReason};
use crate::utils::validation::validate_http_url;

pub struct LicenseService {
    users: Arc<dyn UserRepository>,
    notifier: Arc<dyn NotificationHook>,
}

impl LicenseService {
    pub fn new(repositories: &Repositories, notifier: Arc<dyn NotificationHook>) -> Self {
        Self { users: repositories.users.clone(), notifier }
    }

    pub async fn get_profile(&self, principal: &Principal) -> AppResult<User> {
        self.users
            .get_user(principal.id)
            .await?
            .ok_or_else(|| not_found_error("User", &principal.id))
    }

    pub async fn upload_license(
        &self,
        principal: &Principal,
        request: UploadLicenseRequest,
        now: DateTime<Utc>,
    ) -> AppResult<User> {
        authorization_service::require(principal, Action::UploadLicense, &Resource::None)?;

        request.validate()?;
        let license_url = request.license_url.trim().to_string();
        validate_http_url(&license_url).map_err(|error| field_error("license_url", error))?;

        let user = self
            .users
            .update_renter_license(principal.id, Some(license_url), LicenseStatus::Pending, now)
            .await?
            .ok_or_else(|| not_found_error("User", &principal.id))?;

        info!("🪪 Licencia subida por {}, pendiente de revisión", user.id);

        Ok(user)
    }

    /// Aprobar o rechazar la licencia de un renter (solo admin)
    pub async fn review_license(
        &self,
        principal: &Principal,
        user_id: Uuid,
        request: ReviewLicenseRequest,
        now: DateTime<Utc>,
    ) -> AppResult<User> {
        authorization_service::require(principal, Action::ReviewLicense, &Resource::None)?;

        if request.status == LicenseStatus::Pending {
            return Err(AppError::BadRequest("A review must approve or reject the license".to_string()));
        }

        let target = self
            .users
            .get_user(user_id)
            .await?
            .ok_or_else(|| not_found_error("User", &user_id))?;

        // Solo los renters tienen licencia
        if target.role() != Role::Renter {
            return Err(DenyReason::ForbiddenRole.into());
        }

        let user = self
            .users
            .update_renter_license(user_id, None, request.status, now)
            .await?
            .ok_or_else(|| not_found_error("User", &user_id))?;

        info!("🪪 Licencia de {} marcada como {:?} por {}", user.id, request.status, principal.id);

        dispatch(
            &self.notifier,
            DomainEvent::LicenseReviewed { user_id: user.id, status: request.status },
        )
        .await;

        Ok(user)
    }

    pub async fn list_pending_licenses(&self, principal: &Principal) -> AppResult<Vec<User>> {
        authorization_service::require(principal, Action::ReviewLicense, &Resource::None)?;
        self.users.list_pending_licenses().await
    }
}
