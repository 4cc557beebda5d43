//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del sistema
//! y su conversión a respuestas HTTP apropiadas.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::booking::{BookingAction, BookingStatus};

/// Código SQLSTATE de violación de unicidad
const UNIQUE_VIOLATION: &str = "23505";
/// Código SQLSTATE de violación de constraint EXCLUDE
const EXCLUSION_VIOLATION: &str = "23P01";
const CHECK_VIOLATION: &str = "23514";
const NOT_NULL_VIOLATION: &str = "23502";
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";

/// Motivo de denegación devuelto por la evaluación de capacidades
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    ForbiddenRole,
    NotOwner,
    NotParty,
    LicenseNotApproved,
}

impl DenyReason {
    pub fn code(&self) -> &'static str {
        match self {
            DenyReason::ForbiddenRole => "FORBIDDEN_ROLE",
            DenyReason::NotOwner => "NOT_OWNER",
            DenyReason::NotParty => "NOT_PARTY",
            DenyReason::LicenseNotApproved => "LICENSE_NOT_APPROVED",
        }
    }
}

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unauthenticated")]
    Unauthenticated,

    #[error("Forbidden: role not allowed for this action")]
    ForbiddenRole,

    #[error("Forbidden: not the owner of this resource")]
    NotOwner,

    #[error("Forbidden: not a party to this booking")]
    NotParty,

    #[error("Forbidden: driver license not approved")]
    LicenseNotApproved,

    #[error("Invalid transition: cannot {action} a booking in status {current}")]
    InvalidTransition {
        current: BookingStatus,
        action: BookingAction,
    },

    #[error("Booking cannot be completed before its end date")]
    TooEarly,

    #[error("Booking has already started")]
    AlreadyStarted,

    #[error("Vehicle is not available for the requested dates")]
    VehicleUnavailable,

    #[error("A review already exists for this booking")]
    DuplicateReview,

    #[error("Booking is not completed")]
    BookingNotCompleted,

    #[error("Invalid rating {0}: must be between 1 and 5")]
    InvalidRating(i32),

    #[error("Message content cannot be empty")]
    EmptyContent,

    #[error("Start date must be before end date")]
    InvalidDateRange,

    #[error("Start date must be in the future")]
    StartInPast,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<DenyReason> for AppError {
    fn from(reason: DenyReason) -> Self {
        match reason {
            DenyReason::ForbiddenRole => AppError::ForbiddenRole,
            DenyReason::NotOwner => AppError::NotOwner,
            DenyReason::NotParty => AppError::NotParty,
            DenyReason::LicenseNotApproved => AppError::LicenseNotApproved,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => AppError::StorageUnavailable(error.to_string()),
            sqlx::Error::Database(db) => {
                let code = db.code().map(|code| code.into_owned()).unwrap_or_default();
                classify_database_error(&code, db.message())
            }
            other => AppError::Internal(other.to_string()),
        }
    }
}

/// Clasifica un error de Postgres por su SQLSTATE. Solo los fallos
/// transitorios se reportan como `StorageUnavailable`.
fn classify_database_error(code: &str, message: &str) -> AppError {
    match code {
        EXCLUSION_VIOLATION => AppError::VehicleUnavailable,
        CHECK_VIOLATION | NOT_NULL_VIOLATION => {
            AppError::BadRequest(format!("Value rejected by storage: {}", message))
        }
        SERIALIZATION_FAILURE | DEADLOCK_DETECTED => AppError::StorageUnavailable(message.to_string()),
        _ if code.starts_with("22") => AppError::BadRequest(format!("Invalid value: {}", message)),
        _ if code.starts_with("23") => AppError::Conflict(message.to_string()),
        // conexión, recursos agotados, apagado del servidor
        _ if code.starts_with("08") || code.starts_with("53") || code.starts_with("57P") => {
            AppError::StorageUnavailable(message.to_string())
        }
        _ => AppError::Internal(format!("Database error {}: {}", code, message)),
    }
}

impl AppError {
    /// Indica si el error es una violación de unicidad de la base de datos
    pub fn is_unique_violation(error: &sqlx::Error) -> bool {
        error
            .as_database_error()
            .and_then(|db| db.code())
            .map_or(false, |code| code == UNIQUE_VIOLATION)
    }

    /// Código estable que los clientes pueden comparar
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthenticated => "UNAUTHENTICATED",
            AppError::ForbiddenRole => DenyReason::ForbiddenRole.code(),
            AppError::NotOwner => DenyReason::NotOwner.code(),
            AppError::NotParty => DenyReason::NotParty.code(),
            AppError::LicenseNotApproved => DenyReason::LicenseNotApproved.code(),
            AppError::InvalidTransition { .. } => "INVALID_TRANSITION",
            AppError::TooEarly => "TOO_EARLY",
            AppError::AlreadyStarted => "ALREADY_STARTED",
            AppError::VehicleUnavailable => "VEHICLE_UNAVAILABLE",
            AppError::DuplicateReview => "DUPLICATE_REVIEW",
            AppError::BookingNotCompleted => "BOOKING_NOT_COMPLETED",
            AppError::InvalidRating(_) => "INVALID_RATING",
            AppError::EmptyContent => "EMPTY_CONTENT",
            AppError::InvalidDateRange => "INVALID_DATE_RANGE",
            AppError::StartInPast => "START_IN_PAST",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::StorageUnavailable(_) => "STORAGE_UNAVAILABLE",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::ForbiddenRole
            | AppError::NotOwner
            | AppError::NotParty
            | AppError::LicenseNotApproved => StatusCode::FORBIDDEN,
            AppError::InvalidTransition { .. }
            | AppError::TooEarly
            | AppError::AlreadyStarted
            | AppError::VehicleUnavailable
            | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::DuplicateReview
            | AppError::BookingNotCompleted
            | AppError::InvalidRating(_)
            | AppError::EmptyContent
            | AppError::InvalidDateRange
            | AppError::StartInPast
            | AppError::Validation(_)
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    code: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        let details = match &self {
            AppError::Validation(e) => Some(json!(e)),
            AppError::InvalidTransition { current, action } => {
                Some(json!({ "current_status": current, "action": action }))
            }
            _ => None,
        };

        let message = match &self {
            AppError::StorageUnavailable(e) => {
                tracing::error!("Storage unavailable: {}", e);
                "Storage is temporarily unavailable, retry later".to_string()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                "An unexpected error occurred".to_string()
            }
            other => other.to_string(),
        };

        let error_response = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message,
            details,
            code,
        };

        (status, Json(error_response)).into_response()
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Función helper para envolver el error de validación de un campo
pub fn field_error(field: &'static str, error: validator::ValidationError) -> AppError {
    let mut errors = validator::ValidationErrors::new();
    errors.add(field, error);
    AppError::Validation(errors)
}

/// Función helper para crear errores de recurso no encontrado
pub fn not_found_error(resource: &str, id: &uuid::Uuid) -> AppError {
    AppError::NotFound(format!("{} with id '{}' not found", resource, id))
}

/// Función helper para crear errores de conflicto
pub fn conflict_error(resource: &str, field: &str, value: &str) -> AppError {
    AppError::Conflict(format!("{} with {} '{}' already exists", resource, field, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deny_reasons_map_to_forbidden() {
        for reason in [
            DenyReason::ForbiddenRole,
            DenyReason::NotOwner,
            DenyReason::NotParty,
            DenyReason::LicenseNotApproved,
        ] {
            let error = AppError::from(reason);
            assert_eq!(error.status_code(), StatusCode::FORBIDDEN);
            assert_eq!(error.code(), reason.code());
        }
    }

    #[test]
    fn test_error_kinds_map_to_outcomes() {
        assert_eq!(AppError::Unauthenticated.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::VehicleUnavailable.status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::TooEarly.status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::DuplicateReview.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::EmptyContent.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::StorageUnavailable("down".to_string()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_invalid_transition_names_state_and_action() {
        let error = AppError::InvalidTransition {
            current: BookingStatus::Pending,
            action: BookingAction::Complete,
        };
        assert_eq!(error.to_string(), "Invalid transition: cannot complete a booking in status PENDING");
    }

    #[derive(Debug, thiserror::Error)]
    #[error("database error {0}")]
    struct PgError(&'static str);

    impl sqlx::error::DatabaseError for PgError {
        fn message(&self) -> &str {
            "rejected"
        }

        fn code(&self) -> Option<std::borrow::Cow<'_, str>> {
            Some(std::borrow::Cow::Borrowed(self.0))
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::Other
        }
    }

    fn database_error(code: &'static str) -> AppError {
        AppError::from(sqlx::Error::Database(Box::new(PgError(code))))
    }

    #[test]
    fn test_sqlx_errors_are_storage_unavailable() {
        assert!(matches!(AppError::from(sqlx::Error::PoolTimedOut), AppError::StorageUnavailable(_)));
        assert!(matches!(AppError::from(sqlx::Error::PoolClosed), AppError::StorageUnavailable(_)));
        assert!(matches!(database_error("08006"), AppError::StorageUnavailable(_)));
        assert!(matches!(database_error("40001"), AppError::StorageUnavailable(_)));
    }

    #[test]
    fn test_database_errors_by_sqlstate() {
        // numeric overflow, NUMERIC(10, 2)
        assert!(matches!(database_error("22003"), AppError::BadRequest(_)));
        assert!(matches!(database_error("23514"), AppError::BadRequest(_)));
        assert!(matches!(database_error("23505"), AppError::Conflict(_)));
        assert!(matches!(database_error("23P01"), AppError::VehicleUnavailable));
        assert!(matches!(database_error("42703"), AppError::Internal(_)));

        let decode = sqlx::Error::ColumnNotFound("total_price".to_string());
        assert!(matches!(AppError::from(decode), AppError::Internal(_)));
        assert_eq!(database_error("22003").status_code(), StatusCode::BAD_REQUEST);
    }
}
