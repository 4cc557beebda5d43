//! Servicio de autorización
//!
//! Una única función de evaluación de capacidades que consultan todos los
//! puntos de entrada. Las reglas se evalúan en orden y gana la primera que aplica:
//!
//! 1. ADMIN puede todo salvo crear contenido propio de una parte
//!    (reservas, notas, mensajes, reviews, vehículos, licencias).
//! 2. Acciones sobre recursos con dueño exigen que el principal sea el dueño
//!    (merchant del vehículo o de la reserva) o una de las partes.
//! 3. Crear una reserva exige RENTER con licencia APPROVED.
//! 4. Crear un vehículo exige MERCHANT.
//! 5. La lectura pública no requiere autorización.

use serde::Serialize;
use uuid::Uuid;

use crate::models::booking::{Booking, BookingAction};
use crate::models::principal::{Principal, PrincipalRole};
use crate::models::user::LicenseStatus;
use crate::models::vehicle::Vehicle;
use crate::utils::errors::{AppResult, DenyReason};

/// Acciones sujetas a autorización
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    CreateVehicle,
    UpdateVehicle,
    DeleteVehicle,
    CreateBooking,
    ViewBooking,
    AcceptBooking,
    RejectBooking,
    CompleteBooking,
    CancelBooking,
    UpdateBookingNotes,
    PostMessage,
    ReadMessages,
    CreateReview,
    UploadLicense,
    ReviewLicense,
    ReadPublic,
}

impl Action {
    /// Acciones que crean contenido en nombre de una parte; ni un admin puede hacerlas
    pub fn is_authoring(&self) -> bool {
        matches!(
            self,
            Action::CreateBooking
                | Action::PostMessage
                | Action::CreateReview
                | Action::CreateVehicle
                | Action::UploadLicense
                | Action::UpdateBookingNotes
        )
    }
}

impl From<BookingAction> for Action {
    fn from(action: BookingAction) -> Self {
        match action {
            BookingAction::Accept => Action::AcceptBooking,
            BookingAction::Reject => Action::RejectBooking,
            BookingAction::Complete => Action::CompleteBooking,
            BookingAction::Cancel => Action::CancelBooking,
        }
    }
}

/// Recurso sobre el que se evalúa la acción
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// Sin recurso previo: creación o listados
    None,
    Vehicle { merchant_id: Uuid },
    Booking { renter_id: Uuid, merchant_id: Uuid },
}

impl From<&Vehicle> for Resource {
    fn from(vehicle: &Vehicle) -> Self {
        Resource::Vehicle { merchant_id: vehicle.merchant_id }
    }
}

impl From<&Booking> for Resource {
    fn from(booking: &Booking) -> Self {
        Resource::Booking {
            renter_id: booking.renter_id,
            merchant_id: booking.merchant_id,
        }
    }
}

/// Resultado de la evaluación
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn into_result(self) -> AppResult<()> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => Err(reason.into()),
        }
    }
}

/// ¿Puede el principal realizar la acción sobre el recurso?
pub fn authorize(principal: &Principal, action: Action, resource: &Resource) -> Decision {
    let decision = evaluate(principal, action, resource);
    if let Decision::Deny(reason) = decision {
        tracing::debug!(
            principal = %principal.id,
            ?action,
            reason = reason.code(),
            "Acción denegada"
        );
    }
    decision
}

/// Igual que [`authorize`] pero como `Result`
pub fn require(principal: &Principal, action: Action, resource: &Resource) -> AppResult<()> {
    authorize(principal, action, resource).into_result()
}

fn evaluate(principal: &Principal, action: Action, resource: &Resource) -> Decision {
    // Regla 1
    if principal.is_admin() {
        return if action.is_authoring() {
            Decision::Deny(DenyReason::ForbiddenRole)
        } else {
            Decision::Allow
        };
    }

    match action {
        // Regla 2
        Action::UpdateVehicle | Action::DeleteVehicle => match resource {
            Resource::Vehicle { merchant_id } => owner(principal.id == *merchant_id),
            _ => Decision::Deny(DenyReason::NotOwner),
        },
        Action::AcceptBooking | Action::RejectBooking | Action::CompleteBooking => match resource {
            Resource::Booking { merchant_id, .. } => owner(principal.id == *merchant_id),
            _ => Decision::Deny(DenyReason::NotOwner),
        },
        Action::CancelBooking
        | Action::UpdateBookingNotes
        | Action::ViewBooking
        | Action::PostMessage
        | Action::ReadMessages => match resource {
            Resource::Booking { renter_id, merchant_id } => {
                party(principal.id == *renter_id || principal.id == *merchant_id)
            }
            _ => Decision::Deny(DenyReason::NotParty),
        },
        Action::CreateReview => match resource {
            Resource::Booking { renter_id, .. } => party(principal.id == *renter_id),
            _ => Decision::Deny(DenyReason::NotParty),
        },

        // Regla 3
        Action::CreateBooking => match principal.role {
            PrincipalRole::Renter { license_status: LicenseStatus::Approved } => Decision::Allow,
            PrincipalRole::Renter { .. } => Decision::Deny(DenyReason::LicenseNotApproved),
            _ => Decision::Deny(DenyReason::ForbiddenRole),
        },

        // Regla 4
        Action::CreateVehicle => match principal.role {
            PrincipalRole::Merchant => Decision::Allow,
            _ => Decision::Deny(DenyReason::ForbiddenRole),
        },
        Action::UploadLicense => match principal.role {
            PrincipalRole::Renter { .. } => Decision::Allow,
            _ => Decision::Deny(DenyReason::ForbiddenRole),
        },
        Action::ReviewLicense => Decision::Deny(DenyReason::ForbiddenRole),

        // Regla 5
        Action::ReadPublic => Decision::Allow,
    }
}

fn owner(is_owner: bool) -> Decision {
    if is_owner {
        Decision::Allow
    } else {
        Decision::Deny(DenyReason::NotOwner)
    }
}

fn party(is_party: bool) -> Decision {
    if is_party {
        Decision::Allow
    } else {
        Decision::Deny(DenyReason::NotParty)
    }
}
