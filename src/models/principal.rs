//! Principal autenticado
//!
//! El principal llega ya resuelto (id + rol + estado de licencia) desde la
//! capa de autenticación. El núcleo nunca vuelve a verificar credenciales.

use serde::Serialize;
use uuid::Uuid;

use super::user::{LicenseStatus, Role, User, UserProfile};

/// Capacidad del principal según su rol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "role", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrincipalRole {
    Merchant,
    Renter { license_status: LicenseStatus },
    Admin,
}

/// Actor autenticado que ejecuta una operación
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub id: Uuid,
    #[serde(flatten)]
    pub role: PrincipalRole,
}

impl Principal {
    pub fn merchant(id: Uuid) -> Self {
        Self { id, role: PrincipalRole::Merchant }
    }

    pub fn renter(id: Uuid, license_status: LicenseStatus) -> Self {
        Self { id, role: PrincipalRole::Renter { license_status } }
    }

    pub fn admin(id: Uuid) -> Self {
        Self { id, role: PrincipalRole::Admin }
    }

    pub fn kind(&self) -> Role {
        match self.role {
            PrincipalRole::Merchant => Role::Merchant,
            PrincipalRole::Renter { .. } => Role::Renter,
            PrincipalRole::Admin => Role::Admin,
        }
    }

    pub fn license_status(&self) -> Option<LicenseStatus> {
        match self.role {
            PrincipalRole::Renter { license_status } => Some(license_status),
            _ => None,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.role, PrincipalRole::Admin)
    }
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        match &user.profile {
            UserProfile::Merchant(_) => Principal::merchant(user.id),
            UserProfile::Renter(renter) => Principal::renter(user.id, renter.license_status),
            UserProfile::Admin => Principal::admin(user.id),
        }
    }
}
