//! Modelo de User
//!
//! Este módulo contiene el usuario del marketplace con su perfil por rol.
//! Los campos de licencia solo existen en el perfil de RENTER y los datos
//! de negocio solo en el de MERCHANT.

use serde::{Deserialize, Serialize};
use sqlx::Type;
use validator::Validate;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Rol del usuario - mapea al ENUM user_role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Merchant,
    Renter,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Merchant => "MERCHANT",
            Role::Renter => "RENTER",
            Role::Admin => "ADMIN",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "MERCHANT" => Some(Role::Merchant),
            "RENTER" => Some(Role::Renter),
            "ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Estado de la licencia de conducir - mapea al ENUM license_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "license_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LicenseStatus {
    Pending,
    Approved,
    Rejected,
}

/// Perfil de renter: la licencia solo tiene sentido aquí
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenterProfile {
    pub license_status: LicenseStatus,
    pub license_url: Option<String>,
}

/// Perfil de merchant con sus datos de negocio
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MerchantProfile {
    pub business_name: Option<String>,
    pub business_address: Option<String>,
}

/// Perfil etiquetado por rol. El rol de un usuario no cambia tras el registro.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "role", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserProfile {
    Merchant(MerchantProfile),
    Renter(RenterProfile),
    Admin,
}

impl UserProfile {
    pub fn role(&self) -> Role {
        match self {
            UserProfile::Merchant(_) => Role::Merchant,
            UserProfile::Renter(_) => Role::Renter,
            UserProfile::Admin => Role::Admin,
        }
    }
}

/// Usuario del marketplace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub profile: UserProfile,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn role(&self) -> Role {
        self.profile.role()
    }

    pub fn license_status(&self) -> Option<LicenseStatus> {
        match &self.profile {
            UserProfile::Renter(renter) => Some(renter.license_status),
            _ => None,
        }
    }
}

/// Request para subir (o re-subir) la licencia de un renter
#[derive(Debug, Deserialize, Validate)]
pub struct UploadLicenseRequest {
    #[validate(length(min = 1, max = 2048), url)]
    pub license_url: String,
}

/// Request de un admin para aprobar o rechazar una licencia
#[derive(Debug, Deserialize)]
pub struct ReviewLicenseRequest {
    pub status: LicenseStatus,
}

/// Response de usuario para la API
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub license_status: Option<LicenseStatus>,
    pub license_url: Option<String>,
    pub business_name: Option<String>,
    pub business_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        let role = user.role();
        let (license_status, license_url, business_name, business_address) = match user.profile {
            UserProfile::Renter(renter) => (Some(renter.license_status), renter.license_url, None, None),
            UserProfile::Merchant(merchant) => (None, None, merchant.business_name, merchant.business_address),
            UserProfile::Admin => (None, None, None, None),
        };

        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            phone: user.phone,
            role,
            license_status,
            license_url,
            business_name,
            business_address,
            created_at: user.created_at,
        }
    }
}
