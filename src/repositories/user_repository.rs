use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::user::{LicenseStatus, MerchantProfile, RenterProfile, Role, User, UserProfile};
use crate::utils::errors::AppResult;

/// Lectura de usuarios y mutación del estado de licencia
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Cambia el estado de licencia de un renter. `license_url = None` conserva la URL actual.
    /// Devuelve `None` si el usuario no existe o no es renter.
    async fn update_renter_license(
        &self,
        id: Uuid,
        license_url: Option<String>,
        status: LicenseStatus,
        now: DateTime<Utc>,
    ) -> AppResult<Option<User>>;

    async fn list_pending_licenses(&self) -> AppResult<Vec<User>>;
}

/// Fila plana de la tabla users
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    first_name: String,
    last_name: String,
    phone: Option<String>,
    role: Role,
    license_status: Option<LicenseStatus>,
    license_url: Option<String>,
    business_name: Option<String>,
    business_address: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        let profile = match row.role {
            Role::Renter => UserProfile::Renter(RenterProfile {
                license_status: row.license_status.unwrap_or(LicenseStatus::Pending),
                license_url: row.license_url,
            }),
            Role::Merchant => UserProfile::Merchant(MerchantProfile {
                business_name: row.business_name,
                business_address: row.business_address,
            }),
            Role::Admin => UserProfile::Admin,
        };

        User {
            id: row.id,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            phone: row.phone,
            profile,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const USER_COLUMNS: &str = "id, email, first_name, last_name, phone, role, license_status, \
     license_url, business_name, business_address, created_at, updated_at";

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(User::from))
    }

    async fn update_renter_license(
        &self,
        id: Uuid,
        license_url: Option<String>,
        status: LicenseStatus,
        now: DateTime<Utc>,
    ) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users
            SET license_status = $2,
                license_url = COALESCE($3, license_url),
                license_approved_at = CASE WHEN $2 = 'APPROVED'::license_status THEN $4 ELSE NULL END,
                updated_at = $4
            WHERE id = $1 AND role = 'RENTER'
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(id)
        .bind(status)
        .bind(license_url)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn list_pending_licenses(&self) -> AppResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE role = 'RENTER' AND license_status = 'PENDING' ORDER BY created_at DESC",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }
}
