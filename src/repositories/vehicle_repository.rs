use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::vehicle::{NewVehicle, Vehicle, VehicleFilters};
use crate::utils::errors::{conflict_error, AppError, AppResult};

/// Acceso a vehículos. Los vehículos borrados (soft delete) no se devuelven.
#[async_trait]
pub trait VehicleRepository: Send + Sync {
    async fn get_vehicle(&self, id: Uuid) -> AppResult<Option<Vehicle>>;
    async fn list_vehicles(&self, filters: &VehicleFilters) -> AppResult<Vec<Vehicle>>;
    async fn list_by_merchant(&self, merchant_id: Uuid) -> AppResult<Vec<Vehicle>>;
    async fn license_plate_exists(&self, license_plate: &str) -> AppResult<bool>;
    async fn create_vehicle(&self, vehicle: NewVehicle) -> AppResult<Vehicle>;
    /// Persiste los campos editables del vehículo. `merchant_id` no se toca.
    async fn update_vehicle(&self, vehicle: &Vehicle) -> AppResult<Option<Vehicle>>;
    async fn delete_vehicle(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<bool>;
}

pub struct PgVehicleRepository {
    pool: PgPool,
}

impl PgVehicleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VehicleRepository for PgVehicleRepository {
    async fn get_vehicle(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            "SELECT * FROM vehicles WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(vehicle)
    }

    async fn list_vehicles(&self, filters: &VehicleFilters) -> AppResult<Vec<Vehicle>> {
        let vehicles = sqlx::query_as::<_, Vehicle>(
            r#"
            SELECT * FROM vehicles
            WHERE deleted_at IS NULL
            AND ($1::boolean IS NULL OR is_available = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filters.available)
        .fetch_all(&self.pool)
        .await?;

        Ok(vehicles)
    }

    async fn list_by_merchant(&self, merchant_id: Uuid) -> AppResult<Vec<Vehicle>> {
        let vehicles = sqlx::query_as::<_, Vehicle>(
            "SELECT * FROM vehicles WHERE merchant_id = $1 AND deleted_at IS NULL ORDER BY created_at DESC",
        )
        .bind(merchant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(vehicles)
    }

    async fn license_plate_exists(&self, license_plate: &str) -> AppResult<bool> {
        let result: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM vehicles WHERE license_plate = $1 AND deleted_at IS NULL)",
        )
        .bind(license_plate)
        .fetch_one(&self.pool)
        .await?;

        Ok(result.0)
    }

    async fn create_vehicle(&self, vehicle: NewVehicle) -> AppResult<Vehicle> {
        let vehicle = vehicle.into_vehicle(Uuid::new_v4());
        let license_plate = vehicle.license_plate.clone();

        sqlx::query_as::<_, Vehicle>(
            r#"
            INSERT INTO vehicles (
                id, merchant_id, make, model, year, color, license_plate,
                price_per_hour, price_per_day, seats, fuel_type, transmission,
                mileage, description, features, images, location, is_available,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $19)
            RETURNING *
            "#,
        )
        .bind(vehicle.id)
        .bind(vehicle.merchant_id)
        .bind(vehicle.make)
        .bind(vehicle.model)
        .bind(vehicle.year)
        .bind(vehicle.color)
        .bind(vehicle.license_plate)
        .bind(vehicle.price_per_hour)
        .bind(vehicle.price_per_day)
        .bind(vehicle.seats)
        .bind(vehicle.fuel_type)
        .bind(vehicle.transmission)
        .bind(vehicle.mileage)
        .bind(vehicle.description)
        .bind(vehicle.features)
        .bind(vehicle.images)
        .bind(vehicle.location)
        .bind(vehicle.is_available)
        .bind(vehicle.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if AppError::is_unique_violation(&e) {
                conflict_error("Vehicle", "license plate", &license_plate)
            } else {
                AppError::from(e)
            }
        })
    }

    async fn update_vehicle(&self, vehicle: &Vehicle) -> AppResult<Option<Vehicle>> {
        let updated = sqlx::query_as::<_, Vehicle>(
            r#"
            UPDATE vehicles
            SET make = $2, model = $3, year = $4, color = $5, price_per_hour = $6,
                price_per_day = $7, seats = $8, fuel_type = $9, transmission = $10,
                mileage = $11, description = $12, features = $13, images = $14,
                location = $15, is_available = $16, updated_at = $17
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(vehicle.id)
        .bind(&vehicle.make)
        .bind(&vehicle.model)
        .bind(vehicle.year)
        .bind(&vehicle.color)
        .bind(vehicle.price_per_hour)
        .bind(vehicle.price_per_day)
        .bind(vehicle.seats)
        .bind(&vehicle.fuel_type)
        .bind(&vehicle.transmission)
        .bind(vehicle.mileage)
        .bind(&vehicle.description)
        .bind(&vehicle.features)
        .bind(&vehicle.images)
        .bind(&vehicle.location)
        .bind(vehicle.is_available)
        .bind(vehicle.updated_at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(updated)
    }

    async fn delete_vehicle(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE vehicles SET deleted_at = $2, is_available = FALSE WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
