//! Servicio de vehículos
//!
//! CRUD de los anuncios de un merchant. El borrado es lógico: las reservas
//! existentes siguen apuntando al vehículo.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::principal::Principal;
use crate::models::vehicle::{CreateVehicleRequest, NewVehicle, UpdateVehicleRequest, Vehicle, VehicleFilters};
use crate::repositories::{Repositories, VehicleRepository};
use crate::services::authorization_service::{self, Action, Resource};
use crate::utils::errors::{conflict_error, field_error, not_found_error, AppResult};
use crate::utils::validation::{validate_license_plate, validate_price};

pub struct VehicleService {
    vehicles: Arc<dyn VehicleRepository>,
}

impl VehicleService {
    pub fn new(repositories: &Repositories) -> Self {
        Self { vehicles: repositories.vehicles.clone() }
    }

    /// Listado público
    pub async fn list_vehicles(&self, filters: &VehicleFilters) -> AppResult<Vec<Vehicle>> {
        self.vehicles.list_vehicles(filters).await
    }

    /// Detalle público
    pub async fn get_vehicle(&self, id: Uuid) -> AppResult<Vehicle> {
        self.vehicles
            .get_vehicle(id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", &id))
    }

    pub async fn list_my_vehicles(&self, principal: &Principal) -> AppResult<Vec<Vehicle>> {
        self.vehicles.list_by_merchant(principal.id).await
    }

    pub async fn create_vehicle(
        &self,
        principal: &Principal,
        mut request: CreateVehicleRequest,
        now: DateTime<Utc>,
    ) -> AppResult<Vehicle> {
        authorization_service::require(principal, Action::CreateVehicle, &Resource::None)?;

        request.validate()?;
        check_field("price_per_hour", validate_price(request.price_per_hour))?;
        check_field("price_per_day", validate_price(request.price_per_day))?;
        check_field("license_plate", validate_license_plate(&request.license_plate))?;

        request.license_plate = request.license_plate.trim().to_uppercase();
        if self.vehicles.license_plate_exists(&request.license_plate).await? {
            return Err(conflict_error("Vehicle", "license plate", &request.license_plate));
        }

        let vehicle = self
            .vehicles
            .create_vehicle(NewVehicle { merchant_id: principal.id, request, created_at: now })
            .await?;

        info!("🚗 Vehículo {} ({}) creado por {}", vehicle.id, vehicle.license_plate, principal.id);

        Ok(vehicle)
    }

    pub async fn update_vehicle(
        &self,
        principal: &Principal,
        id: Uuid,
        request: UpdateVehicleRequest,
        now: DateTime<Utc>,
    ) -> AppResult<Vehicle> {
        let mut vehicle = self.get_vehicle(id).await?;
        authorization_service::require(principal, Action::UpdateVehicle, &Resource::from(&vehicle))?;

        request.validate()?;
        if let Some(price) = request.price_per_hour {
            check_field("price_per_hour", validate_price(price))?;
        }
        if let Some(price) = request.price_per_day {
            check_field("price_per_day", validate_price(price))?;
        }

        request.apply_to(&mut vehicle);
        vehicle.updated_at = now;

        let updated = self
            .vehicles
            .update_vehicle(&vehicle)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", &id))?;

        info!("✏️ Vehículo {} actualizado por {}", updated.id, principal.id);

        Ok(updated)
    }

    pub async fn delete_vehicle(&self, principal: &Principal, id: Uuid, now: DateTime<Utc>) -> AppResult<()> {
        let vehicle = self.get_vehicle(id).await?;
        authorization_service::require(principal, Action::DeleteVehicle, &Resource::from(&vehicle))?;

        if !self.vehicles.delete_vehicle(id, now).await? {
            return Err(not_found_error("Vehicle", &id));
        }

        info!("🗑️ Vehículo {} eliminado por {}", id, principal.id);

        Ok(())
    }
}

fn check_field(field: &'static str, result: Result<(), ValidationError>) -> AppResult<()> {
    result.map_err(|error| field_error(field, error))
}
