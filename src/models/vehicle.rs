//! Modelo de Vehicle
//!
//! Este módulo contiene el struct Vehicle y sus variantes para CRUD operations.
//! Mapea exactamente a la tabla vehicles; `is_available` es la visibilidad del
//! anuncio controlada por el merchant, distinta de la disponibilidad por fechas.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;
use chrono::{DateTime, Utc};
use uuid::Uuid;
use rust_decimal::Decimal;

/// Vehicle principal - mapea a la tabla vehicles
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vehicle {
    pub id: Uuid,
    pub merchant_id: Uuid,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub color: String,
    pub license_plate: String,
    pub price_per_hour: Decimal,
    pub price_per_day: Decimal,
    pub seats: i32,
    pub fuel_type: String,
    pub transmission: String,
    pub mileage: Option<i32>,
    pub description: Option<String>,
    pub features: Vec<String>,
    pub images: Vec<String>,
    pub location: Option<String>,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Vehicle {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Request para crear un nuevo vehículo
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateVehicleRequest {
    #[validate(length(min = 1, max = 100))]
    pub make: String,

    #[validate(length(min = 1, max = 100))]
    pub model: String,

    #[validate(range(min = 1900, max = 2100))]
    pub year: i32,

    #[validate(length(min = 1, max = 50))]
    pub color: String,

    #[validate(length(min = 2, max = 20))]
    pub license_plate: String,

    pub price_per_hour: Decimal,

    pub price_per_day: Decimal,

    #[validate(range(min = 1, max = 60))]
    pub seats: i32,

    #[validate(length(min = 1, max = 30))]
    pub fuel_type: String,

    #[validate(length(min = 1, max = 30))]
    pub transmission: String,

    pub mileage: Option<i32>,
    pub description: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub location: Option<String>,
    #[serde(default = "default_available")]
    pub is_available: bool,
}

fn default_available() -> bool {
    true
}

/// Request para actualizar un vehículo existente
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateVehicleRequest {
    #[validate(length(min = 1, max = 100))]
    pub make: Option<String>,

    #[validate(length(min = 1, max = 100))]
    pub model: Option<String>,

    #[validate(range(min = 1900, max = 2100))]
    pub year: Option<i32>,

    #[validate(length(min = 1, max = 50))]
    pub color: Option<String>,

    pub price_per_hour: Option<Decimal>,
    pub price_per_day: Option<Decimal>,

    #[validate(range(min = 1, max = 60))]
    pub seats: Option<i32>,

    pub fuel_type: Option<String>,
    pub transmission: Option<String>,
    pub mileage: Option<i32>,
    pub description: Option<String>,
    pub features: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
    pub location: Option<String>,
    pub is_available: Option<bool>,
}

impl UpdateVehicleRequest {
    /// Aplica los cambios presentes sobre una copia del vehículo
    pub fn apply_to(self, vehicle: &mut Vehicle) {
        if let Some(make) = self.make { vehicle.make = make; }
        if let Some(model) = self.model { vehicle.model = model; }
        if let Some(year) = self.year { vehicle.year = year; }
        if let Some(color) = self.color { vehicle.color = color; }
        if let Some(price) = self.price_per_hour { vehicle.price_per_hour = price; }
        if let Some(price) = self.price_per_day { vehicle.price_per_day = price; }
        if let Some(seats) = self.seats { vehicle.seats = seats; }
        if let Some(fuel_type) = self.fuel_type { vehicle.fuel_type = fuel_type; }
        if let Some(transmission) = self.transmission { vehicle.transmission = transmission; }
        if self.mileage.is_some() { vehicle.mileage = self.mileage; }
        if self.description.is_some() { vehicle.description = self.description; }
        if let Some(features) = self.features { vehicle.features = features; }
        if let Some(images) = self.images { vehicle.images = images; }
        if self.location.is_some() { vehicle.location = self.location; }
        if let Some(is_available) = self.is_available { vehicle.is_available = is_available; }
    }
}

/// Filtros para listar vehículos
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VehicleFilters {
    pub available: Option<bool>,
}

/// Vehículo listo para insertar
#[derive(Debug, Clone)]
pub struct NewVehicle {
    pub merchant_id: Uuid,
    pub request: CreateVehicleRequest,
    pub created_at: DateTime<Utc>,
}

impl NewVehicle {
    pub fn into_vehicle(self, id: Uuid) -> Vehicle {
        let request = self.request;
        Vehicle {
            id,
            merchant_id: self.merchant_id,
            make: request.make,
            model: request.model,
            year: request.year,
            color: request.color,
            license_plate: request.license_plate,
            price_per_hour: request.price_per_hour,
            price_per_day: request.price_per_day,
            seats: request.seats,
            fuel_type: request.fuel_type,
            transmission: request.transmission,
            mileage: request.mileage,
            description: request.description,
            features: request.features,
            images: request.images,
            location: request.location,
            is_available: request.is_available,
            created_at: self.created_at,
            updated_at: self.created_at,
            deleted_at: None,
        }
    }
}
