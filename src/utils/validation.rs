//! Utilidades de validación
//!
//! Este módulo contiene funciones helper para validación de datos
//! que no cubren los derives de `validator`.

use rust_decimal::Decimal;
use validator::ValidationError;
use serde::Serialize;

/// Mayor importe que cabe en una columna NUMERIC(10, 2)
pub fn max_price() -> Decimal {
    Decimal::new(9_999_999_999, 2)
}

/// Validar que un valor sea positivo
pub fn validate_positive<T: PartialOrd + std::fmt::Display + num_traits::Zero + Serialize>(
    value: T,
) -> Result<(), ValidationError> {
    if value <= T::zero() {
        let mut error = ValidationError::new("positive");
        error.add_param("value".into(), &value);
        return Err(error);
    }
    Ok(())
}

/// Validar un precio: positivo y dentro del rango almacenable
pub fn validate_price(value: Decimal) -> Result<(), ValidationError> {
    validate_positive(value)?;
    if value > max_price() {
        let mut error = ValidationError::new("max_price");
        error.add_param("value".into(), &value);
        error.add_param("max".into(), &max_price());
        return Err(error);
    }
    Ok(())
}

/// Validar que la URL use http o https (el formato lo valida `#[validate(url)]`)
pub fn validate_http_url(value: &str) -> Result<(), ValidationError> {
    let scheme = value.trim().split("://").next().unwrap_or_default().to_ascii_lowercase();
    if scheme != "http" && scheme != "https" {
        let mut error = ValidationError::new("url_scheme");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar formato de matrícula de vehículo
pub fn validate_license_plate(value: &str) -> Result<(), ValidationError> {
    let clean_plate = value.replace([' ', '-', '_'], "");
    if clean_plate.len() < 2 || clean_plate.len() > 10 || !clean_plate.chars().all(|c| c.is_ascii_alphanumeric()) {
        let mut error = ValidationError::new("license_plate");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}
