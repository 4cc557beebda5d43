//! Utilidades del sistema
//!
//! Este módulo contiene utilidades para manejo de errores, validación
//! y verificación de JWT.

pub mod errors;
pub mod validation;
pub mod jwt;
