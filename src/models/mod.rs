//! Modelos del sistema
//!
//! Este módulo contiene todos los modelos de datos que mapean
//! al schema PostgreSQL del marketplace.

pub mod user;
pub mod principal;
pub mod vehicle;
pub mod booking;
pub mod message;
pub mod review;
