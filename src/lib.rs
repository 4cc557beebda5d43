//! Núcleo de un marketplace de alquiler de vehículos entre particulares:
//! autorización por capacidades, disponibilidad por fechas y ciclo de vida
//! de la reserva, con su API HTTP.

pub mod config;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
