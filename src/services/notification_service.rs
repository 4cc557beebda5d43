//! Hook de notificaciones
//!
//! Se invoca después de que una transición ya quedó persistida. Un fallo aquí
//! se registra y se descarta: nunca deshace la operación del núcleo.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::user::LicenseStatus;

/// Eventos publicados por el núcleo
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    BookingRequested { booking_id: Uuid, merchant_id: Uuid, renter_id: Uuid },
    BookingAccepted { booking_id: Uuid, renter_id: Uuid },
    BookingRejected { booking_id: Uuid, renter_id: Uuid },
    BookingCompleted { booking_id: Uuid, renter_id: Uuid },
    BookingCancelled { booking_id: Uuid, cancelled_by: Uuid, notify: Uuid },
    MessagePosted { booking_id: Uuid, message_id: Uuid, sender_id: Uuid, recipient_id: Uuid },
    LicenseReviewed { user_id: Uuid, status: LicenseStatus },
}

impl DomainEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::BookingRequested { .. } => "booking_requested",
            DomainEvent::BookingAccepted { .. } => "booking_accepted",
            DomainEvent::BookingRejected { .. } => "booking_rejected",
            DomainEvent::BookingCompleted { .. } => "booking_completed",
            DomainEvent::BookingCancelled { .. } => "booking_cancelled",
            DomainEvent::MessagePosted { .. } => "message_posted",
            DomainEvent::LicenseReviewed { .. } => "license_reviewed",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("notification delivery failed: {0}")]
pub struct NotificationError(pub String);

/// Entrega de notificaciones (email, push...) implementada fuera del núcleo
#[async_trait]
pub trait NotificationHook: Send + Sync {
    async fn notify(&self, event: &DomainEvent) -> Result<(), NotificationError>;
}

/// Implementación por defecto: deja constancia del evento en los logs
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl NotificationHook for LogNotifier {
    async fn notify(&self, event: &DomainEvent) -> Result<(), NotificationError> {
        tracing::info!(event = event.name(), payload = ?event, "📨 Notificación");
        Ok(())
    }
}

/// Envía el evento e ignora el resultado salvo para registrarlo
pub async fn dispatch(hook: &Arc<dyn NotificationHook>, event: DomainEvent) {
    if let Err(e) = hook.notify(&event).await {
        tracing::warn!(event = event.name(), error = %e, "Notificación descartada");
    }
}
