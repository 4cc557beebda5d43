//! Conversación de una reserva
//!
//! Solo las dos partes de la reserva leen y escriben. Un admin puede leer.
//! El estado de la reserva no restringe la mensajería.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::models::booking::Booking;
use crate::models::message::{CreateMessageRequest, Message, NewMessage};
use crate::models::principal::Principal;
use crate::repositories::{BookingRepository, MessageRepository, Repositories};
use crate::services::authorization_service::{self, Action, Resource};
use crate::services::notification_service::{dispatch, DomainEvent, NotificationHook};
use crate::utils::errors::{not_found_error, AppError, AppResult};

pub struct ConversationService {
    bookings: Arc<dyn BookingRepository>,
    messages: Arc<dyn MessageRepository>,
    notifier: Arc<dyn NotificationHook>,
}

impl ConversationService {
    pub fn new(repositories: &Repositories, notifier: Arc<dyn NotificationHook>) -> Self {
        Self {
            bookings: repositories.bookings.clone(),
            messages: repositories.messages.clone(),
            notifier,
        }
    }

    pub async fn send_message(
        &self,
        principal: &Principal,
        booking_id: Uuid,
        request: CreateMessageRequest,
        now: DateTime<Utc>,
    ) -> AppResult<Message> {
        let booking = self.load(booking_id).await?;
        authorization_service::require(principal, Action::PostMessage, &Resource::from(&booking))?;

        let content = request.content.trim();
        if content.is_empty() {
            return Err(AppError::EmptyContent);
        }
        request.validate()?;

        let message = self
            .messages
            .create_message(NewMessage {
                booking_id: booking.id,
                sender_id: principal.id,
                content: content.to_string(),
                created_at: now,
            })
            .await?;

        info!("💬 Mensaje {} en la reserva {} de {}", message.id, booking.id, principal.id);

        let recipient_id = if principal.id == booking.renter_id {
            booking.merchant_id
        } else {
            booking.renter_id
        };

        dispatch(
            &self.notifier,
            DomainEvent::MessagePosted {
                booking_id: booking.id,
                message_id: message.id,
                sender_id: principal.id,
                recipient_id,
            },
        )
        .await;

        Ok(message)
    }

    /// Mensajes de la reserva en orden de creación
    pub async fn list_messages(&self, principal: &Principal, booking_id: Uuid) -> AppResult<Vec<Message>> {
        let booking = self.load(booking_id).await?;
        authorization_service::require(principal, Action::ReadMessages, &Resource::from(&booking))?;

        self.messages.list_messages(booking.id).await
    }

    async fn load(&self, booking_id: Uuid) -> AppResult<Booking> {
        self.bookings
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| not_found_error("Booking", &booking_id))
    }
}
