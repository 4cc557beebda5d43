use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::message::{Message, NewMessage};
use crate::utils::errors::AppResult;

#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn create_message(&self, message: NewMessage) -> AppResult<Message>;

    /// Mensajes de la reserva, más antiguos primero
    async fn list_messages(&self, booking_id: Uuid) -> AppResult<Vec<Message>>;
}

pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn create_message(&self, message: NewMessage) -> AppResult<Message> {
        let message = message.into_message(Uuid::new_v4());

        let created = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (id, booking_id, sender_id, content, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(message.id)
        .bind(message.booking_id)
        .bind(message.sender_id)
        .bind(message.content)
        .bind(message.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn list_messages(&self, booking_id: Uuid) -> AppResult<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(
            "SELECT * FROM messages WHERE booking_id = $1 ORDER BY created_at ASC, seq ASC",
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }
}
