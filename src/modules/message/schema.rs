use serde::Serialize;
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// `content` có thể NULL khi message chỉ gồm attachments.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MessageEntity {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub sender_id: Uuid,
    pub content: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
