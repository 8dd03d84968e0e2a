#![allow(dead_code)]
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// Chat row. `admin_id` chỉ có với group chat; direct chat luôn NULL.
#[derive(Debug, Clone, FromRow)]
pub struct ChatEntity {
    pub id: Uuid,
    pub name: String,
    pub is_group_chat: bool,
    pub admin_id: Option<Uuid>,
    pub last_message_id: Option<Uuid>,
    pub last_message_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ChatParticipantEntity {
    pub chat_id: Uuid,
    pub user_id: Uuid,
    pub joined_at: chrono::DateTime<chrono::Utc>,
}
