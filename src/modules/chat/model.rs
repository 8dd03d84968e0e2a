use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Raw row: chat + last message projection, before participants are attached
#[derive(FromRow)]
pub struct ChatRaw {
    pub id: Uuid,
    pub name: String,
    pub is_group_chat: bool,
    pub admin_id: Option<Uuid>,
    pub last_message_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,

    pub last_message_id: Option<Uuid>,
    pub last_content: Option<String>,
    pub last_sender_id: Option<Uuid>,
    pub last_created_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LastMessageRow {
    pub message_id: Uuid,
    pub content: Option<String>,
    pub sender_id: Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRow {
    pub chat_id: Uuid,
    pub name: String,
    pub is_group_chat: bool,
    pub admin_id: Option<Uuid>,
    pub last_message: Option<LastMessageRow>,
    pub last_message_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ParticipantRow {
    pub user_id: Uuid,
    pub username: String,
    pub avatar_url: Option<String>,
    pub joined_at: chrono::DateTime<chrono::Utc>,
}

/// Participant row còn mang chat_id, dùng để gom theo chat khi list
#[derive(Debug, Clone, FromRow)]
pub struct ParticipantDetailWithChat {
    pub chat_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub avatar_url: Option<String>,
    pub joined_at: chrono::DateTime<chrono::Utc>,
}

/// Full chat projection: what clients render and what fan-out events carry
#[derive(Debug, Clone, Serialize)]
pub struct ChatDetail {
    pub chat_id: Uuid,
    pub name: String,
    pub is_group_chat: bool,
    pub admin_id: Option<Uuid>,
    pub participants: Vec<ParticipantRow>,
    pub last_message: Option<LastMessageRow>,
    pub last_message_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl ChatRow {
    pub fn into_detail(self, participants: Vec<ParticipantRow>) -> ChatDetail {
        ChatDetail {
            chat_id: self.chat_id,
            name: self.name,
            is_group_chat: self.is_group_chat,
            admin_id: self.admin_id,
            participants,
            last_message: self.last_message,
            last_message_at: self.last_message_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

// === Request DTOs ===

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewDirectChat {
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewGroupChat {
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    pub member_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RenameGroupChat {
    #[validate(length(min = 1, max = 128))]
    pub name: String,
}

/// `user_ids` accepts a single id or a list of ids
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddParticipants {
    #[serde(deserialize_with = "crate::utils::one_or_many")]
    pub user_ids: Vec<Uuid>,
}
