use serde::Serialize;
use uuid::Uuid;

use crate::modules::attachment::schema::AttachmentEntity;
use crate::modules::message::schema::MessageEntity;

#[derive(Debug, Clone)]
pub struct InsertMessage {
    pub chat_id: Uuid,
    pub sender_id: Uuid,
    pub content: Option<String>,
}

/// Message cùng danh sách attachments: payload trả về và fan-out
#[derive(Debug, Clone, Serialize)]
pub struct MessageDetail {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub sender_id: Uuid,
    pub content: Option<String>,
    pub attachments: Vec<AttachmentEntity>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl MessageDetail {
    pub fn from_entity(message: MessageEntity, attachments: Vec<AttachmentEntity>) -> Self {
        MessageDetail {
            id: message.id,
            chat_id: message.chat_id,
            sender_id: message.sender_id,
            content: message.content,
            attachments,
            created_at: message.created_at,
        }
    }
}
