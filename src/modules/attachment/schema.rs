use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// Attachment metadata entity from database
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AttachmentEntity {
    pub id: Uuid,
    pub message_id: Uuid,
    pub uploaded_by: Uuid,
    pub url: String,
    pub file_name: String,
    pub mime_type: String,
    pub file_size: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
