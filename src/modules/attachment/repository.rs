use uuid::Uuid;

use crate::{
    api::error,
    modules::attachment::{model::NewAttachment, schema::AttachmentEntity},
};

#[async_trait::async_trait]
pub trait AttachmentRepository {
    async fn create_many(
        &self,
        attachments: &[NewAttachment],
    ) -> Result<Vec<AttachmentEntity>, error::SystemError>;

    async fn find_by_message(
        &self,
        message_id: &Uuid,
    ) -> Result<Vec<AttachmentEntity>, error::SystemError>;

    /// All attachments of every message in the chat, for cascade delete.
    async fn find_by_chat(
        &self,
        chat_id: &Uuid,
    ) -> Result<Vec<AttachmentEntity>, error::SystemError>;

    async fn delete_by_message(&self, message_id: &Uuid) -> Result<u64, error::SystemError>;

    async fn delete_by_chat(&self, chat_id: &Uuid) -> Result<u64, error::SystemError>;
}
