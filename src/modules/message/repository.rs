use uuid::Uuid;

use crate::modules::message::model::InsertMessage;
use crate::{api::error, modules::message::schema::MessageEntity};

#[async_trait::async_trait]
pub trait MessageRepository {
    async fn create(&self, message: &InsertMessage) -> Result<MessageEntity, error::SystemError>;

    async fn find_by_id(
        &self,
        message_id: &Uuid,
    ) -> Result<Option<MessageEntity>, error::SystemError>;

    /// All messages of a chat, oldest first (initial-load semantics).
    async fn find_by_chat(&self, chat_id: &Uuid)
    -> Result<Vec<MessageEntity>, error::SystemError>;

    /// Next candidate for the chat's last-message pointer after a delete.
    async fn find_latest_in_chat(
        &self,
        chat_id: &Uuid,
    ) -> Result<Option<MessageEntity>, error::SystemError>;

    async fn delete(&self, message_id: &Uuid) -> Result<bool, error::SystemError>;

    async fn delete_by_chat(&self, chat_id: &Uuid) -> Result<u64, error::SystemError>;
}
