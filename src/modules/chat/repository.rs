use uuid::Uuid;

use crate::{
    api::error,
    modules::{
        chat::{
            model::{ChatRow, ParticipantDetailWithChat},
            schema::ChatEntity,
        },
        message::schema::MessageEntity,
    },
};

#[async_trait::async_trait]
pub trait ChatRepository {
    async fn find_by_id(&self, chat_id: &Uuid) -> Result<Option<ChatEntity>, error::SystemError>;

    /// Dedup search for one-on-one chats: a non-group chat whose participant
    /// set is exactly {user_a, user_b}. Must never match group chats.
    async fn find_direct_between(
        &self,
        user_a: &Uuid,
        user_b: &Uuid,
    ) -> Result<Option<ChatEntity>, error::SystemError>;

    /// Creates the chat row plus both participant rows in one transaction.
    async fn create_direct(
        &self,
        name: &str,
        user_a: &Uuid,
        user_b: &Uuid,
    ) -> Result<ChatEntity, error::SystemError>;

    /// Creates the chat row plus all participant rows in one transaction.
    /// `member_ids` is already deduplicated and includes the admin.
    async fn create_group(
        &self,
        name: &str,
        admin_id: &Uuid,
        member_ids: &[Uuid],
    ) -> Result<ChatEntity, error::SystemError>;

    async fn update_name(&self, chat_id: &Uuid, name: &str) -> Result<(), error::SystemError>;

    async fn set_admin(&self, chat_id: &Uuid, user_id: &Uuid) -> Result<(), error::SystemError>;

    /// Cập nhật con trỏ last message; `last_message_at` luôn đổi cùng lúc.
    async fn set_last_message(
        &self,
        chat_id: &Uuid,
        message: Option<&MessageEntity>,
    ) -> Result<(), error::SystemError>;

    async fn delete(&self, chat_id: &Uuid) -> Result<(), error::SystemError>;

    async fn find_row(&self, chat_id: &Uuid) -> Result<Option<ChatRow>, error::SystemError>;

    /// All chats the user participates in, most recently active first.
    async fn find_rows_by_user(&self, user_id: &Uuid)
    -> Result<Vec<ChatRow>, error::SystemError>;
}

#[async_trait::async_trait]
pub trait ParticipantRepository {
    async fn add_many(&self, chat_id: &Uuid, user_ids: &[Uuid]) -> Result<(), error::SystemError>;

    async fn remove(&self, chat_id: &Uuid, user_id: &Uuid) -> Result<(), error::SystemError>;

    /// Participant ids ordered by join time (admin handoff takes the first).
    async fn list_user_ids(&self, chat_id: &Uuid) -> Result<Vec<Uuid>, error::SystemError>;

    async fn is_member(
        &self,
        chat_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<bool, error::SystemError>;

    async fn find_by_chat_ids(
        &self,
        chat_ids: &[Uuid],
    ) -> Result<Vec<ParticipantDetailWithChat>, error::SystemError>;
}
