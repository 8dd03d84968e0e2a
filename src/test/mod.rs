#![allow(dead_code)]
//! In-memory repository + storage implementations cho service tests.
//! Giữ đúng semantics của các Pg implementations (dedup, cascade,
//! ordering) nhưng state nằm trong một MemStore chia sẻ qua Arc.

use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::api::error;
use crate::modules::attachment::model::{NewAttachment, StoredFile};
use crate::modules::attachment::repository::AttachmentRepository;
use crate::modules::attachment::schema::AttachmentEntity;
use crate::modules::attachment::storage::AttachmentStorage;
use crate::modules::chat::model::{ChatRow, LastMessageRow, ParticipantDetailWithChat};
use crate::modules::chat::repository::{ChatRepository, ParticipantRepository};
use crate::modules::chat::schema::{ChatEntity, ChatParticipantEntity};
use crate::modules::message::model::InsertMessage;
use crate::modules::message::repository::MessageRepository;
use crate::modules::message::schema::MessageEntity;
use crate::modules::user::repository::UserRepository;
use crate::modules::user::schema::{LoginType, UserEntity, UserRole};

#[derive(Default)]
pub struct MemStore {
    pub users: Mutex<Vec<UserEntity>>,
    pub chats: Mutex<Vec<ChatEntity>>,
    pub participants: Mutex<Vec<ChatParticipantEntity>>,
    pub messages: Mutex<Vec<MessageEntity>>,
    pub attachments: Mutex<Vec<AttachmentEntity>>,
}

impl MemStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_user(self: &Arc<Self>, username: &str) -> UserEntity {
        let now = chrono::Utc::now();
        let user = UserEntity {
            id: Uuid::now_v7(),
            username: username.to_string(),
            email: format!("{}@example.com", username),
            avatar_url: None,
            login_type: LoginType::Password,
            email_verified: true,
            role: UserRole::User,
            created_at: now,
            updated_at: now,
        };
        self.users.lock().unwrap().push(user.clone());
        user
    }

    fn username_of(&self, user_id: &Uuid) -> String {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == *user_id)
            .map(|u| u.username.clone())
            .unwrap_or_default()
    }

    fn chat_row(&self, chat: &ChatEntity) -> ChatRow {
        let last_message = chat.last_message_id.and_then(|id| {
            self.messages.lock().unwrap().iter().find(|m| m.id == id).map(|m| LastMessageRow {
                message_id: m.id,
                content: m.content.clone(),
                sender_id: m.sender_id,
                created_at: m.created_at,
            })
        });

        ChatRow {
            chat_id: chat.id,
            name: chat.name.clone(),
            is_group_chat: chat.is_group_chat,
            admin_id: chat.admin_id,
            last_message,
            last_message_at: chat.last_message_at,
            created_at: chat.created_at,
            updated_at: chat.updated_at,
        }
    }
}

// === Users ===

pub struct MemUserRepository(pub Arc<MemStore>);

#[async_trait::async_trait]
impl UserRepository for MemUserRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<UserEntity>, error::SystemError> {
        Ok(self.0.users.lock().unwrap().iter().find(|u| u.id == *id).cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<UserEntity>, error::SystemError> {
        Ok(self.0.users.lock().unwrap().iter().filter(|u| ids.contains(&u.id)).cloned().collect())
    }
}

// === Chats ===

pub struct MemChatRepository(pub Arc<MemStore>);

impl MemChatRepository {
    fn participant_ids(&self, chat_id: &Uuid) -> Vec<Uuid> {
        self.0
            .participants
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.chat_id == *chat_id)
            .map(|p| p.user_id)
            .collect()
    }
}

#[async_trait::async_trait]
impl ChatRepository for MemChatRepository {
    async fn find_by_id(&self, chat_id: &Uuid) -> Result<Option<ChatEntity>, error::SystemError> {
        Ok(self.0.chats.lock().unwrap().iter().find(|c| c.id == *chat_id).cloned())
    }

    async fn find_direct_between(
        &self,
        user_a: &Uuid,
        user_b: &Uuid,
    ) -> Result<Option<ChatEntity>, error::SystemError> {
        let chats = self.0.chats.lock().unwrap().clone();
        for chat in chats {
            if chat.is_group_chat {
                continue;
            }
            let mut members = self.participant_ids(&chat.id);
            members.sort();
            let mut pair = vec![*user_a, *user_b];
            pair.sort();
            if members == pair {
                return Ok(Some(chat));
            }
        }
        Ok(None)
    }

    async fn create_direct(
        &self,
        name: &str,
        user_a: &Uuid,
        user_b: &Uuid,
    ) -> Result<ChatEntity, error::SystemError> {
        let now = chrono::Utc::now();
        let chat = ChatEntity {
            id: Uuid::now_v7(),
            name: name.to_string(),
            is_group_chat: false,
            admin_id: None,
            last_message_id: None,
            last_message_at: None,
            created_at: now,
            updated_at: now,
        };
        self.0.chats.lock().unwrap().push(chat.clone());

        let mut participants = self.0.participants.lock().unwrap();
        for user_id in [user_a, user_b] {
            participants.push(ChatParticipantEntity {
                chat_id: chat.id,
                user_id: *user_id,
                joined_at: chrono::Utc::now(),
            });
        }
        Ok(chat)
    }

    async fn create_group(
        &self,
        name: &str,
        admin_id: &Uuid,
        member_ids: &[Uuid],
    ) -> Result<ChatEntity, error::SystemError> {
        let now = chrono::Utc::now();
        let chat = ChatEntity {
            id: Uuid::now_v7(),
            name: name.to_string(),
            is_group_chat: true,
            admin_id: Some(*admin_id),
            last_message_id: None,
            last_message_at: None,
            created_at: now,
            updated_at: now,
        };
        self.0.chats.lock().unwrap().push(chat.clone());

        let mut participants = self.0.participants.lock().unwrap();
        for user_id in member_ids {
            participants.push(ChatParticipantEntity {
                chat_id: chat.id,
                user_id: *user_id,
                joined_at: chrono::Utc::now(),
            });
        }
        Ok(chat)
    }

    async fn update_name(&self, chat_id: &Uuid, name: &str) -> Result<(), error::SystemError> {
        let mut chats = self.0.chats.lock().unwrap();
        if let Some(chat) = chats.iter_mut().find(|c| c.id == *chat_id) {
            chat.name = name.to_string();
            chat.updated_at = chrono::Utc::now();
        }
        Ok(())
    }

    async fn set_admin(&self, chat_id: &Uuid, user_id: &Uuid) -> Result<(), error::SystemError> {
        let mut chats = self.0.chats.lock().unwrap();
        if let Some(chat) = chats.iter_mut().find(|c| c.id == *chat_id) {
            chat.admin_id = Some(*user_id);
            chat.updated_at = chrono::Utc::now();
        }
        Ok(())
    }

    async fn set_last_message(
        &self,
        chat_id: &Uuid,
        message: Option<&MessageEntity>,
    ) -> Result<(), error::SystemError> {
        let mut chats = self.0.chats.lock().unwrap();
        if let Some(chat) = chats.iter_mut().find(|c| c.id == *chat_id) {
            chat.last_message_id = message.map(|m| m.id);
            chat.last_message_at = message.map(|m| m.created_at);
            chat.updated_at = chrono::Utc::now();
        }
        Ok(())
    }

    async fn delete(&self, chat_id: &Uuid) -> Result<(), error::SystemError> {
        self.0.chats.lock().unwrap().retain(|c| c.id != *chat_id);
        // Cascade giống foreign key ON DELETE CASCADE
        self.0.participants.lock().unwrap().retain(|p| p.chat_id != *chat_id);
        Ok(())
    }

    async fn find_row(&self, chat_id: &Uuid) -> Result<Option<ChatRow>, error::SystemError> {
        let chat = self.0.chats.lock().unwrap().iter().find(|c| c.id == *chat_id).cloned();
        Ok(chat.map(|c| self.0.chat_row(&c)))
    }

    async fn find_rows_by_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<ChatRow>, error::SystemError> {
        let member_of: Vec<Uuid> = self
            .0
            .participants
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.user_id == *user_id)
            .map(|p| p.chat_id)
            .collect();

        let mut rows: Vec<ChatRow> = self
            .0
            .chats
            .lock()
            .unwrap()
            .iter()
            .filter(|c| member_of.contains(&c.id))
            .map(|c| self.0.chat_row(c))
            .collect();

        rows.sort_by_key(|r| std::cmp::Reverse(r.last_message_at.unwrap_or(r.updated_at)));
        Ok(rows)
    }
}

// === Participants ===

pub struct MemParticipantRepository(pub Arc<MemStore>);

#[async_trait::async_trait]
impl ParticipantRepository for MemParticipantRepository {
    async fn add_many(&self, chat_id: &Uuid, user_ids: &[Uuid]) -> Result<(), error::SystemError> {
        let mut participants = self.0.participants.lock().unwrap();
        for user_id in user_ids {
            let exists =
                participants.iter().any(|p| p.chat_id == *chat_id && p.user_id == *user_id);
            if !exists {
                participants.push(ChatParticipantEntity {
                    chat_id: *chat_id,
                    user_id: *user_id,
                    joined_at: chrono::Utc::now(),
                });
            }
        }
        Ok(())
    }

    async fn remove(&self, chat_id: &Uuid, user_id: &Uuid) -> Result<(), error::SystemError> {
        self.0
            .participants
            .lock()
            .unwrap()
            .retain(|p| !(p.chat_id == *chat_id && p.user_id == *user_id));
        Ok(())
    }

    async fn list_user_ids(&self, chat_id: &Uuid) -> Result<Vec<Uuid>, error::SystemError> {
        // Insertion order = join order
        Ok(self
            .0
            .participants
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.chat_id == *chat_id)
            .map(|p| p.user_id)
            .collect())
    }

    async fn is_member(
        &self,
        chat_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<bool, error::SystemError> {
        Ok(self
            .0
            .participants
            .lock()
            .unwrap()
            .iter()
            .any(|p| p.chat_id == *chat_id && p.user_id == *user_id))
    }

    async fn find_by_chat_ids(
        &self,
        chat_ids: &[Uuid],
    ) -> Result<Vec<ParticipantDetailWithChat>, error::SystemError> {
        Ok(self
            .0
            .participants
            .lock()
            .unwrap()
            .iter()
            .filter(|p| chat_ids.contains(&p.chat_id))
            .map(|p| ParticipantDetailWithChat {
                chat_id: p.chat_id,
                user_id: p.user_id,
                username: self.0.username_of(&p.user_id),
                avatar_url: None,
                joined_at: p.joined_at,
            })
            .collect())
    }
}

// === Messages ===

pub struct MemMessageRepository(pub Arc<MemStore>);

#[async_trait::async_trait]
impl MessageRepository for MemMessageRepository {
    async fn create(&self, message: &InsertMessage) -> Result<MessageEntity, error::SystemError> {
        let entity = MessageEntity {
            id: Uuid::now_v7(),
            chat_id: message.chat_id,
            sender_id: message.sender_id,
            content: message.content.clone(),
            created_at: chrono::Utc::now(),
        };
        self.0.messages.lock().unwrap().push(entity.clone());
        Ok(entity)
    }

    async fn find_by_id(
        &self,
        message_id: &Uuid,
    ) -> Result<Option<MessageEntity>, error::SystemError> {
        Ok(self.0.messages.lock().unwrap().iter().find(|m| m.id == *message_id).cloned())
    }

    async fn find_by_chat(
        &self,
        chat_id: &Uuid,
    ) -> Result<Vec<MessageEntity>, error::SystemError> {
        let mut messages: Vec<MessageEntity> = self
            .0
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.chat_id == *chat_id)
            .cloned()
            .collect();
        messages.sort_by_key(|m| (m.created_at, m.id));
        Ok(messages)
    }

    async fn find_latest_in_chat(
        &self,
        chat_id: &Uuid,
    ) -> Result<Option<MessageEntity>, error::SystemError> {
        Ok(self.find_by_chat(chat_id).await?.into_iter().next_back())
    }

    async fn delete(&self, message_id: &Uuid) -> Result<bool, error::SystemError> {
        let mut messages = self.0.messages.lock().unwrap();
        let before = messages.len();
        messages.retain(|m| m.id != *message_id);
        Ok(messages.len() < before)
    }

    async fn delete_by_chat(&self, chat_id: &Uuid) -> Result<u64, error::SystemError> {
        let mut messages = self.0.messages.lock().unwrap();
        let before = messages.len();
        messages.retain(|m| m.chat_id != *chat_id);
        Ok((before - messages.len()) as u64)
    }
}

// === Attachments ===

pub struct MemAttachmentRepository(pub Arc<MemStore>);

impl MemAttachmentRepository {
    fn message_ids_of_chat(&self, chat_id: &Uuid) -> Vec<Uuid> {
        self.0
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.chat_id == *chat_id)
            .map(|m| m.id)
            .collect()
    }
}

#[async_trait::async_trait]
impl AttachmentRepository for MemAttachmentRepository {
    async fn create_many(
        &self,
        attachments: &[NewAttachment],
    ) -> Result<Vec<AttachmentEntity>, error::SystemError> {
        let mut created = Vec::with_capacity(attachments.len());
        let mut store = self.0.attachments.lock().unwrap();
        for new in attachments {
            let entity = AttachmentEntity {
                id: Uuid::now_v7(),
                message_id: new.message_id,
                uploaded_by: new.uploaded_by,
                url: new.url.clone(),
                file_name: new.file_name.clone(),
                mime_type: new.mime_type.clone(),
                file_size: new.file_size,
                created_at: chrono::Utc::now(),
            };
            store.push(entity.clone());
            created.push(entity);
        }
        Ok(created)
    }

    async fn find_by_message(
        &self,
        message_id: &Uuid,
    ) -> Result<Vec<AttachmentEntity>, error::SystemError> {
        Ok(self
            .0
            .attachments
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.message_id == *message_id)
            .cloned()
            .collect())
    }

    async fn find_by_chat(
        &self,
        chat_id: &Uuid,
    ) -> Result<Vec<AttachmentEntity>, error::SystemError> {
        let message_ids = self.message_ids_of_chat(chat_id);
        Ok(self
            .0
            .attachments
            .lock()
            .unwrap()
            .iter()
            .filter(|a| message_ids.contains(&a.message_id))
            .cloned()
            .collect())
    }

    async fn delete_by_message(&self, message_id: &Uuid) -> Result<u64, error::SystemError> {
        let mut attachments = self.0.attachments.lock().unwrap();
        let before = attachments.len();
        attachments.retain(|a| a.message_id != *message_id);
        Ok((before - attachments.len()) as u64)
    }

    async fn delete_by_chat(&self, chat_id: &Uuid) -> Result<u64, error::SystemError> {
        let message_ids = self.message_ids_of_chat(chat_id);
        let mut attachments = self.0.attachments.lock().unwrap();
        let before = attachments.len();
        attachments.retain(|a| !message_ids.contains(&a.message_id));
        Ok((before - attachments.len()) as u64)
    }
}

// === Storage ===

/// Fake storage: ghi nhận saved/deleted keys, có thể ép fail theo tên file
/// để test rollback path.
#[derive(Default)]
pub struct MemStorage {
    pub saved: Mutex<Vec<StoredFile>>,
    pub deleted: Mutex<Vec<String>>,
    pub fail_on: Option<String>,
}

impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(file_name: &str) -> Self {
        Self { fail_on: Some(file_name.to_string()), ..Self::default() }
    }
}

#[async_trait::async_trait]
impl AttachmentStorage for MemStorage {
    async fn save(&self, file_name: &str, _bytes: &[u8]) -> Result<StoredFile, error::SystemError> {
        if self.fail_on.as_deref() == Some(file_name) {
            return Err(error::SystemError::upload_failed("Storage unavailable"));
        }

        let stored = StoredFile {
            key: file_name.to_string(),
            url: format!("http://files.test/{}", file_name),
        };
        self.saved.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn delete(&self, key: &str) -> Result<(), error::SystemError> {
        self.deleted.lock().unwrap().push(key.to_string());
        self.saved.lock().unwrap().retain(|f| f.key != key);
        Ok(())
    }
}
