/// Message Service
///
/// Business logic cho message pipeline: gửi (kèm attachment upload với
/// rollback), list theo chat và xóa với recompute con trỏ last message.
use actix::Addr;
use std::{collections::HashMap, sync::Arc};
use uuid::Uuid;

use crate::{
    api::error,
    modules::{
        attachment::{
            model::{AttachmentUpload, NewAttachment, StoredFile},
            repository::AttachmentRepository,
            storage::AttachmentStorage,
        },
        chat::repository::{ChatRepository, ParticipantRepository},
        message::{
            model::{InsertMessage, MessageDetail},
            repository::MessageRepository,
        },
        websocket::{events::SendToUsers, message::ServerMessage, server::SocketServer},
    },
};

pub struct MessageService<M, C, P, A, S>
where
    M: MessageRepository + Send + Sync + 'static,
    C: ChatRepository + Send + Sync + 'static,
    P: ParticipantRepository + Send + Sync + 'static,
    A: AttachmentRepository + Send + Sync + 'static,
    S: AttachmentStorage + Send + Sync + 'static,
{
    message_repo: Arc<M>,
    chat_repo: Arc<C>,
    participant_repo: Arc<P>,
    attachment_repo: Arc<A>,
    storage: Arc<S>,
    socket: Arc<Addr<SocketServer>>,
}

impl<M, C, P, A, S> MessageService<M, C, P, A, S>
where
    M: MessageRepository + Send + Sync + 'static,
    C: ChatRepository + Send + Sync + 'static,
    P: ParticipantRepository + Send + Sync + 'static,
    A: AttachmentRepository + Send + Sync + 'static,
    S: AttachmentStorage + Send + Sync + 'static,
{
    pub fn with_dependencies(
        message_repo: Arc<M>,
        chat_repo: Arc<C>,
        participant_repo: Arc<P>,
        attachment_repo: Arc<A>,
        storage: Arc<S>,
        socket: Arc<Addr<SocketServer>>,
    ) -> Self {
        MessageService { message_repo, chat_repo, participant_repo, attachment_repo, storage, socket }
    }

    async fn ensure_chat_member(
        &self,
        chat_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<(), error::SystemError> {
        self.chat_repo
            .find_by_id(chat_id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Chat not found"))?;

        if !self.participant_repo.is_member(chat_id, user_id).await? {
            return Err(error::SystemError::forbidden(
                "You are not a participant of this chat",
            ));
        }
        Ok(())
    }

    /// Upload tất cả files: fail một file thì xóa hết những file đã lên
    /// (best-effort) và trả lỗi, không có partial upload.
    async fn upload_all(
        &self,
        uploads: &[AttachmentUpload],
    ) -> Result<Vec<StoredFile>, error::SystemError> {
        let mut stored = Vec::with_capacity(uploads.len());

        for upload in uploads {
            match self.storage.save(&upload.file_name, &upload.bytes).await {
                Ok(file) => stored.push(file),
                Err(e) => {
                    tracing::warn!("Upload {} thất bại: {:?}, rollback", upload.file_name, e);

                    for file in &stored {
                        if let Err(e) = self.storage.delete(&file.key).await {
                            tracing::warn!("Rollback file {} thất bại: {:?}", file.key, e);
                        }
                    }

                    return Err(error::SystemError::upload_failed(format!(
                        "Failed to upload {}",
                        upload.file_name
                    )));
                }
            }
        }

        Ok(stored)
    }

    async fn participants_except(
        &self,
        chat_id: &Uuid,
        excluded: &Uuid,
    ) -> Result<Vec<Uuid>, error::SystemError> {
        Ok(self
            .participant_repo
            .list_user_ids(chat_id)
            .await?
            .into_iter()
            .filter(|id| id != excluded)
            .collect())
    }

    pub async fn send(
        &self,
        actor_id: Uuid,
        chat_id: Uuid,
        content: Option<String>,
        uploads: Vec<AttachmentUpload>,
    ) -> Result<MessageDetail, error::SystemError> {
        // Content toàn whitespace coi như rỗng
        let content = content.map(|c| c.trim().to_string()).filter(|c| !c.is_empty());

        if content.is_none() && uploads.is_empty() {
            return Err(error::SystemError::bad_request(
                "Message must have content or attachments",
            ));
        }

        self.ensure_chat_member(&chat_id, &actor_id).await?;

        let stored = self.upload_all(&uploads).await?;

        let message = self
            .message_repo
            .create(&InsertMessage { chat_id, sender_id: actor_id, content })
            .await?;

        let attachments = if stored.is_empty() {
            Vec::new()
        } else {
            let new_attachments: Vec<NewAttachment> = stored
                .iter()
                .zip(uploads.iter())
                .map(|(file, upload)| NewAttachment {
                    message_id: message.id,
                    uploaded_by: actor_id,
                    url: file.url.clone(),
                    file_name: upload.file_name.clone(),
                    mime_type: upload.mime_type.clone(),
                    file_size: upload.bytes.len() as i64,
                })
                .collect();
            self.attachment_repo.create_many(&new_attachments).await?
        };

        self.chat_repo.set_last_message(&chat_id, Some(&message)).await?;

        let detail = MessageDetail::from_entity(message, attachments);

        let recipients = self.participants_except(&chat_id, &actor_id).await?;
        self.socket.do_send(SendToUsers {
            user_ids: recipients,
            message: ServerMessage::MessageReceived {
                chat_id,
                message: serde_json::to_value(&detail)?,
            },
        });

        Ok(detail)
    }

    /// Toàn bộ messages của chat, cũ nhất trước, kèm attachments
    pub async fn list(
        &self,
        actor_id: Uuid,
        chat_id: Uuid,
    ) -> Result<Vec<MessageDetail>, error::SystemError> {
        self.ensure_chat_member(&chat_id, &actor_id).await?;

        let messages = self.message_repo.find_by_chat(&chat_id).await?;
        let attachments = self.attachment_repo.find_by_chat(&chat_id).await?;

        let mut attachment_map = attachments.into_iter().fold(
            HashMap::<Uuid, Vec<_>>::new(),
            |mut acc, attachment| {
                acc.entry(attachment.message_id).or_default().push(attachment);
                acc
            },
        );

        Ok(messages
            .into_iter()
            .map(|message| {
                let attachments = attachment_map.remove(&message.id).unwrap_or_default();
                MessageDetail::from_entity(message, attachments)
            })
            .collect())
    }

    /// Chỉ sender được xóa message của mình. Nếu message đang là last
    /// message của chat thì recompute con trỏ.
    pub async fn delete(
        &self,
        actor_id: Uuid,
        message_id: Uuid,
    ) -> Result<(), error::SystemError> {
        let message = self
            .message_repo
            .find_by_id(&message_id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Message not found"))?;

        let chat = self
            .chat_repo
            .find_by_id(&message.chat_id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Chat not found"))?;

        if !self.participant_repo.is_member(&chat.id, &actor_id).await? {
            return Err(error::SystemError::forbidden(
                "You are not a participant of this chat",
            ));
        }
        if message.sender_id != actor_id {
            return Err(error::SystemError::forbidden(
                "You can only delete your own messages",
            ));
        }

        // Best-effort xóa file bytes, row metadata luôn bị xóa
        let attachments = self.attachment_repo.find_by_message(&message_id).await?;
        for attachment in &attachments {
            let key = attachment.url.rsplit('/').next().unwrap_or(&attachment.url);
            if let Err(e) = self.storage.delete(key).await {
                tracing::warn!("Không thể xóa file {} khỏi storage: {:?}", key, e);
            }
        }
        self.attachment_repo.delete_by_message(&message_id).await?;

        self.message_repo.delete(&message_id).await?;

        // Con trỏ last message trỏ vào message vừa xóa thì tìm ứng viên mới
        if chat.last_message_id == Some(message_id) {
            let latest = self.message_repo.find_latest_in_chat(&chat.id).await?;
            self.chat_repo.set_last_message(&chat.id, latest.as_ref()).await?;
        }

        // Cùng event kind với message mới, client phân biệt qua payload
        let recipients = self.participants_except(&chat.id, &actor_id).await?;
        self.socket.do_send(SendToUsers {
            user_ids: recipients,
            message: ServerMessage::MessageReceived {
                chat_id: chat.id,
                message: serde_json::json!({
                    "id": message_id,
                    "chatId": chat.id,
                    "deleted": true,
                }),
            },
        });

        Ok(())
    }
}
