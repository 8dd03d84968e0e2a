/// Chat Service
///
/// Business logic cho chat lifecycle: tạo one-on-one (có dedup), tạo
/// group, rename, membership edit, leave với admin handoff và delete
/// với cascade. Mỗi mutation thành công sẽ fan-out event qua socket
/// server để clients đang online cập nhật ngay.
use actix::Addr;
use std::{collections::HashMap, sync::Arc};
use uuid::Uuid;

use crate::{
    api::error,
    modules::{
        attachment::{repository::AttachmentRepository, storage::AttachmentStorage},
        chat::{
            model::{ChatDetail, ParticipantDetailWithChat, ParticipantRow},
            repository::{ChatRepository, ParticipantRepository},
            schema::ChatEntity,
        },
        message::repository::MessageRepository,
        user::repository::UserRepository,
        websocket::{
            events::{BroadcastToRoom, SendToUser, SendToUsers},
            message::ServerMessage,
            server::SocketServer,
        },
    },
};

/// Tên cố định cho one-on-one chat, client render tên participant thay vì
/// tên chat nên giá trị này chỉ là placeholder.
const DIRECT_CHAT_NAME: &str = "One on one chat";

/// Group chat phải có ít nhất 3 thành viên (tính cả người tạo).
const MIN_GROUP_MEMBERS: usize = 3;

pub struct ChatService<C, P, U, M, A, S>
where
    C: ChatRepository + Send + Sync + 'static,
    P: ParticipantRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    M: MessageRepository + Send + Sync + 'static,
    A: AttachmentRepository + Send + Sync + 'static,
    S: AttachmentStorage + Send + Sync + 'static,
{
    chat_repo: Arc<C>,
    participant_repo: Arc<P>,
    user_repo: Arc<U>,
    message_repo: Arc<M>,
    attachment_repo: Arc<A>,
    storage: Arc<S>,
    socket: Arc<Addr<SocketServer>>,
}

fn to_participant_row(p: ParticipantDetailWithChat) -> ParticipantRow {
    ParticipantRow {
        user_id: p.user_id,
        username: p.username,
        avatar_url: p.avatar_url,
        joined_at: p.joined_at,
    }
}

impl<C, P, U, M, A, S> ChatService<C, P, U, M, A, S>
where
    C: ChatRepository + Send + Sync + 'static,
    P: ParticipantRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    M: MessageRepository + Send + Sync + 'static,
    A: AttachmentRepository + Send + Sync + 'static,
    S: AttachmentStorage + Send + Sync + 'static,
{
    pub fn with_dependencies(
        chat_repo: Arc<C>,
        participant_repo: Arc<P>,
        user_repo: Arc<U>,
        message_repo: Arc<M>,
        attachment_repo: Arc<A>,
        storage: Arc<S>,
        socket: Arc<Addr<SocketServer>>,
    ) -> Self {
        ChatService {
            chat_repo,
            participant_repo,
            user_repo,
            message_repo,
            attachment_repo,
            storage,
            socket,
        }
    }

    /// Full projection của một chat: row + participants
    async fn detail(&self, chat_id: &Uuid) -> Result<ChatDetail, error::SystemError> {
        let row = self
            .chat_repo
            .find_row(chat_id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Chat not found"))?;

        let participants = self
            .participant_repo
            .find_by_chat_ids(&[*chat_id])
            .await?
            .into_iter()
            .map(to_participant_row)
            .collect();

        Ok(row.into_detail(participants))
    }

    async fn find_chat(&self, chat_id: &Uuid) -> Result<ChatEntity, error::SystemError> {
        self.chat_repo
            .find_by_id(chat_id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Chat not found"))
    }

    async fn ensure_member(
        &self,
        chat_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<(), error::SystemError> {
        if !self.participant_repo.is_member(chat_id, user_id).await? {
            return Err(error::SystemError::forbidden(
                "You are not a participant of this chat",
            ));
        }
        Ok(())
    }

    /// Xóa toàn bộ lịch sử của chat: file bytes (best-effort), attachment
    /// rows rồi message rows. Storage fail không chặn cascade, chỉ log.
    async fn cascade_delete_history(&self, chat_id: &Uuid) -> Result<(), error::SystemError> {
        let attachments = self.attachment_repo.find_by_chat(chat_id).await?;

        let mut storage_failures = 0u32;
        for attachment in &attachments {
            // Storage key là segment cuối của URL
            let key = attachment.url.rsplit('/').next().unwrap_or(&attachment.url);
            if let Err(e) = self.storage.delete(key).await {
                storage_failures += 1;
                tracing::warn!("Không thể xóa file {} khỏi storage: {:?}", key, e);
            }
        }

        if storage_failures > 0 {
            tracing::warn!(
                "Cascade delete chat {}: {}/{} files không xóa được khỏi storage",
                chat_id,
                storage_failures,
                attachments.len()
            );
        }

        self.attachment_repo.delete_by_chat(chat_id).await?;
        self.message_repo.delete_by_chat(chat_id).await?;
        Ok(())
    }

    fn chat_payload(detail: &ChatDetail) -> Result<serde_json::Value, error::SystemError> {
        Ok(serde_json::to_value(detail)?)
    }

    /// Tất cả chats của user, sắp theo hoạt động gần nhất
    pub async fn get_chats(&self, user_id: Uuid) -> Result<Vec<ChatDetail>, error::SystemError> {
        let rows = self.chat_repo.find_rows_by_user(&user_id).await?;

        let chat_ids: Vec<Uuid> = rows.iter().map(|row| row.chat_id).collect();
        let participants = self.participant_repo.find_by_chat_ids(&chat_ids).await?;

        let participant_map = participants.into_iter().fold(
            HashMap::<Uuid, Vec<ParticipantRow>>::new(),
            |mut acc, participant| {
                acc.entry(participant.chat_id)
                    .or_default()
                    .push(to_participant_row(participant));
                acc
            },
        );

        let details = rows
            .into_iter()
            .map(|row| {
                let participants =
                    participant_map.get(&row.chat_id).cloned().unwrap_or_default();
                row.into_detail(participants)
            })
            .collect();

        Ok(details)
    }

    /// One-on-one chat với dedup: nếu đã có chat giữa 2 user thì trả về
    /// chat cũ, không tạo mới và không fan-out gì cả.
    pub async fn get_or_create_direct(
        &self,
        actor_id: Uuid,
        other_user_id: Uuid,
    ) -> Result<ChatDetail, error::SystemError> {
        if actor_id == other_user_id {
            return Err(error::SystemError::bad_request(
                "Cannot create a chat with yourself",
            ));
        }

        self.user_repo
            .find_by_id(&other_user_id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("User not found"))?;

        if let Some(existing) =
            self.chat_repo.find_direct_between(&actor_id, &other_user_id).await?
        {
            return self.detail(&existing.id).await;
        }

        let chat =
            self.chat_repo.create_direct(DIRECT_CHAT_NAME, &actor_id, &other_user_id).await?;
        let detail = self.detail(&chat.id).await?;

        // Báo cho phía bên kia biết có chat mới
        self.socket.do_send(SendToUser {
            user_id: other_user_id,
            message: ServerMessage::NewChat { chat: Self::chat_payload(&detail)? },
        });

        Ok(detail)
    }

    pub async fn create_group(
        &self,
        actor_id: Uuid,
        name: String,
        member_ids: Vec<Uuid>,
    ) -> Result<ChatDetail, error::SystemError> {
        if member_ids.contains(&actor_id) {
            return Err(error::SystemError::bad_request(
                "Cannot invite yourself to the group",
            ));
        }

        // Dedup giữ nguyên thứ tự, creator luôn đứng đầu (là admin)
        let mut all_members = vec![actor_id];
        for id in member_ids {
            if !all_members.contains(&id) {
                all_members.push(id);
            }
        }

        if all_members.len() < MIN_GROUP_MEMBERS {
            return Err(error::SystemError::bad_request(
                "A group chat requires at least 3 members",
            ));
        }

        let invited: Vec<Uuid> =
            all_members.iter().skip(1).copied().collect();
        let found = self.user_repo.find_by_ids(&invited).await?;
        if found.len() != invited.len() {
            return Err(error::SystemError::not_found("One or more users not found"));
        }

        let chat = self.chat_repo.create_group(&name, &actor_id, &all_members).await?;
        let detail = self.detail(&chat.id).await?;

        self.socket.do_send(SendToUsers {
            user_ids: invited,
            message: ServerMessage::NewChat { chat: Self::chat_payload(&detail)? },
        });

        Ok(detail)
    }

    pub async fn rename_group(
        &self,
        chat_id: Uuid,
        name: String,
    ) -> Result<ChatDetail, error::SystemError> {
        let chat = self.find_chat(&chat_id).await?;
        if !chat.is_group_chat {
            return Err(error::SystemError::bad_request(
                "Cannot rename a one on one chat",
            ));
        }

        self.chat_repo.update_name(&chat_id, &name).await?;
        let detail = self.detail(&chat_id).await?;

        // Tất cả users đang mở chat này, kể cả actor
        self.socket.do_send(BroadcastToRoom {
            chat_id,
            message: ServerMessage::GroupNameUpdated { chat: Self::chat_payload(&detail)? },
            skip_user_id: None,
        });

        Ok(detail)
    }

    /// Rời group. Nếu actor là admin thì chuyển quyền cho participant
    /// join sớm nhất còn lại trước khi rời.
    pub async fn leave_group(
        &self,
        actor_id: Uuid,
        chat_id: Uuid,
    ) -> Result<ChatDetail, error::SystemError> {
        let chat = self.find_chat(&chat_id).await?;
        if !chat.is_group_chat {
            return Err(error::SystemError::bad_request(
                "Cannot leave a one on one chat",
            ));
        }
        self.ensure_member(&chat_id, &actor_id).await?;

        if chat.admin_id == Some(actor_id) {
            let remaining: Vec<Uuid> = self
                .participant_repo
                .list_user_ids(&chat_id)
                .await?
                .into_iter()
                .filter(|id| *id != actor_id)
                .collect();

            if let Some(next_admin) = remaining.first() {
                self.chat_repo.set_admin(&chat_id, next_admin).await?;
            }
        }

        self.participant_repo.remove(&chat_id, &actor_id).await?;
        let detail = self.detail(&chat_id).await?;

        self.socket.do_send(BroadcastToRoom {
            chat_id,
            message: ServerMessage::LeaveChat { chat: Self::chat_payload(&detail)? },
            skip_user_id: None,
        });

        Ok(detail)
    }

    pub async fn add_participants(
        &self,
        actor_id: Uuid,
        chat_id: Uuid,
        user_ids: Vec<Uuid>,
    ) -> Result<ChatDetail, error::SystemError> {
        if user_ids.is_empty() {
            return Err(error::SystemError::bad_request("No users provided"));
        }

        let chat = self.find_chat(&chat_id).await?;
        if !chat.is_group_chat {
            return Err(error::SystemError::bad_request(
                "Cannot add participants to a one on one chat",
            ));
        }
        self.ensure_member(&chat_id, &actor_id).await?;

        // Dedup trước khi check tồn tại: request có thể lặp id, còn
        // find_by_ids trả về unique rows nên so sánh trên list raw sẽ sai
        let mut unique_ids: Vec<Uuid> = Vec::new();
        for user_id in user_ids {
            if !unique_ids.contains(&user_id) {
                unique_ids.push(user_id);
            }
        }

        let found = self.user_repo.find_by_ids(&unique_ids).await?;
        if found.len() != unique_ids.len() {
            return Err(error::SystemError::not_found("One or more users not found"));
        }

        // Lọc những user đã ở trong chat rồi
        let mut to_add = Vec::new();
        for user_id in unique_ids {
            if !self.participant_repo.is_member(&chat_id, &user_id).await? {
                to_add.push(user_id);
            }
        }

        if to_add.is_empty() {
            return Err(error::SystemError::bad_request(
                "All users are already in the chat",
            ));
        }

        self.participant_repo.add_many(&chat_id, &to_add).await?;
        let detail = self.detail(&chat_id).await?;
        let payload = Self::chat_payload(&detail)?;

        // Members mới nhận qua personal room, members cũ đang mở chat
        // nhận qua chat room
        self.socket.do_send(SendToUsers {
            user_ids: to_add,
            message: ServerMessage::NewChat { chat: payload.clone() },
        });
        self.socket.do_send(BroadcastToRoom {
            chat_id,
            message: ServerMessage::NewChat { chat: payload },
            skip_user_id: None,
        });

        Ok(detail)
    }

    pub async fn remove_participant(
        &self,
        actor_id: Uuid,
        chat_id: Uuid,
        target_user_id: Uuid,
    ) -> Result<ChatDetail, error::SystemError> {
        let chat = self.find_chat(&chat_id).await?;
        if !chat.is_group_chat {
            return Err(error::SystemError::bad_request(
                "Cannot remove participants from a one on one chat",
            ));
        }
        self.ensure_member(&chat_id, &actor_id).await?;

        if !self.participant_repo.is_member(&chat_id, &target_user_id).await? {
            return Err(error::SystemError::bad_request(
                "User is not a participant of this chat",
            ));
        }

        // Admin bị xóa thì chuyển quyền trước
        if chat.admin_id == Some(target_user_id) {
            let remaining: Vec<Uuid> = self
                .participant_repo
                .list_user_ids(&chat_id)
                .await?
                .into_iter()
                .filter(|id| *id != target_user_id)
                .collect();

            if let Some(next_admin) = remaining.first() {
                self.chat_repo.set_admin(&chat_id, next_admin).await?;
            }
        }

        self.participant_repo.remove(&chat_id, &target_user_id).await?;
        let detail = self.detail(&chat_id).await?;
        let payload = Self::chat_payload(&detail)?;

        self.socket.do_send(SendToUser {
            user_id: target_user_id,
            message: ServerMessage::LeaveChat { chat: payload.clone() },
        });
        self.socket.do_send(BroadcastToRoom {
            chat_id,
            message: ServerMessage::LeaveChat { chat: payload },
            skip_user_id: None,
        });

        Ok(detail)
    }

    /// Chỉ admin được xóa group. Xóa hết history + attachments + chat row.
    pub async fn delete_group(
        &self,
        actor_id: Uuid,
        chat_id: Uuid,
    ) -> Result<(), error::SystemError> {
        let chat = self.find_chat(&chat_id).await?;
        if !chat.is_group_chat {
            return Err(error::SystemError::bad_request("Not a group chat"));
        }
        if chat.admin_id != Some(actor_id) {
            return Err(error::SystemError::forbidden(
                "Only the group admin can delete the chat",
            ));
        }

        self.delete_chat_and_notify(actor_id, chat_id).await
    }

    /// Một trong hai participant được xóa one-on-one chat.
    pub async fn delete_direct(
        &self,
        actor_id: Uuid,
        chat_id: Uuid,
    ) -> Result<(), error::SystemError> {
        let chat = self.find_chat(&chat_id).await?;
        if chat.is_group_chat {
            return Err(error::SystemError::bad_request("Not a one on one chat"));
        }
        self.ensure_member(&chat_id, &actor_id).await?;

        self.delete_chat_and_notify(actor_id, chat_id).await
    }

    async fn delete_chat_and_notify(
        &self,
        actor_id: Uuid,
        chat_id: Uuid,
    ) -> Result<(), error::SystemError> {
        // Capture projection + participants trước khi rows biến mất
        let detail = self.detail(&chat_id).await?;
        let others: Vec<Uuid> = self
            .participant_repo
            .list_user_ids(&chat_id)
            .await?
            .into_iter()
            .filter(|id| *id != actor_id)
            .collect();

        self.cascade_delete_history(&chat_id).await?;
        self.chat_repo.delete(&chat_id).await?;

        self.socket.do_send(SendToUsers {
            user_ids: others,
            message: ServerMessage::LeaveChat { chat: Self::chat_payload(&detail)? },
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{
        MemAttachmentRepository, MemChatRepository, MemMessageRepository,
        MemParticipantRepository, MemStorage, MemStore, MemUserRepository,
    };
    use actix::Actor;

    type TestService = ChatService<
        MemChatRepository,
        MemParticipantRepository,
        MemUserRepository,
        MemMessageRepository,
        MemAttachmentRepository,
        MemStorage,
    >;

    fn make_service(store: &Arc<MemStore>) -> TestService {
        ChatService::with_dependencies(
            Arc::new(MemChatRepository(store.clone())),
            Arc::new(MemParticipantRepository(store.clone())),
            Arc::new(MemUserRepository(store.clone())),
            Arc::new(MemMessageRepository(store.clone())),
            Arc::new(MemAttachmentRepository(store.clone())),
            Arc::new(MemStorage::new()),
            Arc::new(SocketServer::new().start()),
        )
    }

    #[actix_web::test]
    async fn test_direct_chat_is_deduplicated() {
        let store = MemStore::new();
        let service = make_service(&store);
        let alice = store.add_user("alice");
        let bob = store.add_user("bob");

        let first = service.get_or_create_direct(alice.id, bob.id).await.unwrap();
        // Thử lại theo cả hai chiều
        let second = service.get_or_create_direct(alice.id, bob.id).await.unwrap();
        let third = service.get_or_create_direct(bob.id, alice.id).await.unwrap();

        assert_eq!(first.chat_id, second.chat_id);
        assert_eq!(first.chat_id, third.chat_id);
        assert_eq!(store.chats.lock().unwrap().len(), 1);
        assert_eq!(first.name, "One on one chat");
        assert!(!first.is_group_chat);
        assert_eq!(first.admin_id, None);
    }

    #[actix_web::test]
    async fn test_direct_chat_dedup_skips_group_with_same_pair() {
        let store = MemStore::new();
        let service = make_service(&store);
        let alice = store.add_user("alice");
        let bob = store.add_user("bob");
        let carol = store.add_user("carol");

        service
            .create_group(alice.id, "Team".to_string(), vec![bob.id, carol.id])
            .await
            .unwrap();

        let direct = service.get_or_create_direct(alice.id, bob.id).await.unwrap();

        assert!(!direct.is_group_chat);
        assert_eq!(store.chats.lock().unwrap().len(), 2);
    }

    #[actix_web::test]
    async fn test_direct_chat_with_unknown_user_fails() {
        let store = MemStore::new();
        let service = make_service(&store);
        let alice = store.add_user("alice");

        let result = service.get_or_create_direct(alice.id, Uuid::now_v7()).await;

        assert!(matches!(result, Err(error::SystemError::NotFound(_))));
    }

    #[actix_web::test]
    async fn test_direct_chat_with_self_fails() {
        let store = MemStore::new();
        let service = make_service(&store);
        let alice = store.add_user("alice");

        let result = service.get_or_create_direct(alice.id, alice.id).await;

        assert!(matches!(result, Err(error::SystemError::BadRequest(_))));
    }

    #[actix_web::test]
    async fn test_create_group_sets_admin_and_participants() {
        let store = MemStore::new();
        let service = make_service(&store);
        let alice = store.add_user("alice");
        let bob = store.add_user("bob");
        let carol = store.add_user("carol");

        let detail = service
            .create_group(alice.id, "Team".to_string(), vec![bob.id, carol.id])
            .await
            .unwrap();

        assert!(detail.is_group_chat);
        assert_eq!(detail.admin_id, Some(alice.id));
        assert_eq!(detail.participants.len(), 3);
    }

    #[actix_web::test]
    async fn test_create_group_rejects_self_invite() {
        let store = MemStore::new();
        let service = make_service(&store);
        let alice = store.add_user("alice");
        let bob = store.add_user("bob");

        let result =
            service.create_group(alice.id, "Team".to_string(), vec![alice.id, bob.id]).await;

        assert!(matches!(result, Err(error::SystemError::BadRequest(_))));
    }

    #[actix_web::test]
    async fn test_create_group_rejects_too_few_members() {
        let store = MemStore::new();
        let service = make_service(&store);
        let alice = store.add_user("alice");
        let bob = store.add_user("bob");

        let result = service.create_group(alice.id, "Team".to_string(), vec![bob.id]).await;

        assert!(matches!(result, Err(error::SystemError::BadRequest(_))));
    }

    #[actix_web::test]
    async fn test_rename_unknown_chat_fails() {
        let store = MemStore::new();
        let service = make_service(&store);

        let result = service.rename_group(Uuid::now_v7(), "New name".to_string()).await;

        assert!(matches!(result, Err(error::SystemError::NotFound(_))));
    }

    #[actix_web::test]
    async fn test_admin_leave_hands_off_to_earliest_member() {
        let store = MemStore::new();
        let service = make_service(&store);
        let alice = store.add_user("alice");
        let bob = store.add_user("bob");
        let carol = store.add_user("carol");

        let group = service
            .create_group(alice.id, "Team".to_string(), vec![bob.id, carol.id])
            .await
            .unwrap();

        let detail = service.leave_group(alice.id, group.chat_id).await.unwrap();

        // Bob join trước Carol nên nhận quyền admin
        assert_eq!(detail.admin_id, Some(bob.id));
        assert_eq!(detail.participants.len(), 2);
        assert!(detail.participants.iter().all(|p| p.user_id != alice.id));
    }

    #[actix_web::test]
    async fn test_non_member_cannot_leave_group() {
        let store = MemStore::new();
        let service = make_service(&store);
        let alice = store.add_user("alice");
        let bob = store.add_user("bob");
        let carol = store.add_user("carol");
        let dave = store.add_user("dave");

        let group = service
            .create_group(alice.id, "Team".to_string(), vec![bob.id, carol.id])
            .await
            .unwrap();

        let result = service.leave_group(dave.id, group.chat_id).await;

        assert!(matches!(result, Err(error::SystemError::Forbidden(_))));
    }

    #[actix_web::test]
    async fn test_add_participants_rejects_all_already_joined() {
        let store = MemStore::new();
        let service = make_service(&store);
        let alice = store.add_user("alice");
        let bob = store.add_user("bob");
        let carol = store.add_user("carol");

        let group = service
            .create_group(alice.id, "Team".to_string(), vec![bob.id, carol.id])
            .await
            .unwrap();

        let result =
            service.add_participants(alice.id, group.chat_id, vec![bob.id, carol.id]).await;

        assert!(matches!(result, Err(error::SystemError::BadRequest(_))));
    }

    #[actix_web::test]
    async fn test_add_duplicated_joined_ids_rejected_as_already_in_chat() {
        let store = MemStore::new();
        let service = make_service(&store);
        let alice = store.add_user("alice");
        let bob = store.add_user("bob");
        let carol = store.add_user("carol");

        let group = service
            .create_group(alice.id, "Team".to_string(), vec![bob.id, carol.id])
            .await
            .unwrap();

        // Id lặp của một member hiện tại: phải fail như "đã ở trong chat",
        // không phải "user not found"
        let result = service.add_participants(alice.id, group.chat_id, vec![bob.id, bob.id]).await;

        assert!(matches!(result, Err(error::SystemError::BadRequest(_))));
    }

    #[actix_web::test]
    async fn test_add_duplicated_new_ids_adds_user_once() {
        let store = MemStore::new();
        let service = make_service(&store);
        let alice = store.add_user("alice");
        let bob = store.add_user("bob");
        let carol = store.add_user("carol");
        let dave = store.add_user("dave");

        let group = service
            .create_group(alice.id, "Team".to_string(), vec![bob.id, carol.id])
            .await
            .unwrap();

        let detail = service
            .add_participants(alice.id, group.chat_id, vec![dave.id, dave.id])
            .await
            .unwrap();

        assert_eq!(detail.participants.len(), 4);
        assert_eq!(
            detail.participants.iter().filter(|p| p.user_id == dave.id).count(),
            1
        );
    }

    #[actix_web::test]
    async fn test_non_member_cannot_add_participants() {
        let store = MemStore::new();
        let service = make_service(&store);
        let alice = store.add_user("alice");
        let bob = store.add_user("bob");
        let carol = store.add_user("carol");
        let dave = store.add_user("dave");
        let eve = store.add_user("eve");

        let group = service
            .create_group(alice.id, "Team".to_string(), vec![bob.id, carol.id])
            .await
            .unwrap();

        let result = service.add_participants(dave.id, group.chat_id, vec![eve.id]).await;

        assert!(matches!(result, Err(error::SystemError::Forbidden(_))));
    }

    #[actix_web::test]
    async fn test_add_participants_filters_existing_members() {
        let store = MemStore::new();
        let service = make_service(&store);
        let alice = store.add_user("alice");
        let bob = store.add_user("bob");
        let carol = store.add_user("carol");
        let dave = store.add_user("dave");

        let group = service
            .create_group(alice.id, "Team".to_string(), vec![bob.id, carol.id])
            .await
            .unwrap();

        let detail = service
            .add_participants(alice.id, group.chat_id, vec![bob.id, dave.id])
            .await
            .unwrap();

        assert_eq!(detail.participants.len(), 4);
        assert!(detail.participants.iter().any(|p| p.user_id == dave.id));
    }

    #[actix_web::test]
    async fn test_remove_unknown_participant_fails() {
        let store = MemStore::new();
        let service = make_service(&store);
        let alice = store.add_user("alice");
        let bob = store.add_user("bob");
        let carol = store.add_user("carol");
        let dave = store.add_user("dave");

        let group = service
            .create_group(alice.id, "Team".to_string(), vec![bob.id, carol.id])
            .await
            .unwrap();

        let result = service.remove_participant(alice.id, group.chat_id, dave.id).await;

        assert!(matches!(result, Err(error::SystemError::BadRequest(_))));
    }

    #[actix_web::test]
    async fn test_delete_group_requires_admin() {
        let store = MemStore::new();
        let service = make_service(&store);
        let alice = store.add_user("alice");
        let bob = store.add_user("bob");
        let carol = store.add_user("carol");

        let group = service
            .create_group(alice.id, "Team".to_string(), vec![bob.id, carol.id])
            .await
            .unwrap();

        let result = service.delete_group(bob.id, group.chat_id).await;

        assert!(matches!(result, Err(error::SystemError::Forbidden(_))));
        assert_eq!(store.chats.lock().unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn test_delete_group_cascades_history() {
        let store = MemStore::new();
        let storage = Arc::new(MemStorage::new());
        let alice = store.add_user("alice");
        let bob = store.add_user("bob");
        let carol = store.add_user("carol");

        let service = ChatService::with_dependencies(
            Arc::new(MemChatRepository(store.clone())),
            Arc::new(MemParticipantRepository(store.clone())),
            Arc::new(MemUserRepository(store.clone())),
            Arc::new(MemMessageRepository(store.clone())),
            Arc::new(MemAttachmentRepository(store.clone())),
            storage.clone(),
            Arc::new(SocketServer::new().start()),
        );

        let group = service
            .create_group(alice.id, "Team".to_string(), vec![bob.id, carol.id])
            .await
            .unwrap();

        // Seed history trực tiếp qua store
        let message = MemMessageRepository(store.clone())
            .create(&crate::modules::message::model::InsertMessage {
                chat_id: group.chat_id,
                sender_id: bob.id,
                content: Some("hello".to_string()),
            })
            .await
            .unwrap();
        let stored = storage.save("report.pdf", b"bytes").await.unwrap();
        MemAttachmentRepository(store.clone())
            .create_many(&[crate::modules::attachment::model::NewAttachment {
                message_id: message.id,
                uploaded_by: bob.id,
                url: stored.url,
                file_name: "report.pdf".to_string(),
                mime_type: "application/pdf".to_string(),
                file_size: 5,
            }])
            .await
            .unwrap();

        service.delete_group(alice.id, group.chat_id).await.unwrap();

        assert!(store.chats.lock().unwrap().is_empty());
        assert!(store.participants.lock().unwrap().is_empty());
        assert!(store.messages.lock().unwrap().is_empty());
        assert!(store.attachments.lock().unwrap().is_empty());
        assert!(storage.saved.lock().unwrap().is_empty());
        assert_eq!(storage.deleted.lock().unwrap().as_slice(), ["report.pdf"]);
    }

    #[actix_web::test]
    async fn test_delete_direct_requires_membership() {
        let store = MemStore::new();
        let service = make_service(&store);
        let alice = store.add_user("alice");
        let bob = store.add_user("bob");
        let carol = store.add_user("carol");

        let chat = service.get_or_create_direct(alice.id, bob.id).await.unwrap();

        let result = service.delete_direct(carol.id, chat.chat_id).await;

        assert!(matches!(result, Err(error::SystemError::Forbidden(_))));
    }
}
