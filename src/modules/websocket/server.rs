/// WebSocket Server Actor
///
/// Server actor giữ Room Membership Registry: mapping giữa các session
/// đang mở, personal room của từng user và các chat rooms. State này
/// thuần in-memory: process restart thì clients rejoin khi reconnect,
/// không có gì phải phục hồi từ database.
use actix::prelude::*;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use super::events::*;
use super::message::ServerMessage;
use super::session::SocketSession;

pub struct SocketServer {
    /// Map: session_id -> session actor address
    sessions: HashMap<Uuid, Addr<SocketSession>>,

    /// Map: user_id -> set of session_ids (personal room)
    /// Một user có thể có nhiều sessions (nhiều tab / nhiều thiết bị)
    users: HashMap<Uuid, HashSet<Uuid>>,

    /// Map: chat_id -> set of user_ids đang mở chat đó
    rooms: HashMap<Uuid, HashSet<Uuid>>,
}

impl SocketServer {
    pub fn new() -> Self {
        Self { sessions: HashMap::new(), users: HashMap::new(), rooms: HashMap::new() }
    }

    /// Join personal room; idempotent
    fn join_personal_room(&mut self, user_id: Uuid, session_id: Uuid) {
        self.users.entry(user_id).or_default().insert(session_id);
    }

    /// Join chat room; idempotent
    fn join_chat_room(&mut self, user_id: Uuid, chat_id: Uuid) {
        self.rooms.entry(chat_id).or_default().insert(user_id);
    }

    fn leave_chat_room(&mut self, user_id: Uuid, chat_id: Uuid) {
        if let Some(room) = self.rooms.get_mut(&chat_id) {
            room.remove(&user_id);

            // Clean up empty room
            if room.is_empty() {
                self.rooms.remove(&chat_id);
            }
        }
    }

    /// Gỡ session khỏi registry. Nếu user không còn session nào thì gỡ
    /// user khỏi tất cả rooms luôn; trả về user đó.
    fn cleanup_session(&mut self, session_id: Uuid) -> Option<Uuid> {
        self.sessions.remove(&session_id);

        let mut user_to_remove: Option<Uuid> = None;
        for (&user_id, sessions) in self.users.iter_mut() {
            if sessions.remove(&session_id) {
                if sessions.is_empty() {
                    user_to_remove = Some(user_id);
                }
                break;
            }
        }

        if let Some(user_id) = user_to_remove {
            self.users.remove(&user_id);

            for room_users in self.rooms.values_mut() {
                room_users.remove(&user_id);
            }
            self.rooms.retain(|_, users| !users.is_empty());
        }

        user_to_remove
    }

    /// Gửi message tới một session cụ thể
    fn send_to_session(&self, session_id: &Uuid, message: ServerMessage) {
        if let Some(session_addr) = self.sessions.get(session_id) {
            session_addr.do_send(message);
        }
    }

    /// Gửi tới tất cả sessions trong personal room của user
    fn send_to_user(&self, user_id: &Uuid, message: ServerMessage) {
        if let Some(session_ids) = self.users.get(user_id) {
            for session_id in session_ids {
                self.send_to_session(session_id, message.clone());
            }
        }
    }
}

impl Actor for SocketServer {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        tracing::info!("Socket server started");
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::info!("Socket server stopped");
    }
}

/// Handler: Session mới connected: lưu session và join personal room
impl Handler<Connect> for SocketServer {
    type Result = ();

    fn handle(&mut self, msg: Connect, _: &mut Context<Self>) {
        tracing::debug!("Socket session connected: {} (user {})", msg.session_id, msg.user_id);

        self.sessions.insert(msg.session_id, msg.addr);
        self.join_personal_room(msg.user_id, msg.session_id);

        tracing::info!(
            "User {} now has {} active session(s)",
            msg.user_id,
            self.users.get(&msg.user_id).map_or(0, HashSet::len)
        );
    }
}

/// Handler: Session disconnected: registry cleanup
impl Handler<Disconnect> for SocketServer {
    type Result = ();

    fn handle(&mut self, msg: Disconnect, _: &mut Context<Self>) {
        tracing::debug!("Socket session disconnected: {}", msg.session_id);

        if let Some(user_id) = self.cleanup_session(msg.session_id) {
            tracing::info!(
                "User {} fully disconnected (no more sessions) and removed from all rooms",
                user_id
            );
        }
    }
}

/// Handler: Join chat room
impl Handler<JoinChatRoom> for SocketServer {
    type Result = ();

    fn handle(&mut self, msg: JoinChatRoom, _: &mut Context<Self>) {
        self.join_chat_room(msg.user_id, msg.chat_id);

        tracing::debug!(
            "User {} joined chat {} ({} users in room)",
            msg.user_id,
            msg.chat_id,
            self.rooms.get(&msg.chat_id).map_or(0, HashSet::len)
        );
    }
}

/// Handler: Leave chat room
impl Handler<LeaveChatRoom> for SocketServer {
    type Result = ();

    fn handle(&mut self, msg: LeaveChatRoom, _: &mut Context<Self>) {
        self.leave_chat_room(msg.user_id, msg.chat_id);
        tracing::debug!("User {} left chat room {}", msg.user_id, msg.chat_id);
    }
}

/// Handler: Fan-out tới chat room
impl Handler<BroadcastToRoom> for SocketServer {
    type Result = ();

    fn handle(&mut self, msg: BroadcastToRoom, _: &mut Context<Self>) {
        if let Some(room_users) = self.rooms.get(&msg.chat_id) {
            let mut sent_count = 0;

            for &user_id in room_users {
                if let Some(skip_id) = msg.skip_user_id {
                    if user_id == skip_id {
                        continue;
                    }
                }

                // Gửi tới mọi session của user (multi-device)
                if let Some(session_ids) = self.users.get(&user_id) {
                    for session_id in session_ids {
                        self.send_to_session(session_id, msg.message.clone());
                        sent_count += 1;
                    }
                }
            }

            tracing::debug!("Broadcast to chat {}: sent to {} sessions", msg.chat_id, sent_count);
        } else {
            tracing::debug!("Attempted to broadcast to non-existent room: {}", msg.chat_id);
        }
    }
}

/// Handler: Gửi tới personal room của một user
impl Handler<SendToUser> for SocketServer {
    type Result = ();

    fn handle(&mut self, msg: SendToUser, _: &mut Context<Self>) {
        if self.users.contains_key(&msg.user_id) {
            self.send_to_user(&msg.user_id, msg.message);
        } else {
            tracing::debug!("User {} not online, message not sent", msg.user_id);
        }
    }
}

/// Handler: Gửi tới personal rooms của nhiều users
impl Handler<SendToUsers> for SocketServer {
    type Result = ();

    fn handle(&mut self, msg: SendToUsers, _: &mut Context<Self>) {
        let mut sent_count = 0;

        for user_id in &msg.user_ids {
            if let Some(session_ids) = self.users.get(user_id) {
                for session_id in session_ids {
                    self.send_to_session(session_id, msg.message.clone());
                    sent_count += 1;
                }
            }
        }

        tracing::debug!(
            "Sent message to {} users ({} total sessions)",
            msg.user_ids.len(),
            sent_count
        );
    }
}

/// Implement Message trait cho ServerMessage để có thể send tới sessions
impl Message for ServerMessage {
    type Result = ();
}

impl Default for SocketServer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_personal_room_join_is_idempotent() {
        let mut server = SocketServer::new();
        let user = Uuid::now_v7();
        let session = Uuid::now_v7();

        server.join_personal_room(user, session);
        server.join_personal_room(user, session);

        assert_eq!(server.users.get(&user).unwrap().len(), 1);
    }

    #[test]
    fn test_user_can_be_in_multiple_chat_rooms() {
        let mut server = SocketServer::new();
        let user = Uuid::now_v7();
        let chat_a = Uuid::now_v7();
        let chat_b = Uuid::now_v7();

        server.join_chat_room(user, chat_a);
        server.join_chat_room(user, chat_b);

        assert!(server.rooms.get(&chat_a).unwrap().contains(&user));
        assert!(server.rooms.get(&chat_b).unwrap().contains(&user));
    }

    #[test]
    fn test_empty_room_is_pruned_on_leave() {
        let mut server = SocketServer::new();
        let user = Uuid::now_v7();
        let chat = Uuid::now_v7();

        server.join_chat_room(user, chat);
        server.leave_chat_room(user, chat);

        assert!(!server.rooms.contains_key(&chat));
    }

    #[test]
    fn test_cleanup_removes_user_from_all_rooms() {
        let mut server = SocketServer::new();
        let user = Uuid::now_v7();
        let session = Uuid::now_v7();
        let chat = Uuid::now_v7();

        server.join_personal_room(user, session);
        server.join_chat_room(user, chat);

        let removed = server.cleanup_session(session);

        assert_eq!(removed, Some(user));
        assert!(!server.users.contains_key(&user));
        assert!(!server.rooms.contains_key(&chat));
    }

    #[test]
    fn test_cleanup_keeps_user_while_other_sessions_remain() {
        let mut server = SocketServer::new();
        let user = Uuid::now_v7();
        let tab_one = Uuid::now_v7();
        let tab_two = Uuid::now_v7();
        let chat = Uuid::now_v7();

        server.join_personal_room(user, tab_one);
        server.join_personal_room(user, tab_two);
        server.join_chat_room(user, chat);

        let removed = server.cleanup_session(tab_one);

        // vẫn còn một tab mở
        assert_eq!(removed, None);
        assert!(server.users.contains_key(&user));
        assert!(server.rooms.get(&chat).unwrap().contains(&user));
    }
}
