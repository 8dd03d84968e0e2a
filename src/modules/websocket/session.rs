/// WebSocket Session Actor
///
/// Mỗi connection có một Session actor riêng. Identity được resolve ở
/// handshake và giữ bất biến trong suốt lifetime của session, không
/// bao giờ mutate lên transport object.
use actix::prelude::*;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::modules::user::schema::{UserEntity, UserRole};

use super::events::*;
use super::message::{ClientMessage, ServerMessage};
use super::server::SocketServer;

/// Identity đã resolve từ access token lúc handshake
#[derive(Debug, Clone)]
pub struct SocketIdentity {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub email_verified: bool,
    pub role: UserRole,
}

impl From<UserEntity> for SocketIdentity {
    fn from(user: UserEntity) -> Self {
        SocketIdentity {
            user_id: user.id,
            username: user.username,
            email: user.email,
            avatar_url: user.avatar_url,
            email_verified: user.email_verified,
            role: user.role,
        }
    }
}

/// WebSocket session cho một client
pub struct SocketSession {
    /// Unique session ID (connection id)
    pub id: Uuid,

    /// Identity của user sở hữu connection, resolve xong từ handshake
    pub identity: SocketIdentity,

    /// Address của socket server actor
    pub server: Addr<SocketServer>,

    /// Channel gửi JSON messages tới client (bridge → handler.rs → WebSocket)
    pub tx: mpsc::UnboundedSender<String>,
}

impl SocketSession {
    pub fn new(
        server: Addr<SocketServer>,
        identity: SocketIdentity,
        tx: mpsc::UnboundedSender<String>,
    ) -> Self {
        Self { id: Uuid::now_v7(), identity, server, tx }
    }

    /// Gửi ServerMessage tới client thông qua channel
    fn send_to_client(&self, msg: &ServerMessage) {
        match serde_json::to_string(msg) {
            Ok(json) => {
                if let Err(e) = self.tx.send(json) {
                    tracing::error!(
                        "Không thể gửi message tới client (session {}): {}",
                        self.id,
                        e
                    );
                }
            }
            Err(e) => {
                tracing::error!("Không thể serialize ServerMessage (session {}): {}", self.id, e);
            }
        }
    }

    /// Xử lý message từ client - dispatch tới handler tương ứng
    fn handle_client_message(&mut self, msg: &ClientMessage) {
        let user_id = self.identity.user_id;

        match msg {
            ClientMessage::JoinChat { chat_id } => {
                self.server.do_send(JoinChatRoom { user_id, chat_id: *chat_id });
                tracing::debug!("User {} joined chat {}", user_id, chat_id);
            }

            ClientMessage::LeaveChat { chat_id } => {
                self.server.do_send(LeaveChatRoom { user_id, chat_id: *chat_id });
                tracing::debug!("User {} left chat {}", user_id, chat_id);
            }

            ClientMessage::Typing { chat_id } => {
                // Re-broadcast tới chat room, trừ sender
                self.server.do_send(BroadcastToRoom {
                    chat_id: *chat_id,
                    message: ServerMessage::UserTyping { chat_id: *chat_id, user_id },
                    skip_user_id: Some(user_id),
                });
            }

            ClientMessage::StopTyping { chat_id } => {
                self.server.do_send(BroadcastToRoom {
                    chat_id: *chat_id,
                    message: ServerMessage::UserStoppedTyping { chat_id: *chat_id, user_id },
                    skip_user_id: Some(user_id),
                });
            }

            ClientMessage::Ping => {
                self.send_to_client(&ServerMessage::Pong);
            }
        }
    }
}

impl Actor for SocketSession {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::debug!(
            "Socket session started: {} (user {})",
            self.id,
            self.identity.user_id
        );

        // Đăng ký với server: lưu session + join personal room
        self.server.do_send(Connect {
            session_id: self.id,
            user_id: self.identity.user_id,
            addr: ctx.address(),
        });

        // Báo client là connection sẵn sàng
        self.send_to_client(&ServerMessage::Connected { user_id: self.identity.user_id });
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::debug!("Socket session stopped: {}", self.id);

        self.server.do_send(Disconnect { session_id: self.id });
    }
}

/// Implement Message trait cho ClientMessage để có thể send qua actors
impl Message for ClientMessage {
    type Result = ();
}

/// Handler: Nhận ClientMessage từ handler.rs
impl Handler<ClientMessage> for SocketSession {
    type Result = ();

    fn handle(&mut self, msg: ClientMessage, _ctx: &mut Context<Self>) {
        self.handle_client_message(&msg);
    }
}

/// Handler: Transport loop kết thúc → stop actor (trigger Disconnect trong stopped())
impl Handler<CloseSession> for SocketSession {
    type Result = ();

    fn handle(&mut self, _msg: CloseSession, ctx: &mut Context<Self>) {
        ctx.stop();
    }
}

/// Handler: Nhận ServerMessage từ server actor → serialize → gửi tới client
impl Handler<ServerMessage> for SocketSession {
    type Result = ();

    fn handle(&mut self, msg: ServerMessage, _ctx: &mut Context<Self>) {
        self.send_to_client(&msg);
    }
}
