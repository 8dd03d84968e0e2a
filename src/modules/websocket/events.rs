/// WebSocket Actor Events
///
/// Module này định nghĩa các messages được trao đổi giữa các actors
/// trong realtime layer (giữa Session actors, Server actor và các
/// services muốn fan-out).
use actix::prelude::*;
use uuid::Uuid;

use super::message::ServerMessage;
use super::session::SocketSession;

/// Event: Session mới connected (identity đã resolve ở handshake)
#[derive(Message)]
#[rtype(result = "()")]
pub struct Connect {
    /// Unique session ID
    pub session_id: Uuid,
    /// User sở hữu connection, dùng làm personal room key
    pub user_id: Uuid,
    /// Address của session actor để có thể gửi messages
    pub addr: Addr<SocketSession>,
}

/// Event: Session disconnected
#[derive(Message)]
#[rtype(result = "()")]
pub struct Disconnect {
    pub session_id: Uuid,
}

/// Event: User mở một chat, join vào chat room
#[derive(Message)]
#[rtype(result = "()")]
pub struct JoinChatRoom {
    pub user_id: Uuid,
    pub chat_id: Uuid,
}

/// Event: User rời chat room
#[derive(Message)]
#[rtype(result = "()")]
pub struct LeaveChatRoom {
    pub user_id: Uuid,
    pub chat_id: Uuid,
}

/// Event: Fan-out tới tất cả users đang ở trong chat room
#[derive(Message, Clone)]
#[rtype(result = "()")]
pub struct BroadcastToRoom {
    pub chat_id: Uuid,
    pub message: ServerMessage,
    /// Optional: không gửi đến user này (thường là sender)
    pub skip_user_id: Option<Uuid>,
}

/// Event: Transport loop kết thúc, session actor phải stop
/// (server vẫn giữ Addr của session nên actor không tự stop được)
#[derive(Message)]
#[rtype(result = "()")]
pub struct CloseSession;

/// Event: Gửi tới personal room của một user (tất cả devices)
#[derive(Message)]
#[rtype(result = "()")]
pub struct SendToUser {
    pub user_id: Uuid,
    pub message: ServerMessage,
}

/// Event: Gửi tới personal rooms của nhiều users
/// (new-chat / chat-deleted / message notifications)
#[derive(Message, Clone)]
#[rtype(result = "()")]
pub struct SendToUsers {
    pub user_ids: Vec<Uuid>,
    pub message: ServerMessage,
}
