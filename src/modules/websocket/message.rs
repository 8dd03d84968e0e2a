/// WebSocket Wire Protocol
///
/// Module này định nghĩa các message types được trao đổi giữa client và
/// server qua WebSocket connection. Tag `type` giữ nguyên tên event của
/// client cũ (Socket.IO) để frontend không phải đổi.
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Messages được gửi từ client đến server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Mở một chat: join vào chat room để nhận updates real-time
    #[serde(rename_all = "camelCase")]
    JoinChat { chat_id: Uuid },

    /// Đóng chat view: rời chat room (personal room vẫn giữ)
    #[serde(rename_all = "camelCase")]
    LeaveChat { chat_id: Uuid },

    /// Bắt đầu typing trong chat
    #[serde(rename_all = "camelCase")]
    Typing { chat_id: Uuid },

    /// Dừng typing trong chat
    #[serde(rename_all = "camelCase")]
    StopTyping { chat_id: Uuid },

    /// Ping để giữ connection alive
    Ping,
}

/// Messages được gửi từ server đến client
///
/// Entity payloads (`chat`, `message`) là full projection đã serialize,
/// client dùng trực tiếp không cần fetch lại.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Handshake thành công, connection sẵn sàng
    #[serde(rename_all = "camelCase")]
    Connected { user_id: Uuid },

    /// Handshake thất bại hoặc lỗi trong connection
    #[serde(rename_all = "camelCase")]
    SocketError { message: String },

    /// Chat mới (hoặc membership mới) mà user này thuộc về
    #[serde(rename_all = "camelCase")]
    NewChat { chat: serde_json::Value },

    /// Group chat đã được đổi tên
    #[serde(rename_all = "camelCase")]
    GroupNameUpdated { chat: serde_json::Value },

    /// Một participant đã rời/bị xóa, hoặc chat đã bị delete
    #[serde(rename_all = "camelCase")]
    LeaveChat { chat: serde_json::Value },

    /// Message mới trong chat. Event kind này cũng được tái sử dụng cho
    /// message deletion (client phân biệt qua payload), giữ nguyên
    /// contract của client cũ.
    #[serde(rename_all = "camelCase")]
    MessageReceived { chat_id: Uuid, message: serde_json::Value },

    /// Re-broadcast: user đang typing
    #[serde(rename_all = "camelCase")]
    UserTyping { chat_id: Uuid, user_id: Uuid },

    /// Re-broadcast: user dừng typing
    #[serde(rename_all = "camelCase")]
    UserStoppedTyping { chat_id: Uuid, user_id: Uuid },

    /// Pong response cho Ping
    Pong,
}
