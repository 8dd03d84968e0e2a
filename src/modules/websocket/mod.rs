/// WebSocket Module
///
/// Real-time layer của chat subsystem:
///
/// - Wire protocol (ClientMessage & ServerMessage)
/// - Socket server actor (personal rooms + chat rooms, fan-out)
/// - Socket session actor (một actor cho mỗi connection, giữ identity)
/// - HTTP handler (handshake: resolve identity rồi upgrade thành WebSocket)
pub mod events;
pub mod handler;
pub mod message;
pub mod server;
pub mod session;
