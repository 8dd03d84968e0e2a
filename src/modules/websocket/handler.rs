/// WebSocket HTTP Handler
///
/// Module này xử lý handshake và quản lý bidirectional message flow:
/// - Handshake: resolve identity từ access token TRƯỚC khi session được
///   đăng ký (cookie trước, query param sau)
/// - Inbound:  Client → WebSocket → parse ClientMessage → Session Actor
/// - Outbound: Server Actor → Session Actor → mpsc channel → WebSocket → Client
use actix::{Actor, Addr};
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_ws::Message;
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::constants::ACCESS_TOKEN_COOKIE;
use crate::ENV;
use crate::modules::user::repository::UserRepository;
use crate::modules::user::repository_pg::UserRepositoryPg;
use crate::utils::{Claims, TypeClaims};

use super::events::CloseSession;
use super::message::{ClientMessage, ServerMessage};
use super::server::SocketServer;
use super::session::{SocketIdentity, SocketSession};

#[derive(Debug, Deserialize)]
struct HandshakeQuery {
    token: Option<String>,
}

/// Lấy access token từ request: ưu tiên cookie, fallback query param
fn extract_token(req: &HttpRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(ACCESS_TOKEN_COOKIE) {
        return Some(cookie.value().to_string());
    }

    web::Query::<HandshakeQuery>::from_query(req.query_string())
        .ok()
        .and_then(|q| q.into_inner().token)
}

/// Lookup user của token. Phân biệt user không còn tồn tại với lỗi
/// persistence: lỗi DB không được báo cho client là "user không tồn tại".
async fn lookup_identity<R: UserRepository>(
    user_repo: &R,
    user_id: &uuid::Uuid,
) -> Result<SocketIdentity, &'static str> {
    match user_repo.find_by_id(user_id).await {
        Ok(Some(user)) => Ok(SocketIdentity::from(user)),
        Ok(None) => Err("User belonging to this token no longer exists"),
        Err(e) => {
            tracing::error!("Không thể truy vấn user cho handshake: {}", e);
            Err("Could not verify user, please try again")
        }
    }
}

/// Resolve identity từ access token. Trả về error message dành cho
/// client nếu token thiếu / invalid / user không còn tồn tại.
async fn resolve_identity(
    req: &HttpRequest,
    user_repo: &UserRepositoryPg,
) -> Result<SocketIdentity, &'static str> {
    let token = extract_token(req).ok_or("No access token provided")?;

    let claims = Claims::decode(&token, ENV.jwt_secret.as_bytes())
        .map_err(|_| "Access token invalid or expired")?;

    // Refresh token không được dùng để mở socket
    if claims._type != Some(TypeClaims::AccessToken) {
        return Err("Access token invalid or expired");
    }

    lookup_identity(user_repo, &claims.sub).await
}

/// HTTP handler để upgrade connection thành WebSocket
///
/// Endpoint: GET /ws
///
/// Flow:
/// 1. HTTP handshake → WebSocket connection
/// 2. Resolve identity (handshake fail thì gửi socketError rồi close)
/// 3. Tạo mpsc channel (session actor → client)
/// 4. Start SocketSession actor
/// 5. Spawn async task xử lý bidirectional messages
pub async fn websocket_handler(
    req: HttpRequest,
    stream: web::Payload,
    server: web::Data<Addr<SocketServer>>,
    user_repo: web::Data<UserRepositoryPg>,
) -> Result<HttpResponse, Error> {
    tracing::debug!("WebSocket upgrade request từ {:?}", req.peer_addr());

    // Thực hiện WebSocket handshake
    let (response, mut ws_session, mut msg_stream) = actix_ws::handle(&req, stream)?;

    // Resolve identity trước khi đăng ký session
    let identity = match resolve_identity(&req, user_repo.get_ref()).await {
        Ok(identity) => identity,
        Err(reason) => {
            tracing::warn!("WebSocket handshake rejected: {}", reason);

            // Gửi socketError cho client biết lý do rồi đóng connection
            actix_web::rt::spawn(async move {
                let error = ServerMessage::SocketError { message: reason.to_string() };
                if let Ok(json) = serde_json::to_string(&error) {
                    let _ = ws_session.text(json).await;
                }
                let _ = ws_session.close(None).await;
            });

            return Ok(response);
        }
    };

    // Tạo mpsc channel: session actor gửi JSON → spawned task → WebSocket → client
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let ws_actor = SocketSession::new(server.get_ref().clone(), identity, tx);
    let addr = ws_actor.start();

    // Spawn async task xử lý bidirectional message flow
    actix_web::rt::spawn(async move {
        loop {
            tokio::select! {
                // === INBOUND: Client → Server ===
                msg = msg_stream.recv() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            let text_str = text.to_string();

                            // Parse và forward tới session actor
                            match serde_json::from_str::<ClientMessage>(&text_str) {
                                Ok(client_msg) => {
                                    addr.do_send(client_msg);
                                }
                                Err(e) => {
                                    tracing::warn!(
                                        "Không thể parse client message: {} - raw: {}",
                                        e,
                                        &text_str[..100.min(text_str.len())]
                                    );
                                }
                            }
                        }

                        Some(Ok(Message::Ping(data))) => {
                            // Tự động trả lời pong cho WebSocket-level ping
                            if let Err(e) = ws_session.pong(&data).await {
                                tracing::error!("Không thể gửi pong: {}", e);
                                break;
                            }
                        }

                        Some(Ok(Message::Pong(_))) => {
                            // Heartbeat response - bỏ qua
                        }

                        Some(Ok(Message::Close(reason))) => {
                            tracing::info!("WebSocket close frame: {:?}", reason);
                            break;
                        }

                        Some(Ok(Message::Binary(_))) => {
                            tracing::warn!("Binary messages không được hỗ trợ");
                        }

                        Some(Ok(Message::Continuation(_) | Message::Nop)) => {}

                        Some(Err(e)) => {
                            tracing::error!("WebSocket protocol error: {}", e);
                            break;
                        }

                        // Stream kết thúc (client disconnect)
                        None => break,
                    }
                }

                // === OUTBOUND: Server → Client ===
                Some(json) = rx.recv() => {
                    if ws_session.text(json).await.is_err() {
                        tracing::error!("Không thể gửi message tới WebSocket client");
                        break;
                    }
                }
            }
        }

        // Cleanup: đóng WebSocket và stop session actor
        addr.do_send(CloseSession);
        let _ = ws_session.close(None).await;
        tracing::debug!("WebSocket message loop kết thúc");
    });

    tracing::info!("WebSocket connection established");
    Ok(response)
}
