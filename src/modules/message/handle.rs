use actix_multipart::Multipart;
use actix_web::{delete, get, post, web, HttpRequest};
use futures_util::TryStreamExt;
use uuid::Uuid;

use crate::{
    api::{error, success},
    middlewares::get_claims,
    modules::{
        attachment::{
            model::AttachmentUpload, repository_pg::AttachmentPgRepository,
            storage::LocalAttachmentStorage,
        },
        chat::repository_pg::{ChatPgRepository, ParticipantPgRepository},
        message::{model::MessageDetail, repository_pg::MessageRepositoryPg, service::MessageService},
    },
    ENV,
};

pub type MessageSvc = MessageService<
    MessageRepositoryPg,
    ChatPgRepository,
    ParticipantPgRepository,
    AttachmentPgRepository,
    LocalAttachmentStorage,
>;

/// Parse multipart body: field "content" là text, mọi field có filename
/// là attachment. Field khác bị bỏ qua.
async fn parse_send_payload(
    mut payload: Multipart,
) -> Result<(Option<String>, Vec<AttachmentUpload>), error::Error> {
    let mut content: Option<String> = None;
    let mut uploads: Vec<AttachmentUpload> = Vec::new();

    while let Some(mut field) = payload.try_next().await.map_err(|_| error::Error::InternalServer)?
    {
        let Some(content_disposition) = field.content_disposition() else {
            continue;
        };

        let field_name = content_disposition.get_name().unwrap_or_default().to_string();
        let file_name = content_disposition.get_filename().map(|f| f.to_string());

        // Read field bytes
        let mut bytes = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(|_| error::Error::InternalServer)? {
            bytes.extend_from_slice(&chunk);

            if bytes.len() > ENV.max_upload_size {
                return Err(error::Error::bad_request("File too large"));
            }
        }

        match file_name {
            Some(file_name) => {
                // Detect MIME type, fallback dựa theo extension
                let mime_type = field.content_type().map(|m| m.to_string()).unwrap_or_else(|| {
                    mime_guess::from_path(&file_name).first_or_octet_stream().to_string()
                });

                uploads.push(AttachmentUpload { file_name, mime_type, bytes });
            }
            None if field_name == "content" => {
                let text = String::from_utf8(bytes)
                    .map_err(|_| error::Error::bad_request("Content must be valid UTF-8"))?;
                content = Some(text);
            }
            None => {}
        }
    }

    Ok((content, uploads))
}

#[post("/{chat_id}")]
pub async fn send_message(
    message_svc: web::Data<MessageSvc>,
    chat_id: web::Path<Uuid>,
    payload: Multipart,
    req: HttpRequest,
) -> Result<success::Success<MessageDetail>, error::Error> {
    let user_id = get_claims(&req)?.sub;

    let (content, uploads) = parse_send_payload(payload).await?;

    let message = message_svc.send(user_id, *chat_id, content, uploads).await?;

    Ok(success::Success::created(Some(message)).message("Successfully sent message"))
}

#[get("/{chat_id}")]
pub async fn get_messages(
    message_svc: web::Data<MessageSvc>,
    chat_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<Vec<MessageDetail>>, error::Error> {
    let user_id = get_claims(&req)?.sub;

    let messages = message_svc.list(user_id, *chat_id).await?;

    Ok(success::Success::ok(Some(messages)).message("Successfully retrieved messages"))
}

#[delete("/{message_id}")]
pub async fn delete_message(
    message_svc: web::Data<MessageSvc>,
    message_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let user_id = get_claims(&req)?.sub;

    message_svc.delete(user_id, *message_id).await?;

    Ok(success::Success::no_content())
}
