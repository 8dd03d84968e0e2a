use actix_web::{delete, get, patch, post, web, HttpRequest};
use uuid::Uuid;

use crate::{
    api::{error, success},
    middlewares::get_claims,
    modules::{
        attachment::{repository_pg::AttachmentPgRepository, storage::LocalAttachmentStorage},
        chat::{
            model::{AddParticipants, ChatDetail, NewDirectChat, NewGroupChat, RenameGroupChat},
            repository_pg::{ChatPgRepository, ParticipantPgRepository},
            service::ChatService,
        },
        message::repository_pg::MessageRepositoryPg,
        user::repository_pg::UserRepositoryPg,
    },
    utils::ValidatedJson,
};

pub type ChatSvc = ChatService<
    ChatPgRepository,
    ParticipantPgRepository,
    UserRepositoryPg,
    MessageRepositoryPg,
    AttachmentPgRepository,
    LocalAttachmentStorage,
>;

#[get("/")]
pub async fn get_chats(
    chat_svc: web::Data<ChatSvc>,
    req: HttpRequest,
) -> Result<success::Success<Vec<ChatDetail>>, error::Error> {
    let user_id = get_claims(&req)?.sub;

    let chats = chat_svc.get_chats(user_id).await?;

    Ok(success::Success::ok(Some(chats)).message("Successfully retrieved chats"))
}

#[post("/direct")]
pub async fn create_direct_chat(
    chat_svc: web::Data<ChatSvc>,
    body: ValidatedJson<NewDirectChat>,
    req: HttpRequest,
) -> Result<success::Success<ChatDetail>, error::Error> {
    let user_id = get_claims(&req)?.sub;

    let chat = chat_svc.get_or_create_direct(user_id, body.0.user_id).await?;

    Ok(success::Success::ok(Some(chat)).message("Successfully retrieved chat"))
}

#[post("/group")]
pub async fn create_group_chat(
    chat_svc: web::Data<ChatSvc>,
    body: ValidatedJson<NewGroupChat>,
    req: HttpRequest,
) -> Result<success::Success<ChatDetail>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let body = body.0;

    let chat = chat_svc.create_group(user_id, body.name, body.member_ids).await?;

    Ok(success::Success::created(Some(chat)).message("Successfully created group chat"))
}

#[patch("/group/{chat_id}/rename")]
pub async fn rename_group_chat(
    chat_svc: web::Data<ChatSvc>,
    chat_id: web::Path<Uuid>,
    body: ValidatedJson<RenameGroupChat>,
) -> Result<success::Success<ChatDetail>, error::Error> {
    let chat = chat_svc.rename_group(*chat_id, body.0.name).await?;

    Ok(success::Success::ok(Some(chat)).message("Successfully renamed group chat"))
}

#[post("/group/{chat_id}/leave")]
pub async fn leave_group_chat(
    chat_svc: web::Data<ChatSvc>,
    chat_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<ChatDetail>, error::Error> {
    let user_id = get_claims(&req)?.sub;

    let chat = chat_svc.leave_group(user_id, *chat_id).await?;

    Ok(success::Success::ok(Some(chat)).message("Successfully left group chat"))
}

#[post("/group/{chat_id}/participants")]
pub async fn add_group_participants(
    chat_svc: web::Data<ChatSvc>,
    chat_id: web::Path<Uuid>,
    body: ValidatedJson<AddParticipants>,
    req: HttpRequest,
) -> Result<success::Success<ChatDetail>, error::Error> {
    let user_id = get_claims(&req)?.sub;

    let chat = chat_svc.add_participants(user_id, *chat_id, body.0.user_ids).await?;

    Ok(success::Success::ok(Some(chat)).message("Successfully added participants"))
}

#[delete("/group/{chat_id}/participants/{user_id}")]
pub async fn remove_group_participant(
    chat_svc: web::Data<ChatSvc>,
    path: web::Path<(Uuid, Uuid)>,
    req: HttpRequest,
) -> Result<success::Success<ChatDetail>, error::Error> {
    let actor_id = get_claims(&req)?.sub;
    let (chat_id, user_id) = path.into_inner();

    let chat = chat_svc.remove_participant(actor_id, chat_id, user_id).await?;

    Ok(success::Success::ok(Some(chat)).message("Successfully removed participant"))
}

#[delete("/group/{chat_id}")]
pub async fn delete_group_chat(
    chat_svc: web::Data<ChatSvc>,
    chat_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let user_id = get_claims(&req)?.sub;

    chat_svc.delete_group(user_id, *chat_id).await?;

    Ok(success::Success::no_content())
}

#[delete("/direct/{chat_id}")]
pub async fn delete_direct_chat(
    chat_svc: web::Data<ChatSvc>,
    chat_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let user_id = get_claims(&req)?.sub;

    chat_svc.delete_direct(user_id, *chat_id).await?;

    Ok(success::Success::no_content())
}
