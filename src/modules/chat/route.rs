use actix_web::web::{scope, ServiceConfig};

use crate::modules::chat::handle::*;

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/chats")
            .service(get_chats)
            .service(create_direct_chat)
            .service(create_group_chat)
            .service(rename_group_chat)
            .service(leave_group_chat)
            .service(add_group_participants)
            .service(remove_group_participant)
            .service(delete_group_chat)
            .service(delete_direct_chat),
    );
}
