use actix::Actor;
use actix_cors::Cors;
use actix_web::{
    self, App, HttpServer,
    middleware::{Logger, from_fn},
    web,
};
use std::sync::{Arc, LazyLock};

use crate::{
    configs::connect_database,
    middlewares::authentication,
    modules::{
        attachment::{repository_pg::AttachmentPgRepository, storage::LocalAttachmentStorage},
        chat::{
            repository_pg::{ChatPgRepository, ParticipantPgRepository},
            service::ChatService,
        },
        message::{repository_pg::MessageRepositoryPg, service::MessageService},
        user::repository_pg::UserRepositoryPg,
        websocket::{handler::websocket_handler, server::SocketServer},
    },
};

mod api;
mod configs;
mod constants;
mod middlewares;
mod modules;
#[cfg(test)]
mod test;
mod utils;

pub static ENV: LazyLock<constants::Env> = LazyLock::new(|| {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
    log::info!("Environment variables loaded from .env file");
    constants::Env::default()
});

#[actix_web::get("/")]
async fn health_check() -> &'static str {
    "Server is running"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let db_pool =
        connect_database().await.map_err(|_| std::io::Error::other("Database connection error"))?;

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .map_err(|_| std::io::Error::other("Database migration error"))?;

    let user_repo = Arc::new(UserRepositoryPg::new(db_pool.clone()));
    let chat_repo = Arc::new(ChatPgRepository::new(db_pool.clone()));
    let participant_repo = Arc::new(ParticipantPgRepository::new(db_pool.clone()));
    let message_repo = Arc::new(MessageRepositoryPg::new(db_pool.clone()));
    let attachment_repo = Arc::new(AttachmentPgRepository::new(db_pool.clone()));
    let storage = Arc::new(LocalAttachmentStorage::new(
        ENV.upload_dir.clone(),
        ENV.upload_base_url.clone(),
    ));

    // Socket server actor: một instance chia sẻ cho toàn process
    let socket_server = Arc::new(SocketServer::new().start());

    let chat_service = web::Data::new(ChatService::with_dependencies(
        chat_repo.clone(),
        participant_repo.clone(),
        user_repo.clone(),
        message_repo.clone(),
        attachment_repo.clone(),
        storage.clone(),
        socket_server.clone(),
    ));
    let message_service = web::Data::new(MessageService::with_dependencies(
        message_repo,
        chat_repo,
        participant_repo,
        attachment_repo,
        storage,
        socket_server.clone(),
    ));

    println!("Starting server at http://{}:{}", ENV.ip.as_str(), ENV.port);
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(ENV.frontend_url.as_str())
            .allow_any_method()
            .allow_any_header()
            .supports_credentials();

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(chat_service.clone())
            .app_data(message_service.clone())
            .app_data(web::Data::new((*socket_server).clone()))
            .app_data(web::Data::from(user_repo.clone()))
            .app_data(web::Data::new(db_pool.clone()))
            .service(health_check)
            .route("/ws", web::get().to(websocket_handler))
            .service(
                web::scope("/api")
                    .wrap(from_fn(authentication))
                    .configure(modules::chat::route::configure)
                    .configure(modules::message::route::configure),
            )
    })
    .bind((ENV.ip.as_str(), ENV.port))?
    .workers(2)
    .run()
    .await
}
