use uuid::Uuid;

use crate::{
    api::error,
    modules::attachment::{
        model::NewAttachment, repository::AttachmentRepository, schema::AttachmentEntity,
    },
};

#[derive(Clone)]
pub struct AttachmentPgRepository {
    pool: sqlx::PgPool,
}

impl AttachmentPgRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl AttachmentRepository for AttachmentPgRepository {
    async fn create_many(
        &self,
        attachments: &[NewAttachment],
    ) -> Result<Vec<AttachmentEntity>, error::SystemError> {
        if attachments.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(attachments.len());

        for attachment in attachments {
            let entity = sqlx::query_as::<_, AttachmentEntity>(
                r#"
                INSERT INTO attachments (id, message_id, uploaded_by, url, file_name, mime_type, file_size)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *
                "#,
            )
            .bind(Uuid::now_v7())
            .bind(attachment.message_id)
            .bind(attachment.uploaded_by)
            .bind(&attachment.url)
            .bind(&attachment.file_name)
            .bind(&attachment.mime_type)
            .bind(attachment.file_size)
            .fetch_one(tx.as_mut())
            .await?;

            created.push(entity);
        }

        tx.commit().await?;

        Ok(created)
    }

    async fn find_by_message(
        &self,
        message_id: &Uuid,
    ) -> Result<Vec<AttachmentEntity>, error::SystemError> {
        let attachments = sqlx::query_as::<_, AttachmentEntity>(
            "SELECT * FROM attachments WHERE message_id = $1 ORDER BY created_at",
        )
        .bind(message_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(attachments)
    }

    async fn find_by_chat(
        &self,
        chat_id: &Uuid,
    ) -> Result<Vec<AttachmentEntity>, error::SystemError> {
        let attachments = sqlx::query_as::<_, AttachmentEntity>(
            r#"
            SELECT a.*
            FROM attachments a
            JOIN messages m ON m.id = a.message_id
            WHERE m.chat_id = $1
            "#,
        )
        .bind(chat_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(attachments)
    }

    async fn delete_by_message(&self, message_id: &Uuid) -> Result<u64, error::SystemError> {
        let result = sqlx::query("DELETE FROM attachments WHERE message_id = $1")
            .bind(message_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_by_chat(&self, chat_id: &Uuid) -> Result<u64, error::SystemError> {
        let result = sqlx::query(
            r#"
            DELETE FROM attachments a
            USING messages m
            WHERE m.id = a.message_id
            AND m.chat_id = $1
            "#,
        )
        .bind(chat_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
