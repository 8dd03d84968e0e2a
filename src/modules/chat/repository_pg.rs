use uuid::Uuid;

use crate::modules::chat::model::{ChatRaw, ChatRow, LastMessageRow, ParticipantDetailWithChat};
use crate::modules::chat::repository::{ChatRepository, ParticipantRepository};
use crate::modules::message::schema::MessageEntity;
use crate::{api::error, modules::chat::schema::ChatEntity};

#[derive(Clone)]
pub struct ChatPgRepository {
    pool: sqlx::PgPool,
}

impl ChatPgRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

fn raw_to_row(r: ChatRaw) -> ChatRow {
    let last_message = match (r.last_message_id, r.last_sender_id, r.last_created_at) {
        (Some(message_id), Some(sender_id), Some(created_at)) => {
            Some(LastMessageRow { message_id, content: r.last_content, sender_id, created_at })
        }
        _ => None,
    };

    ChatRow {
        chat_id: r.id,
        name: r.name,
        is_group_chat: r.is_group_chat,
        admin_id: r.admin_id,
        last_message,
        last_message_at: r.last_message_at,
        created_at: r.created_at,
        updated_at: r.updated_at,
    }
}

#[async_trait::async_trait]
impl ChatRepository for ChatPgRepository {
    async fn find_by_id(&self, chat_id: &Uuid) -> Result<Option<ChatEntity>, error::SystemError> {
        let chat = sqlx::query_as::<_, ChatEntity>("SELECT * FROM chats WHERE id = $1")
            .bind(chat_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(chat)
    }

    async fn find_direct_between(
        &self,
        user_a: &Uuid,
        user_b: &Uuid,
    ) -> Result<Option<ChatEntity>, error::SystemError> {
        // scoped to is_group_chat = FALSE: group chats chứa cả 2 user
        // không được phép match ở đây
        let chat = sqlx::query_as::<_, ChatEntity>(
            r#"
            SELECT c.*
            FROM chats c
            WHERE c.is_group_chat = FALSE
            AND EXISTS (
                SELECT 1
                FROM chat_participants p1
                WHERE p1.chat_id = c.id
                AND p1.user_id = $1
            )
            AND EXISTS (
                SELECT 1
                FROM chat_participants p2
                WHERE p2.chat_id = c.id
                AND p2.user_id = $2
            )
            AND NOT EXISTS (
                SELECT 1
                FROM chat_participants p3
                WHERE p3.chat_id = c.id
                AND p3.user_id NOT IN ($1, $2)
            )
            LIMIT 1
            "#,
        )
        .bind(user_a)
        .bind(user_b)
        .fetch_optional(&self.pool)
        .await?;

        Ok(chat)
    }

    async fn create_direct(
        &self,
        name: &str,
        user_a: &Uuid,
        user_b: &Uuid,
    ) -> Result<ChatEntity, error::SystemError> {
        let mut tx = self.pool.begin().await?;

        let chat = sqlx::query_as::<_, ChatEntity>(
            r#"
            INSERT INTO chats (id, name, is_group_chat)
            VALUES ($1, $2, FALSE)
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(name)
        .fetch_one(tx.as_mut())
        .await?;

        sqlx::query(
            r#"
            INSERT INTO chat_participants (chat_id, user_id)
            VALUES ($1, $2), ($1, $3)
            "#,
        )
        .bind(chat.id)
        .bind(user_a)
        .bind(user_b)
        .execute(tx.as_mut())
        .await?;

        tx.commit().await?;

        Ok(chat)
    }

    async fn create_group(
        &self,
        name: &str,
        admin_id: &Uuid,
        member_ids: &[Uuid],
    ) -> Result<ChatEntity, error::SystemError> {
        let mut tx = self.pool.begin().await?;

        let chat = sqlx::query_as::<_, ChatEntity>(
            r#"
            INSERT INTO chats (id, name, is_group_chat, admin_id)
            VALUES ($1, $2, TRUE, $3)
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(name)
        .bind(admin_id)
        .fetch_one(tx.as_mut())
        .await?;

        sqlx::query(
            r#"
            INSERT INTO chat_participants (chat_id, user_id)
            SELECT $1, unnest($2::uuid[])
            "#,
        )
        .bind(chat.id)
        .bind(member_ids)
        .execute(tx.as_mut())
        .await?;

        tx.commit().await?;

        Ok(chat)
    }

    async fn update_name(&self, chat_id: &Uuid, name: &str) -> Result<(), error::SystemError> {
        sqlx::query("UPDATE chats SET name = $2, updated_at = NOW() WHERE id = $1")
            .bind(chat_id)
            .bind(name)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn set_admin(&self, chat_id: &Uuid, user_id: &Uuid) -> Result<(), error::SystemError> {
        sqlx::query("UPDATE chats SET admin_id = $2, updated_at = NOW() WHERE id = $1")
            .bind(chat_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn set_last_message(
        &self,
        chat_id: &Uuid,
        message: Option<&MessageEntity>,
    ) -> Result<(), error::SystemError> {
        sqlx::query(
            r#"
            UPDATE chats
            SET last_message_id = $2,
                last_message_at = $3,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(chat_id)
        .bind(message.map(|m| m.id))
        .bind(message.map(|m| m.created_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, chat_id: &Uuid) -> Result<(), error::SystemError> {
        sqlx::query("DELETE FROM chats WHERE id = $1").bind(chat_id).execute(&self.pool).await?;

        Ok(())
    }

    async fn find_row(&self, chat_id: &Uuid) -> Result<Option<ChatRow>, error::SystemError> {
        let raw = sqlx::query_as::<_, ChatRaw>(
            r#"
            SELECT
                c.id,
                c.name,
                c.is_group_chat,
                c.admin_id,
                c.last_message_at,
                c.created_at,
                c.updated_at,

                m.id            AS last_message_id,
                m.content       AS last_content,
                m.sender_id     AS last_sender_id,
                m.created_at    AS last_created_at
            FROM chats c
            LEFT JOIN messages m ON m.id = c.last_message_id
            WHERE c.id = $1
            LIMIT 1
            "#,
        )
        .bind(chat_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(raw.map(raw_to_row))
    }

    async fn find_rows_by_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<ChatRow>, error::SystemError> {
        let rows = sqlx::query_as::<_, ChatRaw>(
            r#"
            SELECT
                c.id,
                c.name,
                c.is_group_chat,
                c.admin_id,
                c.last_message_at,
                c.created_at,
                c.updated_at,

                m.id            AS last_message_id,
                m.content       AS last_content,
                m.sender_id     AS last_sender_id,
                m.created_at    AS last_created_at

            FROM chats c

            JOIN chat_participants p
                ON p.chat_id = c.id
            AND p.user_id = $1

            LEFT JOIN messages m ON m.id = c.last_message_id

            ORDER BY
                COALESCE(c.last_message_at, c.updated_at) DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(raw_to_row).collect())
    }
}

#[derive(Clone)]
pub struct ParticipantPgRepository {
    pool: sqlx::PgPool,
}

impl ParticipantPgRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ParticipantRepository for ParticipantPgRepository {
    async fn add_many(&self, chat_id: &Uuid, user_ids: &[Uuid]) -> Result<(), error::SystemError> {
        sqlx::query(
            r#"
            INSERT INTO chat_participants (chat_id, user_id)
            SELECT $1, unnest($2::uuid[])
            ON CONFLICT (chat_id, user_id) DO NOTHING
            "#,
        )
        .bind(chat_id)
        .bind(user_ids)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn remove(&self, chat_id: &Uuid, user_id: &Uuid) -> Result<(), error::SystemError> {
        sqlx::query("DELETE FROM chat_participants WHERE chat_id = $1 AND user_id = $2")
            .bind(chat_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list_user_ids(&self, chat_id: &Uuid) -> Result<Vec<Uuid>, error::SystemError> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM chat_participants WHERE chat_id = $1 ORDER BY joined_at",
        )
        .bind(chat_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn is_member(
        &self,
        chat_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<bool, error::SystemError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1
                FROM chat_participants
                WHERE chat_id = $1
                AND user_id = $2
            )
            "#,
        )
        .bind(chat_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn find_by_chat_ids(
        &self,
        chat_ids: &[Uuid],
    ) -> Result<Vec<ParticipantDetailWithChat>, error::SystemError> {
        let participants = sqlx::query_as::<_, ParticipantDetailWithChat>(
            r#"
            SELECT
                p.chat_id,
                p.user_id,
                u.username,
                u.avatar_url,
                p.joined_at
            FROM chat_participants p
            JOIN users u ON u.id = p.user_id
            WHERE p.chat_id = ANY($1)
            ORDER BY p.joined_at
            "#,
        )
        .bind(chat_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(participants)
    }
}
