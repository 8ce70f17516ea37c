use chrono::{Duration, Utc};
use deadpool_postgres::Pool;
use uuid::Uuid;

use crate::db::{
    error::{Error, Result},
    types::StoredMessage,
};

pub async fn get_messages_by_chat_id(pool: &Pool, chat_id: Uuid) -> Result<Vec<StoredMessage>> {
    let conn = pool.get().await?;

    let rows = conn
        .query(
            r#"SELECT "id", "chatId", "role", "parts", "attachments", "createdAt"
               FROM "Message_v2" WHERE "chatId" = $1
               ORDER BY "createdAt" ASC"#,
            &[&chat_id],
        )
        .await?;

    Ok(rows.iter().map(StoredMessage::from_row).collect())
}

/// Insert messages atomically
pub async fn save_messages(pool: &Pool, messages: &[StoredMessage]) -> Result<()> {
    if messages.is_empty() {
        return Ok(());
    }

    let mut conn = pool.get().await?;
    let txn = conn
        .transaction()
        .await
        .map_err(|e| Error::TransactionError(e.to_string()))?;

    let statement = txn
        .prepare(
            r#"INSERT INTO "Message_v2" ("id", "chatId", "role", "parts", "attachments", "createdAt")
               VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .await?;

    for message in messages {
        txn.execute(
            &statement,
            &[
                &message.id,
                &message.chat_id,
                &message.role,
                &message.parts,
                &message.attachments,
                &message.created_at,
            ],
        )
        .await?;
    }

    txn.commit()
        .await
        .map_err(|e| Error::TransactionError(e.to_string()))?;

    Ok(())
}

/// Number of user-role messages a user sent in the last `hours` hours
pub async fn get_message_count_by_user_id(pool: &Pool, user_id: Uuid, hours: i64) -> Result<i64> {
    let conn = pool.get().await?;
    let since = Utc::now() - Duration::hours(hours);

    let row = conn
        .query_one(
            r#"SELECT count(m."id") AS "count"
               FROM "Message_v2" m
               INNER JOIN "Chat" c ON m."chatId" = c."id"
               WHERE c."userId" = $1 AND m."createdAt" >= $2 AND m."role" = 'user'"#,
            &[&user_id, &since],
        )
        .await?;

    Ok(row.get("count"))
}
