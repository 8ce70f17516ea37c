use deadpool_postgres::Pool;
use uuid::Uuid;

use crate::db::{
    error::{Error, Result},
    types::{Chat, ChatPage, PageCursor},
};

pub async fn get_chat_by_id(pool: &Pool, id: Uuid) -> Result<Option<Chat>> {
    let conn = pool.get().await?;

    let row = conn
        .query_opt(
            r#"SELECT "id", "createdAt", "title", "userId", "visibility" FROM "Chat" WHERE "id" = $1"#,
            &[&id],
        )
        .await?;

    row.as_ref().map(Chat::from_row).transpose()
}

pub async fn save_chat(pool: &Pool, chat: &Chat) -> Result<()> {
    let conn = pool.get().await?;

    conn.execute(
        r#"INSERT INTO "Chat" ("id", "createdAt", "title", "userId", "visibility")
           VALUES ($1, $2, $3, $4, $5)"#,
        &[
            &chat.id,
            &chat.created_at,
            &chat.title,
            &chat.user_id,
            &chat.visibility.as_str(),
        ],
    )
    .await?;

    Ok(())
}

/// Delete a chat with its votes, messages and stream ids
///
/// Everything happens in one transaction; a failure leaves the chat intact.
pub async fn delete_chat_by_id(pool: &Pool, id: Uuid) -> Result<()> {
    let mut conn = pool.get().await?;
    let txn = conn
        .transaction()
        .await
        .map_err(|e| Error::TransactionError(e.to_string()))?;

    txn.execute(r#"DELETE FROM "Vote_v2" WHERE "chatId" = $1"#, &[&id])
        .await?;
    txn.execute(r#"DELETE FROM "Message_v2" WHERE "chatId" = $1"#, &[&id])
        .await?;
    txn.execute(r#"DELETE FROM "Stream" WHERE "chatId" = $1"#, &[&id])
        .await?;
    txn.execute(r#"DELETE FROM "Chat" WHERE "id" = $1"#, &[&id])
        .await?;

    txn.commit()
        .await
        .map_err(|e| Error::TransactionError(e.to_string()))?;

    Ok(())
}

/// One page of a user's chats, newest first
///
/// Fetches one row past `limit` to learn whether more pages exist. A cursor
/// naming an unknown chat is a `NotFoundError`.
pub async fn get_chats_by_user_id(
    pool: &Pool,
    user_id: Uuid,
    limit: i64,
    cursor: PageCursor,
) -> Result<ChatPage> {
    let conn = pool.get().await?;
    let extended_limit = limit.saturating_add(1);

    let rows = match cursor {
        PageCursor::Latest => {
            conn.query(
                r#"SELECT "id", "createdAt", "title", "userId", "visibility" FROM "Chat"
                   WHERE "userId" = $1
                   ORDER BY "createdAt" DESC LIMIT $2"#,
                &[&user_id, &extended_limit],
            )
            .await?
        }
        PageCursor::StartingAfter(cursor_id) | PageCursor::EndingBefore(cursor_id) => {
            let anchor = conn
                .query_opt(r#"SELECT "createdAt" FROM "Chat" WHERE "id" = $1"#, &[&cursor_id])
                .await?
                .ok_or_else(|| {
                    Error::NotFoundError(format!("Chat with id {} not found", cursor_id))
                })?;
            let created_at: chrono::DateTime<chrono::Utc> = anchor.get("createdAt");

            let comparison = match cursor {
                PageCursor::StartingAfter(_) => ">",
                _ => "<",
            };
            let sql = format!(
                r#"SELECT "id", "createdAt", "title", "userId", "visibility" FROM "Chat"
                   WHERE "userId" = $1 AND "createdAt" {} $2
                   ORDER BY "createdAt" DESC LIMIT $3"#,
                comparison
            );
            conn.query(sql.as_str(), &[&user_id, &created_at, &extended_limit])
                .await?
        }
    };

    let mut chats = rows.iter().map(Chat::from_row).collect::<Result<Vec<_>>>()?;
    let has_more = chats.len() as i64 > limit;
    chats.truncate(limit.max(0) as usize);

    Ok(ChatPage { chats, has_more })
}
