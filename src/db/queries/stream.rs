use chrono::Utc;
use deadpool_postgres::Pool;
use uuid::Uuid;

use crate::db::error::Result;

pub async fn create_stream_id(pool: &Pool, stream_id: Uuid, chat_id: Uuid) -> Result<()> {
    let conn = pool.get().await?;

    conn.execute(
        r#"INSERT INTO "Stream" ("id", "chatId", "createdAt") VALUES ($1, $2, $3)"#,
        &[&stream_id, &chat_id, &Utc::now()],
    )
    .await?;

    Ok(())
}

/// Stream ids of a chat, oldest first
pub async fn get_stream_ids_by_chat_id(pool: &Pool, chat_id: Uuid) -> Result<Vec<Uuid>> {
    let conn = pool.get().await?;

    let rows = conn
        .query(
            r#"SELECT "id" FROM "Stream" WHERE "chatId" = $1 ORDER BY "createdAt" ASC"#,
            &[&chat_id],
        )
        .await?;

    Ok(rows.iter().map(|row| row.get("id")).collect())
}
