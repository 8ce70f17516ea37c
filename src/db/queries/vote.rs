use deadpool_postgres::Pool;
use uuid::Uuid;

use crate::db::{error::Result, types::Vote};

pub async fn get_votes_by_chat_id(pool: &Pool, chat_id: Uuid) -> Result<Vec<Vote>> {
    let conn = pool.get().await?;

    let rows = conn
        .query(
            r#"SELECT "chatId", "messageId", "isUpvoted" FROM "Vote_v2" WHERE "chatId" = $1"#,
            &[&chat_id],
        )
        .await?;

    Ok(rows.iter().map(Vote::from_row).collect())
}

/// Record or flip a vote on a message
pub async fn vote_message(pool: &Pool, chat_id: Uuid, message_id: Uuid, is_upvoted: bool) -> Result<()> {
    let conn = pool.get().await?;

    conn.execute(
        r#"INSERT INTO "Vote_v2" ("chatId", "messageId", "isUpvoted") VALUES ($1, $2, $3)
           ON CONFLICT ("chatId", "messageId") DO UPDATE SET "isUpvoted" = EXCLUDED."isUpvoted""#,
        &[&chat_id, &message_id, &is_upvoted],
    )
    .await?;

    Ok(())
}
