//! Idempotent schema setup run at startup

use deadpool_postgres::Pool;

use crate::db::error::Result;

const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS "User" (
        "id" uuid PRIMARY KEY NOT NULL,
        "email" varchar(64) NOT NULL,
        "password" varchar(64)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS "Chat" (
        "id" uuid PRIMARY KEY NOT NULL,
        "createdAt" timestamptz NOT NULL,
        "title" text NOT NULL,
        "userId" uuid NOT NULL REFERENCES "User"("id"),
        "visibility" varchar NOT NULL DEFAULT 'private'
    )"#,
    r#"CREATE TABLE IF NOT EXISTS "Message_v2" (
        "id" uuid PRIMARY KEY NOT NULL,
        "chatId" uuid NOT NULL REFERENCES "Chat"("id"),
        "role" varchar NOT NULL,
        "parts" json NOT NULL,
        "attachments" json NOT NULL,
        "createdAt" timestamptz NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS "Vote_v2" (
        "chatId" uuid NOT NULL REFERENCES "Chat"("id"),
        "messageId" uuid NOT NULL REFERENCES "Message_v2"("id"),
        "isUpvoted" boolean NOT NULL,
        PRIMARY KEY ("chatId", "messageId")
    )"#,
    r#"CREATE TABLE IF NOT EXISTS "Stream" (
        "id" uuid PRIMARY KEY NOT NULL,
        "chatId" uuid NOT NULL REFERENCES "Chat"("id"),
        "createdAt" timestamptz NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS "UserProfile" (
        "id" uuid PRIMARY KEY NOT NULL,
        "userId" uuid NOT NULL UNIQUE REFERENCES "User"("id"),
        "name" text,
        "occupation" text,
        "traits" json NOT NULL DEFAULT '[]',
        "additionalInfo" text,
        "disableExternalLinkWarning" boolean NOT NULL DEFAULT false,
        "createdAt" timestamptz NOT NULL DEFAULT now(),
        "updatedAt" timestamptz NOT NULL DEFAULT now()
    )"#,
    r#"CREATE INDEX IF NOT EXISTS "Message_v2_chatId_idx" ON "Message_v2" ("chatId", "createdAt")"#,
    r#"CREATE INDEX IF NOT EXISTS "Chat_userId_idx" ON "Chat" ("userId", "createdAt")"#,
];

/// Create every table and index that does not exist yet
pub async fn run(pool: &Pool) -> Result<()> {
    let conn = pool.get().await?;

    for statement in SCHEMA {
        conn.batch_execute(statement).await?;
    }

    tracing::info!(statements = SCHEMA.len(), "database schema ready");
    Ok(())
}
