use chrono::Utc;
use deadpool_postgres::Pool;
use uuid::Uuid;

use crate::db::{
    error::Result,
    types::{ProfileUpdate, UserProfile},
};

const COLUMNS: &str = r#""id", "userId", "name", "occupation", "traits", "additionalInfo",
    "disableExternalLinkWarning", "createdAt", "updatedAt""#;

pub async fn get_profile(pool: &Pool, user_id: Uuid) -> Result<Option<UserProfile>> {
    let conn = pool.get().await?;

    let sql = format!(r#"SELECT {} FROM "UserProfile" WHERE "userId" = $1 LIMIT 1"#, COLUMNS);
    let row = conn.query_opt(sql.as_str(), &[&user_id]).await?;

    Ok(row.as_ref().map(UserProfile::from_row))
}

/// Insert the profile or overwrite every field of the existing one
pub async fn upsert_profile(pool: &Pool, user_id: Uuid, update: &ProfileUpdate) -> Result<UserProfile> {
    let conn = pool.get().await?;
    let now = Utc::now();

    let sql = format!(
        r#"INSERT INTO "UserProfile"
               ("id", "userId", "name", "occupation", "traits", "additionalInfo",
                "disableExternalLinkWarning", "createdAt", "updatedAt")
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
           ON CONFLICT ("userId") DO UPDATE SET
               "name" = EXCLUDED."name",
               "occupation" = EXCLUDED."occupation",
               "traits" = EXCLUDED."traits",
               "additionalInfo" = EXCLUDED."additionalInfo",
               "disableExternalLinkWarning" = EXCLUDED."disableExternalLinkWarning",
               "updatedAt" = EXCLUDED."updatedAt"
           RETURNING {}"#,
        COLUMNS
    );

    let row = conn
        .query_one(
            sql.as_str(),
            &[
                &Uuid::new_v4(),
                &user_id,
                &update.name,
                &update.occupation,
                &update.traits_or_default(),
                &update.additional_info,
                &update.disable_external_link_warning.unwrap_or(false),
                &now,
            ],
        )
        .await?;

    Ok(UserProfile::from_row(&row))
}
