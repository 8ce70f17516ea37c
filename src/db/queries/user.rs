use chrono::Utc;
use deadpool_postgres::Pool;
use uuid::Uuid;

use crate::db::{error::Result, types::User};

/// Insert a passwordless guest user
///
/// The email is `guest-<unix millis>` so guest rows stay distinguishable.
pub async fn create_guest_user(pool: &Pool) -> Result<User> {
    let conn = pool.get().await?;

    let user = User {
        id: Uuid::new_v4(),
        email: format!("guest-{}", Utc::now().timestamp_millis()),
    };

    conn.execute(
        r#"INSERT INTO "User" ("id", "email") VALUES ($1, $2)"#,
        &[&user.id, &user.email],
    )
    .await?;

    Ok(user)
}
