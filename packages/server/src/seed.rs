use sea_orm::*;
use tracing::info;

use crate::config::AppConfig;
use crate::entity::{user, user_email};
use crate::utils::email::normalize_email;
use crate::utils::hash;

/// Create the bootstrap administrator from config if no account has that name yet.
///
/// Returns whether an account was created. An existing account is left as is,
/// including its password.
pub async fn ensure_admin(db: &DatabaseConnection, config: &AppConfig) -> anyhow::Result<bool> {
    let Some((name, password, email)) = config.bootstrap_admin() else {
        return Ok(false);
    };

    let txn = db.begin().await?;

    let existing = user::Entity::find()
        .filter(user::Column::Name.eq(name))
        .one(&txn)
        .await?;
    if existing.is_some() {
        return Ok(false);
    }

    let hash = hash::hash_password(password)
        .map_err(|e| anyhow::anyhow!("Password hash error: {e}"))?;
    let now = chrono::Utc::now();

    let admin = user::ActiveModel {
        name: Set(name.to_string()),
        password: Set(hash),
        role: Set(user::ROLE_ADMIN.to_string()),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    user_email::ActiveModel {
        user_id: Set(admin.id),
        email: Set(normalize_email(email)),
        primary_email: Set(true),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    info!(name, "Seeded bootstrap administrator");
    Ok(true)
}
