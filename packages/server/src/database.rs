use std::time::Duration;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use tracing::info;

use crate::config::DatabaseConfig;

pub async fn init_db(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(config.url.to_owned());

    opt.max_connections(config.max_connections)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(300))
        .sqlx_logging(true);

    let db = Database::connect(opt).await?;
    sync_schema(&db).await?;

    Ok(db)
}

/// Create or update every table declared under `entity`, then the indexes
/// the entity attributes cannot express.
pub async fn sync_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    db.get_schema_registry("hackathon_server::entity::*")
        .sync(db)
        .await?;
    ensure_indexes(db).await
}

/// At most one enabled registration per email and hackathon.
const REGISTER_ENABLED_EMAIL_INDEX: &str = "CREATE UNIQUE INDEX IF NOT EXISTS \
     idx_register_enabled_email ON register (hackathon_id, email) WHERE enabled";

pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    db.execute_unprepared(REGISTER_ENABLED_EMAIL_INDEX).await?;
    info!("Ensured index idx_register_enabled_email exists");
    Ok(())
}
