use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::manager::HackathonManager;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub hackathons: HackathonManager,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: AppConfig) -> Self {
        Self {
            hackathons: HackathonManager::new(db.clone()),
            db,
            config,
        }
    }
}
