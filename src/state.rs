use std::sync::Arc;

use crate::config::AppConfig;
use crate::db;
use crate::events::repo::{EventRepository, PgEventRepository};
use crate::users::repo::{PgUserRepository, UserRepository};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserRepository>,
    pub events: Arc<dyn EventRepository>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let config = Arc::new(config);
        let pool = db::connect(&config).await?;
        db::migrate(&pool).await?;

        Ok(Self {
            users: Arc::new(PgUserRepository { db: pool.clone() }) as Arc<dyn UserRepository>,
            events: Arc::new(PgEventRepository { db: pool }) as Arc<dyn EventRepository>,
            config,
        })
    }

    /// State backed by in-memory repositories, for handler tests.
    #[cfg(test)]
    pub fn in_memory() -> Self {
        use crate::events::repo::InMemoryEventRepository;
        use crate::users::repo::InMemoryUserRepository;

        Self {
            config: Arc::new(AppConfig::for_tests()),
            users: Arc::new(InMemoryUserRepository::default()),
            events: Arc::new(InMemoryEventRepository::default()),
        }
    }
}
