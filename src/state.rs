use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::annotations::store::{AnnotationStore, MemoryAnnotationStore, PgAnnotationStore};
use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn AnnotationStore>,
}

impl AppState {
    /// Connects to Postgres and applies pending migrations when `DATABASE_URL`
    /// is set; otherwise falls back to the in-memory store.
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let config = Arc::new(config);

        let store: Arc<dyn AnnotationStore> = match &config.database_url {
            Some(url) => {
                let db = PgPoolOptions::new()
                    .max_connections(config.max_connections)
                    .connect(url)
                    .await
                    .context("connect to database")?;
                sqlx::migrate!("./migrations")
                    .run(&db)
                    .await
                    .context("run migrations")?;
                tracing::info!("using postgres annotation store");
                Arc::new(PgAnnotationStore::new(db))
            }
            None => {
                tracing::warn!("DATABASE_URL not set; annotations are kept in memory only");
                Arc::new(MemoryAnnotationStore::new())
            }
        };

        Ok(Self { config, store })
    }

    pub fn from_parts(config: Arc<AppConfig>, store: Arc<dyn AnnotationStore>) -> Self {
        Self { config, store }
    }
}
