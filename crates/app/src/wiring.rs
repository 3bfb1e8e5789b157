use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::cli::StoreChoice;
use crate::comment_service::CommentService;
use crate::config::AppConfig;
use crate::state::AppState;
use adboard_infra::db::{
    CommentStore, DbPoolError, MemoryStore, PgStore, ReactionLedger, connect_lazy,
};
use adboard_infra::media::{MediaError, MediaStorage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl StoreBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            StoreBackend::Postgres => "postgres",
            StoreBackend::Memory => "memory",
        }
    }
}

#[derive(Debug, Error)]
pub enum WiringError {
    #[error("db error: {0}")]
    Db(#[from] DbPoolError),
    #[error("media storage error: {0}")]
    Media(#[from] MediaError),
    #[error("postgres store requested but ADBOARD_DATABASE_URL is not set")]
    MissingDatabaseUrl,
}

pub fn build_state(config: AppConfig, choice: StoreChoice) -> Result<AppState, WiringError> {
    let media = MediaStorage::open(&config.upload_dir, &config.public_media_prefix)?;
    let backend = choice
        .resolve(config.database_url.as_deref())
        .ok_or(WiringError::MissingDatabaseUrl)?;

    let (comments, reactions, db) = match (backend, config.database_url.as_deref()) {
        (StoreBackend::Postgres, Some(url)) => {
            let pool = connect_lazy(url, config.db_max_connections)?;
            let store = Arc::new(PgStore::new(pool.clone()));
            let comments: Arc<dyn CommentStore> = store.clone();
            let reactions: Arc<dyn ReactionLedger> = store;
            (comments, reactions, Some(pool))
        }
        (StoreBackend::Postgres, None) => return Err(WiringError::MissingDatabaseUrl),
        (StoreBackend::Memory, _) => {
            warn!("no database in use; comments are kept in memory only");
            let store = Arc::new(MemoryStore::new());
            let comments: Arc<dyn CommentStore> = store.clone();
            let reactions: Arc<dyn ReactionLedger> = store;
            (comments, reactions, None)
        }
    };
    info!(
        backend = backend.as_str(),
        upload_dir = %media.root().display(),
        public_prefix = media.public_prefix(),
        "comment store ready"
    );

    Ok(AppState {
        config: Arc::new(config),
        comments: Arc::new(CommentService::new(comments, reactions, media)),
        backend,
        db,
    })
}
