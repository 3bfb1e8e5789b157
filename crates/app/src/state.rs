use std::sync::Arc;

use crate::comment_service::CommentService;
use crate::config::AppConfig;
use crate::wiring::StoreBackend;
use adboard_infra::db::DbPool;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub comments: Arc<CommentService>,
    pub backend: StoreBackend,
    pub db: Option<DbPool>,
}

#[cfg(test)]
impl AppState {
    /// Memory-backed state with uploads under `upload_dir`.
    pub fn in_memory(upload_dir: &std::path::Path) -> Self {
        use crate::cli::StoreChoice;

        crate::wiring::build_state(AppConfig::for_tests(upload_dir), StoreChoice::Memory)
            .expect("memory state")
    }
}
