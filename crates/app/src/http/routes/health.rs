use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub modules: HealthModules,
}

#[derive(Debug, Serialize)]
pub struct HealthModules {
    pub store: StoreStatus,
    pub media: MediaStatus,
}

#[derive(Debug, Serialize)]
pub struct StoreStatus {
    pub backend: &'static str,
    pub database_configured: bool,
}

#[derive(Debug, Serialize)]
pub struct MediaStatus {
    pub upload_dir: String,
    pub public_prefix: String,
    pub writable: bool,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let media = state.comments.media();
    let writable = tokio::fs::metadata(media.root())
        .await
        .is_ok_and(|meta| meta.is_dir() && !meta.permissions().readonly());

    Json(HealthResponse {
        status: "ok",
        modules: HealthModules {
            store: StoreStatus {
                backend: state.backend.as_str(),
                database_configured: state.db.is_some(),
            },
            media: MediaStatus {
                upload_dir: media.root().display().to_string(),
                public_prefix: media.public_prefix().to_string(),
                writable,
            },
        },
    })
}
