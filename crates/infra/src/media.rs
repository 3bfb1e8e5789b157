use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

const COMMENT_MEDIA_DIR: &str = "comments";
const MAX_EXTENSION_LEN: usize = 10;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid media path: {0}")]
    InvalidPath(String),
}

/// Files uploaded with comments and replies, kept under a local root and
/// published below a fixed URL prefix.
#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
    public_prefix: String,
}

impl MediaStorage {
    pub fn open(root: impl Into<PathBuf>, public_prefix: &str) -> Result<Self, MediaError> {
        let root = root.into();
        let media_dir = root.join(COMMENT_MEDIA_DIR);
        if !media_dir.exists() {
            info!(dir = %media_dir.display(), "creating media directory");
            std::fs::create_dir_all(&media_dir)?;
        }
        Ok(MediaStorage {
            root,
            public_prefix: normalize_prefix(public_prefix),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn public_prefix(&self) -> &str {
        &self.public_prefix
    }

    /// Writes the bytes under a fresh uuid name and returns the path relative
    /// to the root, e.g. `comments/3f0c....png`.
    pub async fn save(&self, bytes: &[u8], original_name: &str) -> Result<String, MediaError> {
        let file_name = match extension_of(original_name) {
            Some(ext) => format!("{}.{ext}", Uuid::new_v4()),
            None => Uuid::new_v4().to_string(),
        };
        let relative = format!("{COMMENT_MEDIA_DIR}/{file_name}");
        let path = self.root.join(COMMENT_MEDIA_DIR).join(&file_name);
        tokio::fs::write(&path, bytes).await?;
        debug!(path = %path.display(), size = bytes.len(), "media file saved");
        Ok(relative)
    }

    pub fn to_public_url(&self, relative_path: &str) -> String {
        format!(
            "{}/{}",
            self.public_prefix,
            relative_path.trim_start_matches('/')
        )
    }

    /// Removes a stored file. A file that is already gone is not an error.
    pub async fn delete(&self, relative_path: &str) -> Result<(), MediaError> {
        let path = self.resolve(relative_path)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = %path.display(), "media file deleted");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                warn!(path = %path.display(), "media file already missing");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    fn resolve(&self, relative_path: &str) -> Result<PathBuf, MediaError> {
        let relative = Path::new(relative_path);
        let escapes_root = relative_path.is_empty()
            || relative
                .components()
                .any(|component| !matches!(component, Component::Normal(_)));
        if escapes_root {
            return Err(MediaError::InvalidPath(relative_path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_end_matches('/');
    if trimmed.starts_with('/') || trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

fn extension_of(original_name: &str) -> Option<String> {
    let ext = Path::new(original_name).extension()?.to_str()?;
    if ext.is_empty()
        || ext.len() > MAX_EXTENSION_LEN
        || !ext.chars().all(|ch| ch.is_ascii_alphanumeric())
    {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
