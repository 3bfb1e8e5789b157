use std::collections::HashMap;

use axum::extract::Multipart;

use crate::comment_service::{Draft, MediaUpload};
use crate::http::error::ApiError;

const MEDIA_FIELD: &str = "media";
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// A multipart form with one file field (`media`) and plain text fields.
#[derive(Debug, Default)]
pub struct MediaForm {
    fields: HashMap<String, String>,
    media: Option<MediaUpload>,
}

impl MediaForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = MediaForm::default();
        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            if name == MEDIA_FIELD {
                let original_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or(FALLBACK_CONTENT_TYPE)
                    .to_string();
                let bytes = field.bytes().await?;
                form.media = Some(MediaUpload {
                    bytes: bytes.to_vec(),
                    original_name,
                    content_type,
                });
            } else {
                let value = field.text().await?;
                form.fields.insert(name, value);
            }
        }
        Ok(form)
    }

    pub fn take_text(&mut self, name: &'static str) -> Result<String, ApiError> {
        super::required(name, self.fields.remove(name))
    }

    /// `authorId`, or `worldId` from older clients.
    pub fn take_author_id(&mut self) -> Result<String, ApiError> {
        match self.fields.remove("authorId") {
            Some(author_id) => Ok(author_id),
            None => self.take_text("worldId"),
        }
    }

    /// Splits the form into the text body and the uploaded file.
    pub fn into_draft(mut self) -> Result<(Draft, MediaUpload), ApiError> {
        let author_id = self.take_author_id()?;
        let content = self.take_text("content")?;
        let comment_type = self.take_text("commentType")?.parse()?;
        let media = self
            .media
            .ok_or_else(|| ApiError::BadRequest("no media file uploaded".to_string()))?;
        Ok((
            Draft {
                author_id,
                content,
                comment_type,
                media_url: None,
            },
            media,
        ))
    }
}
