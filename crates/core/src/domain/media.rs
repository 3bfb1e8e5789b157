use crate::domain::comments::CommentType;
use crate::error::CoreError;

pub const IMAGE_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/jpg", "image/gif"];
pub const VIDEO_MIME_TYPES: &[&str] = &["video/mp4", "video/mpeg", "video/quicktime", "video/x-msvideo"];

pub fn validate_media_type(comment_type: CommentType, mime: &str) -> Result<(), CoreError> {
    let allowed = match comment_type {
        CommentType::Image => IMAGE_MIME_TYPES,
        CommentType::Video => VIDEO_MIME_TYPES,
        CommentType::Text | CommentType::Emoticon => {
            return Err(CoreError::MediaNotAllowed(comment_type));
        }
    };
    if allowed.contains(&mime) {
        Ok(())
    } else {
        Err(CoreError::UnsupportedMediaType {
            comment_type,
            mime: mime.to_string(),
        })
    }
}

/// True when a stored media value is a path inside the upload root rather
/// than an already public URL (absolute path or scheme-qualified link).
pub fn is_storage_relative(media_url: &str) -> bool {
    let trimmed = media_url.trim();
    !trimmed.is_empty() && !trimmed.starts_with('/') && !trimmed.contains("://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_allow_list() {
        for mime in ["image/jpeg", "image/png", "image/jpg", "image/gif"] {
            validate_media_type(CommentType::Image, mime).unwrap();
        }
        assert!(validate_media_type(CommentType::Image, "image/webp").is_err());
        assert!(validate_media_type(CommentType::Image, "video/mp4").is_err());
    }

    #[test]
    fn mime_must_match_allow_list_exactly() {
        for mime in ["IMAGE/PNG", "image/png ", " image/png", "Image/Gif"] {
            let err = validate_media_type(CommentType::Image, mime).unwrap_err();
            assert!(matches!(err, CoreError::UnsupportedMediaType { .. }));
        }
    }

    #[test]
    fn video_allow_list() {
        for mime in ["video/mp4", "video/mpeg", "video/quicktime", "video/x-msvideo"] {
            validate_media_type(CommentType::Video, mime).unwrap();
        }
        assert!(validate_media_type(CommentType::Video, "image/png").is_err());
    }

    #[test]
    fn pdf_is_rejected_for_image_comment() {
        let err = validate_media_type(CommentType::Image, "application/pdf").unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedMediaType { .. }));
    }

    #[test]
    fn text_comments_cannot_carry_media() {
        let err = validate_media_type(CommentType::Text, "image/png").unwrap_err();
        assert!(matches!(err, CoreError::MediaNotAllowed(CommentType::Text)));
        assert!(validate_media_type(CommentType::Emoticon, "image/gif").is_err());
    }

    #[test]
    fn storage_relative_detection() {
        assert!(is_storage_relative("comments/abc.png"));
        assert!(!is_storage_relative("/uploads/comments/abc.png"));
        assert!(!is_storage_relative("https://cdn.example.com/a.png"));
        assert!(!is_storage_relative(""));
    }
}
