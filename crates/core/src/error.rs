use thiserror::Error;

use crate::domain::comments::CommentType;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid object id: {0}")]
    InvalidObjectId(String),
    #[error("invalid comment type: {0}")]
    InvalidCommentType(String),
    #[error("invalid target type: {0} (expected \"Comment\" or \"Reply\")")]
    InvalidTargetType(String),
    #[error("invalid reaction type: {0}")]
    InvalidReactionType(String),
    #[error("invalid pagination: {0}")]
    InvalidPagination(String),
    #[error("invalid file type {mime} for {comment_type} comment")]
    UnsupportedMediaType {
        comment_type: CommentType,
        mime: String,
    },
    #[error("media only allowed for Image/Video comments, got {0}")]
    MediaNotAllowed(CommentType),
}
