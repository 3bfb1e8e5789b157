pub mod comments;
pub mod media;
pub mod reactions;
