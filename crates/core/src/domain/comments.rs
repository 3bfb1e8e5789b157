use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::reactions::ReactionType;
use crate::error::CoreError;
use crate::types::ObjectId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommentType {
    Text,
    Emoticon,
    Image,
    Video,
}

impl CommentType {
    pub fn as_str(self) -> &'static str {
        match self {
            CommentType::Text => "Text",
            CommentType::Emoticon => "Emoticon",
            CommentType::Image => "Image",
            CommentType::Video => "Video",
        }
    }
}

impl FromStr for CommentType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Text" => Ok(CommentType::Text),
            "Emoticon" => Ok(CommentType::Emoticon),
            "Image" => Ok(CommentType::Image),
            "Video" => Ok(CommentType::Video),
            other => Err(CoreError::InvalidCommentType(other.to_string())),
        }
    }
}

impl fmt::Display for CommentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: ObjectId,
    pub advertisement_id: String,
    pub author_id: String,
    pub content: String,
    pub comment_type: CommentType,
    pub media_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub like_count: i64,
    pub dislike_count: i64,
    pub reply_count: i64,
}

impl Comment {
    pub fn reaction_count(&self, kind: ReactionType) -> i64 {
        match kind {
            ReactionType::Like => self.like_count,
            ReactionType::Dislike => self.dislike_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub id: ObjectId,
    pub comment_id: ObjectId,
    pub author_id: String,
    pub content: String,
    pub comment_type: CommentType,
    pub media_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub like_count: i64,
    pub dislike_count: i64,
}

impl Reply {
    pub fn reaction_count(&self, kind: ReactionType) -> i64 {
        match kind {
            ReactionType::Like => self.like_count,
            ReactionType::Dislike => self.dislike_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewComment {
    pub advertisement_id: String,
    pub author_id: String,
    pub content: String,
    pub comment_type: CommentType,
    pub media_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewReply {
    pub comment_id: ObjectId,
    pub author_id: String,
    pub content: String,
    pub comment_type: CommentType,
    pub media_url: Option<String>,
}

/// Partial update for a comment or reply. `None` leaves a field untouched;
/// `media_url: Some(None)` clears the stored media. `reply_count` is ignored
/// for replies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentPatch {
    pub content: Option<String>,
    pub comment_type: Option<CommentType>,
    pub media_url: Option<Option<String>>,
    pub like_count: Option<i64>,
    pub dislike_count: Option<i64>,
    pub reply_count: Option<i64>,
}

impl CommentPatch {
    pub fn body(content: String, comment_type: CommentType, media_url: Option<String>) -> Self {
        CommentPatch {
            content: Some(content),
            comment_type: Some(comment_type),
            media_url: Some(media_url),
            ..CommentPatch::default()
        }
    }

    pub fn reaction_count(kind: ReactionType, value: i64) -> Self {
        let value = value.max(0);
        match kind {
            ReactionType::Like => CommentPatch {
                like_count: Some(value),
                ..CommentPatch::default()
            },
            ReactionType::Dislike => CommentPatch {
                dislike_count: Some(value),
                ..CommentPatch::default()
            },
        }
    }

    pub fn apply_to_comment(&self, comment: &mut Comment, now: DateTime<Utc>) {
        if let Some(content) = &self.content {
            comment.content = content.clone();
        }
        if let Some(comment_type) = self.comment_type {
            comment.comment_type = comment_type;
        }
        if let Some(media_url) = &self.media_url {
            comment.media_url = media_url.clone();
        }
        if let Some(value) = self.like_count {
            comment.like_count = value;
        }
        if let Some(value) = self.dislike_count {
            comment.dislike_count = value;
        }
        if let Some(value) = self.reply_count {
            comment.reply_count = value;
        }
        comment.updated_at = now;
    }

    pub fn apply_to_reply(&self, reply: &mut Reply, now: DateTime<Utc>) {
        if let Some(content) = &self.content {
            reply.content = content.clone();
        }
        if let Some(comment_type) = self.comment_type {
            reply.comment_type = comment_type;
        }
        if let Some(media_url) = &self.media_url {
            reply.media_url = media_url.clone();
        }
        if let Some(value) = self.like_count {
            reply.like_count = value;
        }
        if let Some(value) = self.dislike_count {
            reply.dislike_count = value;
        }
        reply.updated_at = now;
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentPage {
    pub comments: Vec<Comment>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyPage {
    pub replies: Vec<Reply>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn sample_comment() -> Comment {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Comment {
            id: "60d21b4667d0d8992e610c85".parse().unwrap(),
            advertisement_id: "ad-1".to_string(),
            author_id: "world-1".to_string(),
            content: "hello".to_string(),
            comment_type: CommentType::Image,
            media_url: Some("comments/a.png".to_string()),
            created_at: ts,
            updated_at: ts,
            like_count: 3,
            dislike_count: 1,
            reply_count: 2,
        }
    }

    #[test]
    fn comment_type_parses_exact_names() {
        assert_eq!("Video".parse::<CommentType>().unwrap(), CommentType::Video);
        assert!("video".parse::<CommentType>().is_err());
        assert!("Audio".parse::<CommentType>().is_err());
    }

    #[test]
    fn counter_patch_never_goes_negative() {
        let patch = CommentPatch::reaction_count(ReactionType::Dislike, -1);
        assert_eq!(patch.dislike_count, Some(0));
        assert_eq!(patch.like_count, None);
    }

    #[test]
    fn body_patch_overwrites_and_clears_media() {
        let mut comment = sample_comment();
        let later = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        CommentPatch::body("edited".to_string(), CommentType::Text, None)
            .apply_to_comment(&mut comment, later);
        assert_eq!(comment.content, "edited");
        assert_eq!(comment.comment_type, CommentType::Text);
        assert_eq!(comment.media_url, None);
        assert_eq!(comment.updated_at, later);
        assert_eq!(comment.like_count, 3);
        assert_eq!(comment.reply_count, 2);
    }

    #[test]
    fn comment_serializes_camel_case() {
        let value = serde_json::to_value(sample_comment()).unwrap();
        assert_eq!(value["advertisementId"], "ad-1");
        assert_eq!(value["commentType"], "Image");
        assert_eq!(value["likeCount"], 3);
        assert_eq!(value["id"], "60d21b4667d0d8992e610c85");
    }
}
