use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use adboard_core::domain::comments::{
    Comment, CommentPage, CommentPatch, CommentType, NewComment, NewReply, Reply, ReplyPage,
};
use adboard_core::domain::media::{is_storage_relative, validate_media_type};
use adboard_core::domain::reactions::{NewReaction, Reaction, ReactionType, TargetType};
use adboard_core::error::CoreError;
use adboard_core::types::{ObjectId, Pagination};
use adboard_infra::db::{CommentStore, ReactionLedger, StoreError};
use adboard_infra::media::{MediaError, MediaStorage};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{0}")]
    NotFound(String),
    #[error("storage failure: {0}")]
    Storage(StoreError),
    #[error("media storage failure: {0}")]
    Media(#[from] MediaError),
}

impl From<CoreError> for ServiceError {
    fn from(err: CoreError) -> Self {
        ServiceError::InvalidArgument(err.to_string())
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => ServiceError::NotFound(err.to_string()),
            other => ServiceError::Storage(other),
        }
    }
}

/// Body shared by comment and reply creation.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub author_id: String,
    pub content: String,
    pub comment_type: CommentType,
    pub media_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub bytes: Vec<u8>,
    pub original_name: String,
    pub content_type: String,
}

/// A resolved reaction target. Its counters are the snapshot that reaction
/// counter writes are derived from.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "targetType", content = "target")]
pub enum Target {
    Comment(Comment),
    Reply(Reply),
}

impl Target {
    fn reaction_count(&self, kind: ReactionType) -> i64 {
        match self {
            Target::Comment(comment) => comment.reaction_count(kind),
            Target::Reply(reply) => reply.reaction_count(kind),
        }
    }
}

pub struct CommentService {
    comments: Arc<dyn CommentStore>,
    reactions: Arc<dyn ReactionLedger>,
    media: MediaStorage,
}

impl CommentService {
    pub fn new(
        comments: Arc<dyn CommentStore>,
        reactions: Arc<dyn ReactionLedger>,
        media: MediaStorage,
    ) -> Self {
        CommentService {
            comments,
            reactions,
            media,
        }
    }

    pub fn media(&self) -> &MediaStorage {
        &self.media
    }

    // Comments

    /// No advertisement existence check is made on any creation path.
    pub async fn create_comment(
        &self,
        advertisement_id: &str,
        mut draft: Draft,
    ) -> Result<Comment, ServiceError> {
        draft.media_url = client_media_url(draft.media_url)?;
        info!(advertisement_id, author_id = %draft.author_id, "creating comment");
        let created = self
            .comments
            .create_comment(new_comment(advertisement_id, draft))
            .await?;
        info!(comment_id = %created.id, "comment created");
        Ok(self.present_comment(created))
    }

    pub async fn create_comment_with_media(
        &self,
        advertisement_id: &str,
        mut draft: Draft,
        upload: MediaUpload,
    ) -> Result<Comment, ServiceError> {
        info!(
            advertisement_id,
            author_id = %draft.author_id,
            content_type = %upload.content_type,
            "creating comment with media"
        );
        draft.media_url = Some(self.store_media(draft.comment_type, &upload).await?);
        let created = self
            .comments
            .create_comment(new_comment(advertisement_id, draft))
            .await?;
        info!(comment_id = %created.id, "comment with media created");
        Ok(self.present_comment(created))
    }

    pub async fn get_comment_by_id(&self, id: &str) -> Result<Comment, ServiceError> {
        let id = parse_id(id)?;
        debug!(comment_id = %id, "fetching comment");
        let comment = self.find_comment(id).await?;
        Ok(self.present_comment(comment))
    }

    pub async fn get_comments_by_advertisement(
        &self,
        advertisement_id: &str,
        pagination: Pagination,
    ) -> Result<CommentPage, ServiceError> {
        info!(
            advertisement_id,
            page = pagination.page(),
            limit = pagination.limit(),
            "listing comments"
        );
        let comments = self
            .comments
            .find_comments_by_advertisement(advertisement_id, pagination.skip(), pagination.take())
            .await?;
        let total = self
            .comments
            .count_comments_by_advertisement(advertisement_id)
            .await?;
        debug!(advertisement_id, returned = comments.len(), total, "comments listed");
        Ok(CommentPage {
            comments: comments
                .into_iter()
                .map(|comment| self.present_comment(comment))
                .collect(),
            total,
            page: pagination.page(),
            limit: pagination.limit(),
        })
    }

    /// Overwrites content, type and media.
    pub async fn update_comment(
        &self,
        id: &str,
        content: String,
        comment_type: CommentType,
        media_url: Option<String>,
    ) -> Result<Comment, ServiceError> {
        let id = parse_id(id)?;
        let media_url = client_media_url(media_url)?;
        info!(comment_id = %id, "updating comment");
        self.find_comment(id).await?;
        let updated = self
            .comments
            .update_comment(id, CommentPatch::body(content, comment_type, media_url))
            .await?;
        Ok(self.present_comment(updated))
    }

    pub async fn delete_comment(&self, id: &str) -> Result<(), ServiceError> {
        let id = parse_id(id)?;
        info!(comment_id = %id, "deleting comment");
        let comment = self.find_comment(id).await?;
        self.comments.delete_comment(id).await?;
        self.discard_media(comment.media_url.as_deref()).await;
        info!(comment_id = %id, "comment deleted");
        Ok(())
    }

    // Replies

    pub async fn create_reply(
        &self,
        comment_id: &str,
        mut draft: Draft,
    ) -> Result<Reply, ServiceError> {
        let comment_id = parse_id(comment_id)?;
        draft.media_url = client_media_url(draft.media_url)?;
        info!(comment_id = %comment_id, author_id = %draft.author_id, "creating reply");
        self.find_comment(comment_id).await?;
        let created = self
            .comments
            .create_reply(new_reply(comment_id, draft))
            .await?;
        info!(reply_id = %created.id, comment_id = %comment_id, "reply created");
        self.reconcile_reply_count(comment_id).await;
        Ok(self.present_reply(created))
    }

    pub async fn create_reply_with_media(
        &self,
        comment_id: &str,
        mut draft: Draft,
        upload: MediaUpload,
    ) -> Result<Reply, ServiceError> {
        let comment_id = parse_id(comment_id)?;
        info!(
            comment_id = %comment_id,
            author_id = %draft.author_id,
            content_type = %upload.content_type,
            "creating reply with media"
        );
        self.find_comment(comment_id).await?;
        draft.media_url = Some(self.store_media(draft.comment_type, &upload).await?);
        let created = self
            .comments
            .create_reply(new_reply(comment_id, draft))
            .await?;
        info!(reply_id = %created.id, comment_id = %comment_id, "reply with media created");
        self.reconcile_reply_count(comment_id).await;
        Ok(self.present_reply(created))
    }

    pub async fn get_reply_by_id(&self, id: &str) -> Result<Reply, ServiceError> {
        let id = parse_id(id)?;
        debug!(reply_id = %id, "fetching reply");
        let reply = self.find_reply(id).await?;
        Ok(self.present_reply(reply))
    }

    pub async fn get_replies_by_comment(
        &self,
        comment_id: &str,
        pagination: Pagination,
    ) -> Result<ReplyPage, ServiceError> {
        let comment_id = parse_id(comment_id)?;
        info!(
            comment_id = %comment_id,
            page = pagination.page(),
            limit = pagination.limit(),
            "listing replies"
        );
        self.find_comment(comment_id).await?;
        let replies = self
            .comments
            .find_replies_by_comment(comment_id, pagination.skip(), pagination.take())
            .await?;
        let total = self.comments.count_replies_by_comment(comment_id).await?;
        Ok(ReplyPage {
            replies: replies
                .into_iter()
                .map(|reply| self.present_reply(reply))
                .collect(),
            total,
            page: pagination.page(),
            limit: pagination.limit(),
        })
    }

    pub async fn update_reply(
        &self,
        id: &str,
        content: String,
        comment_type: CommentType,
        media_url: Option<String>,
    ) -> Result<Reply, ServiceError> {
        let id = parse_id(id)?;
        let media_url = client_media_url(media_url)?;
        info!(reply_id = %id, "updating reply");
        self.find_reply(id).await?;
        let updated = self
            .comments
            .update_reply(id, CommentPatch::body(content, comment_type, media_url))
            .await?;
        Ok(self.present_reply(updated))
    }

    pub async fn delete_reply(&self, id: &str) -> Result<(), ServiceError> {
        let id = parse_id(id)?;
        info!(reply_id = %id, "deleting reply");
        let reply = self.find_reply(id).await?;
        self.comments.delete_reply(id).await?;
        self.reconcile_reply_count(reply.comment_id).await;
        self.discard_media(reply.media_url.as_deref()).await;
        info!(reply_id = %id, "reply deleted");
        Ok(())
    }

    // Reactions

    pub async fn add_reaction(
        &self,
        target_id: &str,
        target_type: &str,
        author_id: &str,
        reaction_type: ReactionType,
    ) -> Result<Reaction, ServiceError> {
        let target_type: TargetType = target_type.parse()?;
        let target_id = parse_id(target_id)?;
        info!(%target_id, %target_type, author_id, %reaction_type, "adding reaction");

        let target = self.resolve_target(target_type, target_id).await?;
        let existing = self
            .reactions
            .find_by_user_and_target(author_id, target_id, target_type)
            .await?;

        match existing {
            Some(existing) if existing.reaction_type == reaction_type => {
                debug!(reaction_id = %existing.id, "reaction unchanged");
                Ok(existing)
            }
            Some(existing) => {
                let previous = existing.reaction_type;
                self.write_reaction_count(
                    target_type,
                    target_id,
                    previous,
                    target.reaction_count(previous) - 1,
                )
                .await?;
                let updated = self.reactions.update_type(existing.id, reaction_type).await?;
                self.write_reaction_count(
                    target_type,
                    target_id,
                    reaction_type,
                    target.reaction_count(reaction_type) + 1,
                )
                .await?;
                info!(reaction_id = %updated.id, from = %previous, to = %reaction_type, "reaction switched");
                Ok(updated)
            }
            None => {
                let created = self
                    .reactions
                    .create(NewReaction {
                        target_id,
                        target_type,
                        author_id: author_id.to_string(),
                        reaction_type,
                    })
                    .await?;
                self.write_reaction_count(
                    target_type,
                    target_id,
                    reaction_type,
                    target.reaction_count(reaction_type) + 1,
                )
                .await?;
                info!(reaction_id = %created.id, "reaction created");
                Ok(created)
            }
        }
    }

    pub async fn remove_reaction(&self, id: &str) -> Result<(), ServiceError> {
        let id = parse_id(id)?;
        info!(reaction_id = %id, "removing reaction");
        let reaction = self
            .reactions
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("reaction with id {id} not found")))?;
        let target = self
            .resolve_target(reaction.target_type, reaction.target_id)
            .await?;
        self.write_reaction_count(
            reaction.target_type,
            reaction.target_id,
            reaction.reaction_type,
            target.reaction_count(reaction.reaction_type) - 1,
        )
        .await?;
        self.reactions.delete(id).await?;
        info!(reaction_id = %id, "reaction removed");
        Ok(())
    }

    pub async fn get_user_reaction(
        &self,
        target_id: &str,
        target_type: &str,
        author_id: &str,
    ) -> Result<Option<Reaction>, ServiceError> {
        let target_type: TargetType = target_type.parse()?;
        let target_id = parse_id(target_id)?;
        debug!(%target_id, %target_type, author_id, "fetching user reaction");
        Ok(self
            .reactions
            .find_by_user_and_target(author_id, target_id, target_type)
            .await?)
    }

    /// Rebuilds the target's counters from the ledger (and the reply count
    /// for comments) and returns the refreshed target.
    pub async fn reconcile_counters(
        &self,
        target_type: &str,
        target_id: &str,
    ) -> Result<Target, ServiceError> {
        let target_type: TargetType = target_type.parse()?;
        let target_id = parse_id(target_id)?;
        info!(%target_id, %target_type, "reconciling counters");
        self.resolve_target(target_type, target_id).await?;
        self.comments
            .recompute_reaction_counts(target_id, target_type)
            .await?;
        if target_type == TargetType::Comment {
            self.comments.recompute_reply_count(target_id).await?;
        }
        let target = match self.resolve_target(target_type, target_id).await? {
            Target::Comment(comment) => Target::Comment(self.present_comment(comment)),
            Target::Reply(reply) => Target::Reply(self.present_reply(reply)),
        };
        Ok(target)
    }

    // Helpers

    async fn find_comment(&self, id: ObjectId) -> Result<Comment, ServiceError> {
        self.comments
            .find_comment_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("comment with id {id} not found")))
    }

    async fn find_reply(&self, id: ObjectId) -> Result<Reply, ServiceError> {
        self.comments
            .find_reply_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("reply with id {id} not found")))
    }

    async fn resolve_target(
        &self,
        target_type: TargetType,
        target_id: ObjectId,
    ) -> Result<Target, ServiceError> {
        match target_type {
            TargetType::Comment => self.find_comment(target_id).await.map(Target::Comment),
            TargetType::Reply => self.find_reply(target_id).await.map(Target::Reply),
        }
    }

    async fn write_reaction_count(
        &self,
        target_type: TargetType,
        target_id: ObjectId,
        kind: ReactionType,
        value: i64,
    ) -> Result<(), ServiceError> {
        let patch = CommentPatch::reaction_count(kind, value);
        match target_type {
            TargetType::Comment => {
                self.comments.update_comment(target_id, patch).await?;
            }
            TargetType::Reply => {
                self.comments.update_reply(target_id, patch).await?;
            }
        }
        debug!(%target_id, %target_type, %kind, value = value.max(0), "reaction count written");
        Ok(())
    }

    async fn reconcile_reply_count(&self, comment_id: ObjectId) {
        if let Err(err) = self.comments.recompute_reply_count(comment_id).await {
            warn!(comment_id = %comment_id, error = %err, "reply count reconciliation failed");
        }
    }

    async fn store_media(
        &self,
        comment_type: CommentType,
        upload: &MediaUpload,
    ) -> Result<String, ServiceError> {
        validate_media_type(comment_type, &upload.content_type)?;
        let relative = self
            .media
            .save(&upload.bytes, &upload.original_name)
            .await?;
        debug!(relative_path = %relative, "media stored");
        Ok(relative)
    }

    async fn discard_media(&self, media_url: Option<&str>) {
        let Some(relative) = media_url.filter(|value| is_storage_relative(value)) else {
            return;
        };
        if let Err(err) = self.media.delete(relative).await {
            warn!(relative_path = relative, error = %err, "failed to delete media file");
        }
    }

    fn public_media_url(&self, media_url: Option<String>) -> Option<String> {
        media_url.map(|value| {
            if is_storage_relative(&value) {
                self.media.to_public_url(&value)
            } else {
                value
            }
        })
    }

    fn present_comment(&self, mut comment: Comment) -> Comment {
        comment.media_url = self.public_media_url(comment.media_url.take());
        comment
    }

    fn present_reply(&self, mut reply: Reply) -> Reply {
        reply.media_url = self.public_media_url(reply.media_url.take());
        reply
    }
}

fn parse_id(raw: &str) -> Result<ObjectId, ServiceError> {
    Ok(ObjectId::try_from(raw)?)
}

/// Paths inside the upload root are only ever assigned by an upload; a client
/// may supply a public URL or nothing.
fn client_media_url(media_url: Option<String>) -> Result<Option<String>, ServiceError> {
    match media_url {
        Some(value) if is_storage_relative(&value) => Err(ServiceError::InvalidArgument(format!(
            "mediaUrl must be an absolute path or URL, got {value}"
        ))),
        other => Ok(other),
    }
}

fn new_comment(advertisement_id: &str, draft: Draft) -> NewComment {
    NewComment {
        advertisement_id: advertisement_id.to_string(),
        author_id: draft.author_id,
        content: draft.content,
        comment_type: draft.comment_type,
        media_url: draft.media_url,
    }
}

fn new_reply(comment_id: ObjectId, draft: Draft) -> NewReply {
    NewReply {
        comment_id,
        author_id: draft.author_id,
        content: draft.content,
        comment_type: draft.comment_type,
        media_url: draft.media_url,
    }
}
