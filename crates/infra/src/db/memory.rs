use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::object_ids::IdGenerator;
use super::store::{len_as_i64, page_slice, CommentStore, ReactionLedger, StoreError};
use adboard_core::domain::comments::{Comment, CommentPatch, NewComment, NewReply, Reply};
use adboard_core::domain::reactions::{NewReaction, Reaction, ReactionType, TargetType};
use adboard_core::types::ObjectId;

#[derive(Debug, Default)]
struct Collections {
    comments: BTreeMap<ObjectId, Comment>,
    replies: BTreeMap<ObjectId, Reply>,
    reactions: BTreeMap<ObjectId, Reaction>,
}

impl Collections {
    fn count_reactions(
        &self,
        target_id: ObjectId,
        target_type: TargetType,
        reaction_type: ReactionType,
    ) -> i64 {
        let count = self
            .reactions
            .values()
            .filter(|reaction| {
                reaction.target_id == target_id
                    && reaction.target_type == target_type
                    && reaction.reaction_type == reaction_type
            })
            .count();
        len_as_i64(count)
    }

    fn count_replies(&self, comment_id: ObjectId) -> i64 {
        let count = self
            .replies
            .values()
            .filter(|reply| reply.comment_id == comment_id)
            .count();
        len_as_i64(count)
    }

    fn remove_reactions_for(&mut self, target_id: ObjectId, target_type: TargetType) -> usize {
        let before = self.reactions.len();
        self.reactions.retain(|_, reaction| {
            !(reaction.target_id == target_id && reaction.target_type == target_type)
        });
        before - self.reactions.len()
    }
}

/// In-process document store used when no database is configured and in
/// tests. Each method takes the lock once, so like the SQL backend every
/// call commits independently of the next.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
    ids: IdGenerator,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CommentStore for MemoryStore {
    async fn create_comment(&self, comment: NewComment) -> Result<Comment, StoreError> {
        let now = Utc::now();
        let comment = Comment {
            id: self.ids.next_id(),
            advertisement_id: comment.advertisement_id,
            author_id: comment.author_id,
            content: comment.content,
            comment_type: comment.comment_type,
            media_url: comment.media_url,
            created_at: now,
            updated_at: now,
            like_count: 0,
            dislike_count: 0,
            reply_count: 0,
        };
        self.inner
            .write()
            .await
            .comments
            .insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn find_comment_by_id(&self, id: ObjectId) -> Result<Option<Comment>, StoreError> {
        Ok(self.inner.read().await.comments.get(&id).cloned())
    }

    async fn find_comments_by_advertisement(
        &self,
        advertisement_id: &str,
        skip: usize,
        take: usize,
    ) -> Result<Vec<Comment>, StoreError> {
        let mut comments: Vec<Comment> = self
            .inner
            .read()
            .await
            .comments
            .values()
            .filter(|comment| comment.advertisement_id == advertisement_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(page_slice(comments, skip, take))
    }

    async fn count_comments_by_advertisement(
        &self,
        advertisement_id: &str,
    ) -> Result<i64, StoreError> {
        let count = self
            .inner
            .read()
            .await
            .comments
            .values()
            .filter(|comment| comment.advertisement_id == advertisement_id)
            .count();
        Ok(len_as_i64(count))
    }

    async fn update_comment(
        &self,
        id: ObjectId,
        patch: CommentPatch,
    ) -> Result<Comment, StoreError> {
        let mut inner = self.inner.write().await;
        let comment = inner
            .comments
            .get_mut(&id)
            .ok_or(StoreError::not_found("comment", id))?;
        patch.apply_to_comment(comment, Utc::now());
        Ok(comment.clone())
    }

    async fn delete_comment(&self, id: ObjectId) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.comments.remove(&id).is_none() {
            return Err(StoreError::not_found("comment", id));
        }
        let before = inner.replies.len();
        inner.replies.retain(|_, reply| reply.comment_id != id);
        let replies = before - inner.replies.len();
        let reactions = inner.remove_reactions_for(id, TargetType::Comment);
        debug!(comment_id = %id, replies, reactions, "comment cascade applied");
        Ok(())
    }

    async fn create_reply(&self, reply: NewReply) -> Result<Reply, StoreError> {
        let now = Utc::now();
        let reply = Reply {
            id: self.ids.next_id(),
            comment_id: reply.comment_id,
            author_id: reply.author_id,
            content: reply.content,
            comment_type: reply.comment_type,
            media_url: reply.media_url,
            created_at: now,
            updated_at: now,
            like_count: 0,
            dislike_count: 0,
        };
        self.inner
            .write()
            .await
            .replies
            .insert(reply.id, reply.clone());
        Ok(reply)
    }

    async fn find_reply_by_id(&self, id: ObjectId) -> Result<Option<Reply>, StoreError> {
        Ok(self.inner.read().await.replies.get(&id).cloned())
    }

    async fn find_replies_by_comment(
        &self,
        comment_id: ObjectId,
        skip: usize,
        take: usize,
    ) -> Result<Vec<Reply>, StoreError> {
        let mut replies: Vec<Reply> = self
            .inner
            .read()
            .await
            .replies
            .values()
            .filter(|reply| reply.comment_id == comment_id)
            .cloned()
            .collect();
        replies.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(page_slice(replies, skip, take))
    }

    async fn count_replies_by_comment(&self, comment_id: ObjectId) -> Result<i64, StoreError> {
        Ok(self.inner.read().await.count_replies(comment_id))
    }

    async fn update_reply(&self, id: ObjectId, patch: CommentPatch) -> Result<Reply, StoreError> {
        let mut inner = self.inner.write().await;
        let reply = inner
            .replies
            .get_mut(&id)
            .ok_or(StoreError::not_found("reply", id))?;
        patch.apply_to_reply(reply, Utc::now());
        Ok(reply.clone())
    }

    async fn delete_reply(&self, id: ObjectId) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.replies.remove(&id).is_none() {
            return Err(StoreError::not_found("reply", id));
        }
        inner.remove_reactions_for(id, TargetType::Reply);
        Ok(())
    }

    async fn recompute_reply_count(&self, comment_id: ObjectId) -> Result<(), StoreError> {
        let reply_count = self.count_replies_by_comment(comment_id).await?;
        let mut inner = self.inner.write().await;
        let Some(comment) = inner.comments.get_mut(&comment_id) else {
            warn!(comment_id = %comment_id, "comment missing while recomputing reply count");
            return Ok(());
        };
        comment.reply_count = reply_count;
        comment.updated_at = Utc::now();
        debug!(comment_id = %comment_id, reply_count, "reply count recomputed");
        Ok(())
    }

    async fn recompute_reaction_counts(
        &self,
        target_id: ObjectId,
        target_type: TargetType,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let like_count = inner.count_reactions(target_id, target_type, ReactionType::Like);
        let dislike_count = inner.count_reactions(target_id, target_type, ReactionType::Dislike);
        match target_type {
            TargetType::Comment => {
                let comment = inner
                    .comments
                    .get_mut(&target_id)
                    .ok_or(StoreError::not_found("comment", target_id))?;
                comment.like_count = like_count;
                comment.dislike_count = dislike_count;
            }
            TargetType::Reply => {
                let reply = inner
                    .replies
                    .get_mut(&target_id)
                    .ok_or(StoreError::not_found("reply", target_id))?;
                reply.like_count = like_count;
                reply.dislike_count = dislike_count;
            }
        }
        debug!(%target_id, %target_type, like_count, dislike_count, "reaction counts recomputed");
        Ok(())
    }
}

#[async_trait]
impl ReactionLedger for MemoryStore {
    async fn find_by_user_and_target(
        &self,
        author_id: &str,
        target_id: ObjectId,
        target_type: TargetType,
    ) -> Result<Option<Reaction>, StoreError> {
        let inner = self.inner.read().await;
        let found = inner.reactions.values().find(|reaction| {
            reaction.author_id == author_id
                && reaction.target_id == target_id
                && reaction.target_type == target_type
        });
        Ok(found.cloned())
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Reaction>, StoreError> {
        Ok(self.inner.read().await.reactions.get(&id).cloned())
    }

    async fn create(&self, reaction: NewReaction) -> Result<Reaction, StoreError> {
        let reaction = Reaction {
            id: self.ids.next_id(),
            target_id: reaction.target_id,
            target_type: reaction.target_type,
            author_id: reaction.author_id,
            reaction_type: reaction.reaction_type,
            created_at: Utc::now(),
        };
        self.inner
            .write()
            .await
            .reactions
            .insert(reaction.id, reaction.clone());
        Ok(reaction)
    }

    async fn update_type(
        &self,
        id: ObjectId,
        reaction_type: ReactionType,
    ) -> Result<Reaction, StoreError> {
        let mut inner = self.inner.write().await;
        let reaction = inner
            .reactions
            .get_mut(&id)
            .ok_or(StoreError::not_found("reaction", id))?;
        reaction.reaction_type = reaction_type;
        Ok(reaction.clone())
    }

    async fn delete(&self, id: ObjectId) -> Result<(), StoreError> {
        match self.inner.write().await.reactions.remove(&id) {
            Some(_) => Ok(()),
            None => Err(StoreError::not_found("reaction", id)),
        }
    }

    async fn count_by_target_and_type(
        &self,
        target_id: ObjectId,
        target_type: TargetType,
        reaction_type: ReactionType,
    ) -> Result<i64, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .count_reactions(target_id, target_type, reaction_type))
    }
}
