use async_trait::async_trait;
use thiserror::Error;

use adboard_core::domain::comments::{Comment, CommentPatch, NewComment, NewReply, Reply};
use adboard_core::domain::reactions::{NewReaction, Reaction, ReactionType, TargetType};
use adboard_core::error::CoreError;
use adboard_core::types::ObjectId;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("{collection} with id {id} not found")]
    NotFound {
        collection: &'static str,
        id: ObjectId,
    },
    #[error("invalid stored record: {0}")]
    InvalidRecord(#[from] CoreError),
}

impl StoreError {
    pub fn not_found(collection: &'static str, id: ObjectId) -> Self {
        StoreError::NotFound { collection, id }
    }
}

/// Durable storage for comments and replies plus their denormalized counters.
///
/// Every method commits on its own; there is no transaction spanning calls.
/// Listing methods load every matching document and slice the page out of
/// the ordered result in memory.
#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn create_comment(&self, comment: NewComment) -> Result<Comment, StoreError>;

    async fn find_comment_by_id(&self, id: ObjectId) -> Result<Option<Comment>, StoreError>;

    /// Newest first.
    async fn find_comments_by_advertisement(
        &self,
        advertisement_id: &str,
        skip: usize,
        take: usize,
    ) -> Result<Vec<Comment>, StoreError>;

    async fn count_comments_by_advertisement(
        &self,
        advertisement_id: &str,
    ) -> Result<i64, StoreError>;

    async fn update_comment(&self, id: ObjectId, patch: CommentPatch)
    -> Result<Comment, StoreError>;

    /// Removes the comment, then bulk-removes its replies and the reactions
    /// targeting the comment itself. Reactions on those replies are left
    /// behind.
    async fn delete_comment(&self, id: ObjectId) -> Result<(), StoreError>;

    async fn create_reply(&self, reply: NewReply) -> Result<Reply, StoreError>;

    async fn find_reply_by_id(&self, id: ObjectId) -> Result<Option<Reply>, StoreError>;

    /// Oldest first.
    async fn find_replies_by_comment(
        &self,
        comment_id: ObjectId,
        skip: usize,
        take: usize,
    ) -> Result<Vec<Reply>, StoreError>;

    async fn count_replies_by_comment(&self, comment_id: ObjectId) -> Result<i64, StoreError>;

    async fn update_reply(&self, id: ObjectId, patch: CommentPatch) -> Result<Reply, StoreError>;

    /// Removes the reply and the reactions targeting it.
    async fn delete_reply(&self, id: ObjectId) -> Result<(), StoreError>;

    /// Writes the current reply count into the comment. A comment that no
    /// longer exists is logged and skipped.
    async fn recompute_reply_count(&self, comment_id: ObjectId) -> Result<(), StoreError>;

    async fn recompute_reaction_counts(
        &self,
        target_id: ObjectId,
        target_type: TargetType,
    ) -> Result<(), StoreError>;
}

/// Storage for reactions. Holds no cross-collection knowledge; the
/// one-reaction-per-author rule is enforced by its caller.
#[async_trait]
pub trait ReactionLedger: Send + Sync {
    async fn find_by_user_and_target(
        &self,
        author_id: &str,
        target_id: ObjectId,
        target_type: TargetType,
    ) -> Result<Option<Reaction>, StoreError>;

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Reaction>, StoreError>;

    async fn create(&self, reaction: NewReaction) -> Result<Reaction, StoreError>;

    async fn update_type(
        &self,
        id: ObjectId,
        reaction_type: ReactionType,
    ) -> Result<Reaction, StoreError>;

    async fn delete(&self, id: ObjectId) -> Result<(), StoreError>;

    async fn count_by_target_and_type(
        &self,
        target_id: ObjectId,
        target_type: TargetType,
        reaction_type: ReactionType,
    ) -> Result<i64, StoreError>;
}

pub(crate) fn page_slice<T>(items: Vec<T>, skip: usize, take: usize) -> Vec<T> {
    items.into_iter().skip(skip).take(take).collect()
}

pub(crate) fn len_as_i64(len: usize) -> i64 {
    i64::try_from(len).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::page_slice;

    #[test]
    fn page_slice_handles_short_tail() {
        let items: Vec<u32> = (0..12).collect();
        assert_eq!(page_slice(items.clone(), 5, 5), vec![5, 6, 7, 8, 9]);
        assert_eq!(page_slice(items.clone(), 10, 5), vec![10, 11]);
        assert!(page_slice(items, 15, 5).is_empty());
    }
}
