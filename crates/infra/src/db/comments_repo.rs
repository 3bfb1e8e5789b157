use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::{debug, warn};

use super::object_ids::IdGenerator;
use super::store::{page_slice, CommentStore, ReactionLedger, StoreError};
use adboard_core::domain::comments::{Comment, CommentPatch, NewComment, NewReply, Reply};
use adboard_core::domain::reactions::{ReactionType, TargetType};
use adboard_core::types::ObjectId;

const COMMENT_COLUMNS: &str = "id, advertisement_id, author_id, content, comment_type, media_url, \
     created_at, updated_at, like_count, dislike_count, reply_count";
const REPLY_COLUMNS: &str = "id, comment_id, author_id, content, comment_type, media_url, \
     created_at, updated_at, like_count, dislike_count";

/// PostgreSQL-backed document store. Comments, replies and reactions live in
/// three tables that only reference each other by id.
pub struct PgStore {
    pool: PgPool,
    pub(super) ids: IdGenerator,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore {
            pool,
            ids: IdGenerator::new(),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CommentStore for PgStore {
    async fn create_comment(&self, comment: NewComment) -> Result<Comment, StoreError> {
        let now = now_micros();
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
        sqlx::query(
            r#"
            INSERT INTO comments (
                id,
                advertisement_id,
                author_id,
                content,
                comment_type,
                media_url,
                created_at,
                updated_at,
                like_count,
                dislike_count,
                reply_count
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 0, 0, 0)
            "#,
        )
        .bind(comment.id.to_hex())
        .bind(&comment.advertisement_id)
        .bind(&comment.author_id)
        .bind(&comment.content)
        .bind(comment.comment_type.as_str())
        .bind(&comment.media_url)
        .bind(comment.created_at)
        .bind(comment.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(comment)
    }

    async fn find_comment_by_id(&self, id: ObjectId) -> Result<Option<Comment>, StoreError> {
        let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.to_hex())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(map_comment).transpose()
    }

    async fn find_comments_by_advertisement(
        &self,
        advertisement_id: &str,
        skip: usize,
        take: usize,
    ) -> Result<Vec<Comment>, StoreError> {
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments \
             WHERE advertisement_id = $1 \
             ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(advertisement_id)
            .fetch_all(&self.pool)
            .await?;
        debug!(advertisement_id, total = rows.len(), skip, take, "loaded comments for page");
        let comments = rows.iter().map(map_comment).collect::<Result<Vec<_>, _>>()?;
        Ok(page_slice(comments, skip, take))
    }

    async fn count_comments_by_advertisement(
        &self,
        advertisement_id: &str,
    ) -> Result<i64, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS count
            FROM comments
            WHERE advertisement_id = $1
            "#,
        )
        .bind(advertisement_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get("count")?)
    }

    async fn update_comment(
        &self,
        id: ObjectId,
        patch: CommentPatch,
    ) -> Result<Comment, StoreError> {
        let sql = format!(
            "UPDATE comments SET \
                 content = COALESCE($2, content), \
                 comment_type = COALESCE($3, comment_type), \
                 media_url = CASE WHEN $4 THEN $5 ELSE media_url END, \
                 like_count = COALESCE($6, like_count), \
                 dislike_count = COALESCE($7, dislike_count), \
                 reply_count = COALESCE($8, reply_count), \
                 updated_at = $9 \
             WHERE id = $1 \
             RETURNING {COMMENT_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(id.to_hex())
            .bind(patch.content.as_deref())
            .bind(patch.comment_type.map(|value| value.as_str()))
            .bind(patch.media_url.is_some())
            .bind(patch.media_url.flatten())
            .bind(patch.like_count)
            .bind(patch.dislike_count)
            .bind(patch.reply_count)
            .bind(now_micros())
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => map_comment(&row),
            None => Err(StoreError::not_found("comment", id)),
        }
    }

    async fn delete_comment(&self, id: ObjectId) -> Result<(), StoreError> {
        let hex = id.to_hex();
        let deleted = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(&hex)
            .execute(&self.pool)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(StoreError::not_found("comment", id));
        }
        let replies = sqlx::query("DELETE FROM replies WHERE comment_id = $1")
            .bind(&hex)
            .execute(&self.pool)
            .await?;
        let reactions = sqlx::query(
            r#"
            DELETE FROM reactions
            WHERE target_id = $1 AND target_type = $2
            "#,
        )
        .bind(&hex)
        .bind(TargetType::Comment.as_str())
        .execute(&self.pool)
        .await?;
        debug!(
            comment_id = %id,
            replies = replies.rows_affected(),
            reactions = reactions.rows_affected(),
            "comment cascade applied"
        );
        Ok(())
    }

    async fn create_reply(&self, reply: NewReply) -> Result<Reply, StoreError> {
        let now = now_micros();
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
        sqlx::query(
            r#"
            INSERT INTO replies (
                id,
                comment_id,
                author_id,
                content,
                comment_type,
                media_url,
                created_at,
                updated_at,
                like_count,
                dislike_count
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 0, 0)
            "#,
        )
        .bind(reply.id.to_hex())
        .bind(reply.comment_id.to_hex())
        .bind(&reply.author_id)
        .bind(&reply.content)
        .bind(reply.comment_type.as_str())
        .bind(&reply.media_url)
        .bind(reply.created_at)
        .bind(reply.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(reply)
    }

    async fn find_reply_by_id(&self, id: ObjectId) -> Result<Option<Reply>, StoreError> {
        let sql = format!("SELECT {REPLY_COLUMNS} FROM replies WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.to_hex())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(map_reply).transpose()
    }

    async fn find_replies_by_comment(
        &self,
        comment_id: ObjectId,
        skip: usize,
        take: usize,
    ) -> Result<Vec<Reply>, StoreError> {
        let sql = format!(
            "SELECT {REPLY_COLUMNS} FROM replies \
             WHERE comment_id = $1 \
             ORDER BY created_at ASC, id ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(comment_id.to_hex())
            .fetch_all(&self.pool)
            .await?;
        debug!(comment_id = %comment_id, total = rows.len(), skip, take, "loaded replies for page");
        let replies = rows.iter().map(map_reply).collect::<Result<Vec<_>, _>>()?;
        Ok(page_slice(replies, skip, take))
    }

    async fn count_replies_by_comment(&self, comment_id: ObjectId) -> Result<i64, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS count
            FROM replies
            WHERE comment_id = $1
            "#,
        )
        .bind(comment_id.to_hex())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get("count")?)
    }

    async fn update_reply(&self, id: ObjectId, patch: CommentPatch) -> Result<Reply, StoreError> {
        let sql = format!(
            "UPDATE replies SET \
                 content = COALESCE($2, content), \
                 comment_type = COALESCE($3, comment_type), \
                 media_url = CASE WHEN $4 THEN $5 ELSE media_url END, \
                 like_count = COALESCE($6, like_count), \
                 dislike_count = COALESCE($7, dislike_count), \
                 updated_at = $8 \
             WHERE id = $1 \
             RETURNING {REPLY_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(id.to_hex())
            .bind(patch.content.as_deref())
            .bind(patch.comment_type.map(|value| value.as_str()))
            .bind(patch.media_url.is_some())
            .bind(patch.media_url.flatten())
            .bind(patch.like_count)
            .bind(patch.dislike_count)
            .bind(now_micros())
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => map_reply(&row),
            None => Err(StoreError::not_found("reply", id)),
        }
    }

    async fn delete_reply(&self, id: ObjectId) -> Result<(), StoreError> {
        let hex = id.to_hex();
        let deleted = sqlx::query("DELETE FROM replies WHERE id = $1")
            .bind(&hex)
            .execute(&self.pool)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(StoreError::not_found("reply", id));
        }
        sqlx::query(
            r#"
            DELETE FROM reactions
            WHERE target_id = $1 AND target_type = $2
            "#,
        )
        .bind(&hex)
        .bind(TargetType::Reply.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn recompute_reply_count(&self, comment_id: ObjectId) -> Result<(), StoreError> {
        let reply_count = self.count_replies_by_comment(comment_id).await?;
        let updated = sqlx::query(
            r#"
            UPDATE comments
            SET reply_count = $2, updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(comment_id.to_hex())
        .bind(reply_count)
        .bind(now_micros())
        .execute(&self.pool)
        .await?;
        if updated.rows_affected() == 0 {
            warn!(comment_id = %comment_id, "comment missing while recomputing reply count");
        } else {
            debug!(comment_id = %comment_id, reply_count, "reply count recomputed");
        }
        Ok(())
    }

    async fn recompute_reaction_counts(
        &self,
        target_id: ObjectId,
        target_type: TargetType,
    ) -> Result<(), StoreError> {
        let like_count = self
            .count_by_target_and_type(target_id, target_type, ReactionType::Like)
            .await?;
        let dislike_count = self
            .count_by_target_and_type(target_id, target_type, ReactionType::Dislike)
            .await?;
        let (table, collection) = match target_type {
            TargetType::Comment => ("comments", "comment"),
            TargetType::Reply => ("replies", "reply"),
        };
        let sql = format!("UPDATE {table} SET like_count = $2, dislike_count = $3 WHERE id = $1");
        let updated = sqlx::query(&sql)
            .bind(target_id.to_hex())
            .bind(like_count)
            .bind(dislike_count)
            .execute(&self.pool)
            .await?;
        if updated.rows_affected() == 0 {
            return Err(StoreError::not_found(collection, target_id));
        }
        debug!(%target_id, %target_type, like_count, dislike_count, "reaction counts recomputed");
        Ok(())
    }
}

pub(super) fn now_micros() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

pub(super) fn parse_id(row: &PgRow, column: &str) -> Result<ObjectId, StoreError> {
    let raw: String = row.try_get(column)?;
    Ok(ObjectId::try_from(raw)?)
}

fn map_comment(row: &PgRow) -> Result<Comment, StoreError> {
    let comment_type: String = row.try_get("comment_type")?;
    Ok(Comment {
        id: parse_id(row, "id")?,
        advertisement_id: row.try_get("advertisement_id")?,
        author_id: row.try_get("author_id")?,
        content: row.try_get("content")?,
        comment_type: comment_type.parse()?,
        media_url: row.try_get("media_url")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        like_count: row.try_get("like_count")?,
        dislike_count: row.try_get("dislike_count")?,
        reply_count: row.try_get("reply_count")?,
    })
}

fn map_reply(row: &PgRow) -> Result<Reply, StoreError> {
    let comment_type: String = row.try_get("comment_type")?;
    Ok(Reply {
        id: parse_id(row, "id")?,
        comment_id: parse_id(row, "comment_id")?,
        author_id: row.try_get("author_id")?,
        content: row.try_get("content")?,
        comment_type: comment_type.parse()?,
        media_url: row.try_get("media_url")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        like_count: row.try_get("like_count")?,
        dislike_count: row.try_get("dislike_count")?,
    })
}
