use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::Row;

use super::comments_repo::{now_micros, parse_id, PgStore};
use super::store::{ReactionLedger, StoreError};
use adboard_core::domain::reactions::{NewReaction, Reaction, ReactionType, TargetType};
use adboard_core::types::ObjectId;

const REACTION_COLUMNS: &str = "id, target_id, target_type, author_id, reaction_type, created_at";

#[async_trait]
impl ReactionLedger for PgStore {
    async fn find_by_user_and_target(
        &self,
        author_id: &str,
        target_id: ObjectId,
        target_type: TargetType,
    ) -> Result<Option<Reaction>, StoreError> {
        let sql = format!(
            "SELECT {REACTION_COLUMNS} FROM reactions \
             WHERE author_id = $1 AND target_id = $2 AND target_type = $3 \
             ORDER BY created_at ASC, id ASC \
             LIMIT 1"
        );
        let row = sqlx::query(&sql)
            .bind(author_id)
            .bind(target_id.to_hex())
            .bind(target_type.as_str())
            .fetch_optional(self.pool())
            .await?;
        row.as_ref().map(map_reaction).transpose()
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Reaction>, StoreError> {
        let sql = format!("SELECT {REACTION_COLUMNS} FROM reactions WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.to_hex())
            .fetch_optional(self.pool())
            .await?;
        row.as_ref().map(map_reaction).transpose()
    }

    async fn create(&self, reaction: NewReaction) -> Result<Reaction, StoreError> {
        let reaction = Reaction {
            id: self.ids.next_id(),
            target_id: reaction.target_id,
            target_type: reaction.target_type,
            author_id: reaction.author_id,
            reaction_type: reaction.reaction_type,
            created_at: now_micros(),
        };
        sqlx::query(
            r#"
            INSERT INTO reactions (
                id,
                target_id,
                target_type,
                author_id,
                reaction_type,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(reaction.id.to_hex())
        .bind(reaction.target_id.to_hex())
        .bind(reaction.target_type.as_str())
        .bind(&reaction.author_id)
        .bind(reaction.reaction_type.as_str())
        .bind(reaction.created_at)
        .execute(self.pool())
        .await?;
        Ok(reaction)
    }

    async fn update_type(
        &self,
        id: ObjectId,
        reaction_type: ReactionType,
    ) -> Result<Reaction, StoreError> {
        let sql = format!(
            "UPDATE reactions SET reaction_type = $2 WHERE id = $1 RETURNING {REACTION_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(id.to_hex())
            .bind(reaction_type.as_str())
            .fetch_optional(self.pool())
            .await?;
        match row {
            Some(row) => map_reaction(&row),
            None => Err(StoreError::not_found("reaction", id)),
        }
    }

    async fn delete(&self, id: ObjectId) -> Result<(), StoreError> {
        let deleted = sqlx::query("DELETE FROM reactions WHERE id = $1")
            .bind(id.to_hex())
            .execute(self.pool())
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(StoreError::not_found("reaction", id));
        }
        Ok(())
    }

    async fn count_by_target_and_type(
        &self,
        target_id: ObjectId,
        target_type: TargetType,
        reaction_type: ReactionType,
    ) -> Result<i64, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS count
            FROM reactions
            WHERE target_id = $1 AND target_type = $2 AND reaction_type = $3
            "#,
        )
        .bind(target_id.to_hex())
        .bind(target_type.as_str())
        .bind(reaction_type.as_str())
        .fetch_one(self.pool())
        .await?;
        Ok(row.try_get("count")?)
    }
}

fn map_reaction(row: &PgRow) -> Result<Reaction, StoreError> {
    let target_type: String = row.try_get("target_type")?;
    let reaction_type: String = row.try_get("reaction_type")?;
    Ok(Reaction {
        id: parse_id(row, "id")?,
        target_id: parse_id(row, "target_id")?,
        target_type: target_type.parse()?,
        author_id: row.try_get("author_id")?,
        reaction_type: reaction_type.parse()?,
        created_at: row.try_get("created_at")?,
    })
}
