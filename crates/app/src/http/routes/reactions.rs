use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::required;
use crate::http::error::ApiError;
use crate::state::AppState;
use adboard_core::domain::reactions::{Reaction, ReactionType};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddReactionBody {
    pub target_id: String,
    pub target_type: String,
    #[serde(alias = "worldId")]
    pub author_id: String,
    pub reaction_type: ReactionType,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserReactionParams {
    pub target_id: Option<String>,
    pub target_type: Option<String>,
    #[serde(alias = "worldId")]
    pub author_id: Option<String>,
}

pub async fn add_reaction(
    State(state): State<AppState>,
    payload: Result<Json<AddReactionBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Reaction>), ApiError> {
    let Json(body) = payload?;
    let reaction = state
        .comments
        .add_reaction(
            &body.target_id,
            &body.target_type,
            &body.author_id,
            body.reaction_type,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(reaction)))
}

pub async fn remove_reaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.comments.remove_reaction(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Responds with `null` when the author has not reacted.
pub async fn get_user_reaction(
    State(state): State<AppState>,
    params: Result<Query<UserReactionParams>, QueryRejection>,
) -> Result<Json<Option<Reaction>>, ApiError> {
    let Query(params) = params?;
    let target_id = required("targetId", params.target_id)?;
    let target_type = required("targetType", params.target_type)?;
    let author_id = required("authorId", params.author_id)?;
    let reaction = state
        .comments
        .get_user_reaction(&target_id, &target_type, &author_id)
        .await?;
    Ok(Json(reaction))
}
