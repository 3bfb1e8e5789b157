use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::upload::MediaForm;
use super::PageParams;
use crate::comment_service::{Draft, Target};
use crate::http::error::ApiError;
use crate::state::AppState;
use adboard_core::domain::comments::{Comment, CommentPage, CommentType};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentBody {
    pub advertisement_id: String,
    #[serde(alias = "worldId")]
    pub author_id: String,
    pub content: String,
    pub comment_type: CommentType,
    #[serde(default)]
    pub media_url: Option<String>,
}

/// Replaces the body of a comment or reply. An absent `mediaUrl` clears it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBody {
    pub content: String,
    pub comment_type: CommentType,
    #[serde(default)]
    pub media_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileBody {
    pub target_type: String,
    pub target_id: String,
}

pub async fn create_comment(
    State(state): State<AppState>,
    payload: Result<Json<CreateCommentBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let Json(body) = payload?;
    let draft = Draft {
        author_id: body.author_id,
        content: body.content,
        comment_type: body.comment_type,
        media_url: body.media_url,
    };
    let comment = state
        .comments
        .create_comment(&body.advertisement_id, draft)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn create_comment_with_media(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let mut form = MediaForm::read(multipart).await?;
    let advertisement_id = form.take_text("advertisementId")?;
    let (draft, media) = form.into_draft()?;
    let comment = state
        .comments
        .create_comment_with_media(&advertisement_id, draft, media)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn get_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Comment>, ApiError> {
    Ok(Json(state.comments.get_comment_by_id(&id).await?))
}

pub async fn list_by_advertisement(
    State(state): State<AppState>,
    Path(advertisement_id): Path<String>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> Result<Json<CommentPage>, ApiError> {
    let Query(params) = params?;
    let pagination = params.pagination(state.config.max_page_limit)?;
    let page = state
        .comments
        .get_comments_by_advertisement(&advertisement_id, pagination)
        .await?;
    Ok(Json(page))
}

pub async fn update_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateBody>, JsonRejection>,
) -> Result<Json<Comment>, ApiError> {
    let Json(body) = payload?;
    let comment = state
        .comments
        .update_comment(&id, body.content, body.comment_type, body.media_url)
        .await?;
    Ok(Json(comment))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.comments.delete_comment(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn reconcile(
    State(state): State<AppState>,
    payload: Result<Json<ReconcileBody>, JsonRejection>,
) -> Result<Json<Target>, ApiError> {
    let Json(body) = payload?;
    let target = state
        .comments
        .reconcile_counters(&body.target_type, &body.target_id)
        .await?;
    Ok(Json(target))
}
