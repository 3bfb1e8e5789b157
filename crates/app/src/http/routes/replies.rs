use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::comments::UpdateBody;
use super::upload::MediaForm;
use super::PageParams;
use crate::comment_service::Draft;
use crate::http::error::ApiError;
use crate::state::AppState;
use adboard_core::domain::comments::{CommentType, Reply, ReplyPage};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReplyBody {
    pub comment_id: String,
    #[serde(alias = "worldId")]
    pub author_id: String,
    pub content: String,
    pub comment_type: CommentType,
    #[serde(default)]
    pub media_url: Option<String>,
}

pub async fn create_reply(
    State(state): State<AppState>,
    payload: Result<Json<CreateReplyBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Reply>), ApiError> {
    let Json(body) = payload?;
    let draft = Draft {
        author_id: body.author_id,
        content: body.content,
        comment_type: body.comment_type,
        media_url: body.media_url,
    };
    let reply = state.comments.create_reply(&body.comment_id, draft).await?;
    Ok((StatusCode::CREATED, Json(reply)))
}

pub async fn create_reply_with_media(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Reply>), ApiError> {
    let mut form = MediaForm::read(multipart).await?;
    let comment_id = form.take_text("commentId")?;
    let (draft, media) = form.into_draft()?;
    let reply = state
        .comments
        .create_reply_with_media(&comment_id, draft, media)
        .await?;
    Ok((StatusCode::CREATED, Json(reply)))
}

pub async fn get_reply(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Reply>, ApiError> {
    Ok(Json(state.comments.get_reply_by_id(&id).await?))
}

pub async fn list_by_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> Result<Json<ReplyPage>, ApiError> {
    let Query(params) = params?;
    let pagination = params.pagination(state.config.max_page_limit)?;
    let page = state
        .comments
        .get_replies_by_comment(&comment_id, pagination)
        .await?;
    Ok(Json(page))
}

pub async fn update_reply(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateBody>, JsonRejection>,
) -> Result<Json<Reply>, ApiError> {
    let Json(body) = payload?;
    let reply = state
        .comments
        .update_reply(&id, body.content, body.comment_type, body.media_url)
        .await?;
    Ok(Json(reply))
}

pub async fn delete_reply(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.comments.delete_reply(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
