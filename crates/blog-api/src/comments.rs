use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use blog_db::{Gateway, Row};
use blog_types::api::{AffectedResponse, CommentRequest, CreatedResponse};

use crate::error::ApiError;
use crate::{AppState, blocking};

pub async fn create(
    State(state): State<AppState>,
    Path(article_id): Path<i64>,
    Json(req): Json<CommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(field) = req.missing_field() {
        return Err(ApiError::BadRequest(format!("Please provide {field}.")));
    }

    let row = Row::new()
        .with("articleId", article_id)
        .with("author", req.author)
        .with("text", req.text)
        .with("createdAt", chrono::Utc::now().naive_utc());
    let id = blocking(&state, move |s| s.comments.insert(row)).await?;

    info!("Comment {} added to article {}", id, article_id);
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<AffectedResponse>, ApiError> {
    let affected = blocking(&state, move |s| s.comments.delete(id)).await?;
    if affected == 0 {
        return Err(ApiError::NotFound("Comment"));
    }
    Ok(Json(AffectedResponse { affected }))
}
