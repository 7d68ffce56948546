use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use tracing::info;

use blog_db::{Gateway, Row};
use blog_types::api::{AffectedResponse, ArticleRequest, CreatedResponse};

use crate::error::ApiError;
use crate::{AppState, blocking};

/// An article together with its comments, oldest first.
#[derive(Debug, Serialize)]
pub struct ArticleView {
    #[serde(flatten)]
    pub article: Row,
    pub comments: Vec<Row>,
}

fn article_row(req: ArticleRequest) -> Result<Row, ApiError> {
    if let Some(field) = req.missing_field() {
        return Err(ApiError::BadRequest(format!("Please provide {field}.")));
    }
    Ok(Row::new()
        .with("title", req.title)
        .with("author", req.author)
        .with("text", req.text))
}

/// Newest articles first.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Row>>, ApiError> {
    let rows = blocking(&state, |s| {
        let result = s.articles.find_all().order_by_desc("createdAt").execute()?;
        Ok(s.articles.complete(result).fetch_all())
    })
    .await?;
    Ok(Json(rows))
}

pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ArticleView>, ApiError> {
    let view = blocking(&state, move |s| {
        let Some(article) = s.articles.fetch(id)? else {
            return Ok(None);
        };
        let comments = s.articles.fetch_all_comments(id)?;
        Ok(Some(ArticleView { article, comments }))
    })
    .await?;

    view.map(Json).ok_or(ApiError::NotFound("Article"))
}

pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<ArticleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let row = article_row(req)?.with("createdAt", chrono::Utc::now().naive_utc());
    let id = blocking(&state, move |s| s.articles.insert(row)).await?;

    info!("Article {} created", id);
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<ArticleRequest>,
) -> Result<Json<AffectedResponse>, ApiError> {
    let row = article_row(req)?;
    let affected = blocking(&state, move |s| s.articles.update(id, row)).await?;
    if affected == 0 {
        return Err(ApiError::NotFound("Article"));
    }
    Ok(Json(AffectedResponse { affected }))
}

/// Removes the article and its comments.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<AffectedResponse>, ApiError> {
    let affected = blocking(&state, move |s| s.articles.delete(id)).await?;
    if affected == 0 {
        return Err(ApiError::NotFound("Article"));
    }
    Ok(Json(AffectedResponse { affected }))
}
