pub mod articles;
pub mod auth;
pub mod comments;
pub mod error;
pub mod middleware;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post},
};

use blog_db::{ArticlesGateway, CommentsGateway, Database, UsersGateway};

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub articles: ArticlesGateway,
    pub comments: CommentsGateway,
    pub users: UsersGateway,
    pub jwt_secret: String,
}

impl AppStateInner {
    pub fn new(db: Arc<Database>, jwt_secret: impl Into<String>) -> Self {
        Self {
            articles: ArticlesGateway::new(Arc::clone(&db)),
            comments: CommentsGateway::new(Arc::clone(&db)),
            users: UsersGateway::new(db),
            jwt_secret: jwt_secret.into(),
        }
    }
}

/// Public reads and comment posting, everything else behind a bearer token.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/articles", get(articles::list))
        .route("/articles/{id}", get(articles::show))
        .route("/articles/{id}/comments", post(comments::create))
        .route("/auth/login", post(auth::login));

    let protected_routes = Router::new()
        .route("/articles", post(articles::create))
        .route("/articles/{id}", axum::routing::put(articles::update).delete(articles::delete))
        .route("/comments/{id}", delete(comments::delete))
        .route("/auth/logout", post(auth::logout))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

/// Run blocking gateway work off the async runtime.
pub(crate) async fn blocking<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&AppStateInner) -> blog_db::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = Arc::clone(state);
    let result = tokio::task::spawn_blocking(move || f(&state)).await.map_err(|e| {
        tracing::error!("spawn_blocking join error: {}", e);
        ApiError::Internal
    })?;
    Ok(result?)
}
