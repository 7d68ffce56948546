use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::{error, info};

use blog_db::{Authenticator, Credentials};
use blog_types::api::{Claims, LoginRequest, LoginResponse};

use crate::error::ApiError;
use crate::{AppState, blocking};

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.login.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::BadRequest("Please provide login and password.".into()));
    }

    let credentials = Credentials::new(req.login, req.password);
    let identity = blocking(&state, move |s| s.users.authenticate(&credentials)).await?;

    let user_id = identity.id().ok_or(ApiError::Internal)?;
    let token = create_token(&state.jwt_secret, user_id, &identity.name).map_err(|e| {
        error!("Token signing failed: {}", e);
        ApiError::Internal
    })?;

    info!("User {} logged in", user_id);
    Ok(Json(LoginResponse {
        user_id,
        username: identity.name,
        token,
    }))
}

/// Tokens are stateless, so logging out only acknowledges the caller.
pub async fn logout(Extension(claims): Extension<Claims>) -> StatusCode {
    info!("User {} logged out", claims.sub);
    StatusCode::NO_CONTENT
}

pub fn create_token(secret: &str, user_id: i64, username: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
