use serde::{Deserialize, Serialize};

// -- JWT Claims --

/// Bearer token claims issued on login and checked by the auth middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: i64,
    pub username: String,
    pub token: String,
}

// -- Articles --

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArticleRequest {
    pub title: String,
    pub author: String,
    pub text: String,
}

impl ArticleRequest {
    /// Name of the first required field left blank.
    pub fn missing_field(&self) -> Option<&'static str> {
        [("title", &self.title), ("author", &self.author), ("text", &self.text)]
            .into_iter()
            .find(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name)
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub struct AffectedResponse {
    pub affected: usize,
}

// -- Comments --

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommentRequest {
    pub author: String,
    pub text: String,
}

impl CommentRequest {
    pub fn missing_field(&self) -> Option<&'static str> {
        [("author", &self.author), ("text", &self.text)]
            .into_iter()
            .find(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name)
    }
}

// -- Errors --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
