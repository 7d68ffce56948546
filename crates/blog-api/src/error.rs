use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use blog_db::GatewayError;
use blog_types::api::ErrorResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Invalid login or password.")]
    Unauthorized,

    #[error("internal server error")]
    Internal,

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Gateway(e) => match e {
                GatewayError::Authentication(_) => StatusCode::UNAUTHORIZED,
                GatewayError::Constraint(_) => StatusCode::CONFLICT,
                GatewayError::InvalidArgument(_) | GatewayError::NoSuchMethod(_) => {
                    StatusCode::BAD_REQUEST
                }
                GatewayError::InvalidState(_) => StatusCode::UNPROCESSABLE_ENTITY,
                GatewayError::Storage(_) | GatewayError::Disconnected | GatewayError::Poisoned => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Both login failure kinds answer with the same message.
        let message = match &self {
            ApiError::Gateway(GatewayError::Authentication(_)) => ApiError::Unauthorized.to_string(),
            _ if status.is_server_error() => {
                error!("Request failed: {}", self);
                "internal server error".to_string()
            }
            _ => self.to_string(),
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
