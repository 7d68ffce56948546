use rusqlite::ErrorCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GatewayError>;

/// Why an authentication attempt was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    NotFound,
    InvalidCredential,
}

#[derive(Debug, Error)]
#[error("{message}")]
pub struct AuthError {
    pub kind: AuthFailure,
    pub message: String,
}

impl AuthError {
    pub fn not_found(login: &str) -> Self {
        Self {
            kind: AuthFailure::NotFound,
            message: format!("User '{}' not found.", login),
        }
    }

    pub fn invalid_credential() -> Self {
        Self {
            kind: AuthFailure::InvalidCredential,
            message: "Invalid password.".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Uniqueness, check or foreign-key violation reported by SQLite.
    #[error("constraint violation: {0}")]
    Constraint(#[source] rusqlite::Error),

    #[error("storage error: {0}")]
    Storage(#[source] rusqlite::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error(transparent)]
    Authentication(#[from] AuthError),

    #[error("no such method: {0}")]
    NoSuchMethod(String),

    #[error("database connection is closed")]
    Disconnected,

    #[error("database lock poisoned")]
    Poisoned,
}

impl GatewayError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn is_constraint(&self) -> bool {
        matches!(self, Self::Constraint(_))
    }

    /// True for a violated `REFERENCES` clause.
    pub fn is_foreign_key_violation(&self) -> bool {
        match self {
            Self::Constraint(rusqlite::Error::SqliteFailure(e, _)) => {
                e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
            }
            _ => false,
        }
    }

    pub fn auth_failure(&self) -> Option<AuthFailure> {
        match self {
            Self::Authentication(e) => Some(e.kind),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for GatewayError {
    fn from(e: rusqlite::Error) -> Self {
        match e.sqlite_error_code() {
            Some(ErrorCode::ConstraintViolation) => Self::Constraint(e),
            _ => Self::Storage(e),
        }
    }
}
