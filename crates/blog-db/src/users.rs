use std::sync::Arc;

use md5::{Digest, Md5};
use serde::Serialize;
use tracing::{debug, warn};

use crate::Database;
use crate::error::{AuthError, Result};
use crate::gateway::{Gateway, Table};
use crate::value::{Row, Value};

pub const USERS: Table = Table::new("Users", "id");

pub const LOGIN: &str = "login";
pub const PASSWORD: &str = "password";

/// Stored form of a password: md5 hex digest of the byte-reversed
/// plaintext. Kept for compatibility with existing user tables.
pub fn hash_password(plain: &str) -> String {
    let mut reversed = plain.as_bytes().to_vec();
    reversed.reverse();
    hex::encode(Md5::digest(&reversed))
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// An authenticated user. `data` is the user row without its password.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identity {
    pub name: String,
    pub data: Row,
}

impl Identity {
    pub fn id(&self) -> Option<i64> {
        self.data.get_i64(USERS.primary)
    }
}

pub trait Authenticator: Send + Sync {
    fn authenticate(&self, credentials: &Credentials) -> Result<Identity>;
}

#[derive(Clone)]
pub struct UsersGateway {
    db: Arc<Database>,
}

impl UsersGateway {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

impl Gateway for UsersGateway {
    fn db(&self) -> &Database {
        &self.db
    }

    fn table(&self) -> Table {
        USERS
    }

    /// Lowercases the login and hashes the password.
    fn prepare(&self, mut data: Row) -> Result<Row> {
        if let Some(Value::Text(login)) = data.get_mut(LOGIN) {
            *login = login.to_ascii_lowercase();
        }
        if let Some(Value::Text(password)) = data.get_mut(PASSWORD) {
            *password = hash_password(password);
        }
        Ok(data)
    }
}

impl Authenticator for UsersGateway {
    fn authenticate(&self, credentials: &Credentials) -> Result<Identity> {
        let prepared = self.prepare(
            Row::new()
                .with(LOGIN, credentials.username.as_str())
                .with(PASSWORD, credentials.password.as_str()),
        )?;
        let login = prepared.get_str(LOGIN).unwrap_or_default();
        let password = prepared.get_str(PASSWORD).unwrap_or_default();

        let Some(mut user) = self.fetch_where(LOGIN, login)? else {
            warn!("Login failed: unknown user '{}'", login);
            return Err(AuthError::not_found(login).into());
        };

        if user.get_str(PASSWORD) != Some(password) {
            warn!("Login failed: bad password for '{}'", login);
            return Err(AuthError::invalid_credential().into());
        }

        user.remove(PASSWORD);
        let name = user.get_str("username").unwrap_or(login).to_string();
        debug!("User '{}' authenticated", login);
        Ok(Identity { name, data: user })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_reverses_before_digest() {
        // md5("omed")
        assert_eq!(hash_password("demo"), hex::encode(Md5::digest(b"omed")));
        assert_eq!(hash_password("demo").len(), 32);
        assert_ne!(hash_password("demo"), hash_password("omed"));
    }

    #[test]
    fn prepare_normalizes_login_and_password() {
        let users = UsersGateway::new(Arc::new(Database::open_in_memory().unwrap()));
        let row = users
            .prepare(Row::new().with(LOGIN, "User1").with(PASSWORD, "demo").with("username", "User One"))
            .unwrap();

        assert_eq!(row.get_str(LOGIN), Some("user1"));
        assert_eq!(row.get_str(PASSWORD), Some(hash_password("demo").as_str()));
        assert_eq!(row.get_str("username"), Some("User One"));
    }
}
