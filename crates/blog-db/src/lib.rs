pub mod articles;
pub mod comments;
pub mod error;
pub mod gateway;
pub mod lookup;
pub mod migrations;
pub mod query;
pub mod users;
pub mod value;

pub use articles::ArticlesGateway;
pub use comments::CommentsGateway;
pub use error::{AuthError, AuthFailure, GatewayError, Result};
pub use gateway::{Gateway, Table, TableGateway};
pub use lookup::{Found, Lookup};
pub use query::{Filter, Keys, Query, ResultSet};
pub use users::{Authenticator, Credentials, Identity, UsersGateway};
pub use value::{Row, Value};

use rusqlite::{Connection, Transaction};
use std::path::Path;
use std::sync::Mutex;
use tracing::{info, warn};

/// Storage handle shared by every gateway.
///
/// Holds the single SQLite connection between `open` and `disconnect`.
/// Gateways receive it at construction instead of reaching for a global.
pub struct Database {
    conn: Mutex<Option<Connection>>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run(&conn)?;

        info!("In-memory database opened");
        Ok(Self::from_connection(conn))
    }

    /// Wraps an already configured connection without running migrations.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(Some(conn)),
        }
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let guard = self.conn.lock().map_err(|_| GatewayError::Poisoned)?;
        let conn = guard.as_ref().ok_or(GatewayError::Disconnected)?;
        f(conn)
    }

    /// Runs `f` inside a transaction.
    ///
    /// Commits when `f` returns `Ok`. On `Err` the transaction is rolled back
    /// and the original error is returned unchanged.
    pub fn transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let mut guard = self.conn.lock().map_err(|_| GatewayError::Poisoned)?;
        let conn = guard.as_mut().ok_or(GatewayError::Disconnected)?;
        let tx = conn.transaction()?;

        match f(&tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(e) => {
                warn!("Rolling back transaction: {}", e);
                if let Err(rollback) = tx.rollback() {
                    warn!("Rollback failed: {}", rollback);
                }
                Err(e)
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        self.conn.lock().map(|guard| guard.is_some()).unwrap_or(false)
    }

    /// Closes the connection. Every later call fails with `Disconnected`.
    pub fn disconnect(&self) -> Result<()> {
        let mut guard = self.conn.lock().map_err(|_| GatewayError::Poisoned)?;
        if let Some(conn) = guard.take() {
            conn.close().map_err(|(_, e)| GatewayError::from(e))?;
            info!("Database disconnected");
        }
        Ok(())
    }

    pub fn foreign_keys_enabled(&self) -> Result<bool> {
        self.with_conn(|conn| {
            let on: i64 = conn.pragma_query_value(None, "foreign_keys", |row| row.get(0))?;
            Ok(on != 0)
        })
    }

    /// Toggles referential enforcement for this connection.
    pub fn set_foreign_keys(&self, enabled: bool) -> Result<()> {
        self.with_conn(|conn| {
            conn.pragma_update(None, "foreign_keys", enabled)?;
            Ok(())
        })
    }
}
