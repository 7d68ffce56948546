use std::sync::Arc;

use tracing::warn;

use crate::Database;
use crate::articles::{ARTICLE_REF, ArticlesGateway};
use crate::error::{GatewayError, Result};
use crate::gateway::{Gateway, Table, insert_row};
use crate::value::{Row, Value};

pub const COMMENTS: Table = Table::new("Comments", "id");

#[derive(Clone)]
pub struct CommentsGateway {
    db: Arc<Database>,
}

impl CommentsGateway {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

fn missing_article(id: &Value) -> GatewayError {
    GatewayError::InvalidState(format!("Trying to reference non-existing article {}", id))
}

impl Gateway for CommentsGateway {
    fn db(&self) -> &Database {
        &self.db
    }

    fn table(&self) -> Table {
        COMMENTS
    }

    /// Inserts a comment, failing with `InvalidState` when its article does
    /// not exist.
    ///
    /// Without foreign-key enforcement the parent is checked up front;
    /// with it, the driver's foreign-key failure is reported the same way.
    fn insert(&self, data: Row) -> Result<i64> {
        let data = self.prepare(data)?;
        let article_id = data.get(ARTICLE_REF).cloned().unwrap_or(Value::Null);

        if article_id.is_null() {
            warn!("Rejected comment without an article");
            return Err(missing_article(&article_id));
        }

        if !self.db.foreign_keys_enabled()? {
            let articles = ArticlesGateway::new(Arc::clone(&self.db));
            if !articles.article_exists(article_id.clone())? {
                warn!("Rejected comment for missing article {}", article_id);
                return Err(missing_article(&article_id));
            }
        }

        self.db
            .with_conn(|conn| insert_row(conn, COMMENTS, &data))
            .map_err(|e| {
                if e.is_foreign_key_violation() {
                    warn!("Rejected comment for missing article {}", article_id);
                    missing_article(&article_id)
                } else {
                    e
                }
            })
    }
}
