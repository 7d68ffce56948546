use std::sync::Arc;

use tracing::info;

use crate::Database;
use crate::comments::COMMENTS;
use crate::error::Result;
use crate::gateway::{Gateway, Table, delete_rows};
use crate::query::{Keys, Query};
use crate::value::{Row, Value};

pub const ARTICLES: Table = Table::new("Articles", "id");

/// Foreign key column in `Comments` pointing at an article.
pub const ARTICLE_REF: &str = "articleId";

#[derive(Clone)]
pub struct ArticlesGateway {
    db: Arc<Database>,
}

impl ArticlesGateway {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn article_exists(&self, id: impl Into<Value>) -> Result<bool> {
        Ok(self.find(id).count()? == 1)
    }

    pub fn has_comments(&self, id: impl Into<Value>) -> Result<bool> {
        Ok(self.find_all_comments(id).count()? > 0)
    }

    pub fn find_all_comments(&self, id: impl Into<Value>) -> Query<'_> {
        Query::select(&self.db, COMMENTS.name).where_eq(ARTICLE_REF, id)
    }

    /// Comments of an article, oldest first.
    pub fn fetch_all_comments(&self, id: impl Into<Value>) -> Result<Vec<Row>> {
        let result = self.find_all_comments(id).order_by("createdAt").execute()?;
        Ok(self.complete(result).fetch_all())
    }

    pub fn delete_all_comments(&self, id: impl Into<Value>) -> Result<usize> {
        let id = id.into();
        self.db
            .with_conn(|conn| delete_rows(conn, COMMENTS.name, ARTICLE_REF, std::slice::from_ref(&id)))
    }
}

impl Gateway for ArticlesGateway {
    fn db(&self) -> &Database {
        &self.db
    }

    fn table(&self) -> Table {
        ARTICLES
    }

    /// Deletes the articles and all their comments in one transaction.
    fn delete(&self, ids: impl Into<Keys>) -> Result<usize> {
        let ids = ids.into();
        if ids.is_empty() {
            return Ok(0);
        }

        let affected = self.db.transaction(|tx| {
            let affected = delete_rows(tx, ARTICLES.name, ARTICLES.primary, ids.as_slice())?;
            for id in ids.iter() {
                delete_rows(tx, COMMENTS.name, ARTICLE_REF, std::slice::from_ref(id))?;
            }
            Ok(affected)
        })?;

        info!("Deleted {} article(s) with their comments", affected);
        Ok(affected)
    }
}
