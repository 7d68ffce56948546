use rusqlite::Connection;
use tracing::info;

use crate::error::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS Articles (
            id          INTEGER NOT NULL PRIMARY KEY CHECK (id > 0),
            author      VARCHAR(64) NOT NULL,
            title       VARCHAR(128) NOT NULL,
            text        TEXT NOT NULL,
            createdAt   TIMESTAMP NULL DEFAULT CURRENT_TIMESTAMP
        );

        CREATE TABLE IF NOT EXISTS Comments (
            id          INTEGER NOT NULL PRIMARY KEY CHECK (id > 0),
            articleId   INTEGER NOT NULL REFERENCES Articles(id) ON DELETE CASCADE,
            author      VARCHAR(64) NOT NULL,
            text        TEXT NOT NULL,
            createdAt   TIMESTAMP NULL DEFAULT CURRENT_TIMESTAMP
        );

        CREATE INDEX IF NOT EXISTS idx_comments_article
            ON Comments(articleId, createdAt);

        CREATE TABLE IF NOT EXISTS Users (
            id          INTEGER NOT NULL PRIMARY KEY CHECK (id > 0),
            login       VARCHAR(64) NOT NULL UNIQUE,
            password    CHAR(32) NOT NULL,
            username    VARCHAR(64) NOT NULL
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
