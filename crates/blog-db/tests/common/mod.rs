#![allow(dead_code)]

use std::sync::Arc;

use blog_db::{Database, Row, Table, TableGateway};

pub const MOCK: Table = Table::new("Mock", "id");

pub fn database() -> Arc<Database> {
    Arc::new(Database::open_in_memory().expect("in-memory database"))
}

pub fn exec(db: &Database, sql: &str) {
    db.with_conn(|conn| {
        conn.execute_batch(sql)?;
        Ok(())
    })
    .expect("fixture sql");
}

/// Generic table with a boolean and a checked integer column.
pub fn mock_gateway() -> TableGateway {
    let db = database();
    exec(
        &db,
        "
        CREATE TABLE Mock (
            id          INTEGER NOT NULL PRIMARY KEY CHECK (id > 0),
            title       VARCHAR(128) NOT NULL,
            author      VARCHAR(48) NOT NULL,
            isSingle    BOOLEAN NOT NULL DEFAULT 1,
            salary      INTEGER NOT NULL CHECK (salary > 0),
            createdAt   TIMESTAMP NULL DEFAULT CURRENT_TIMESTAMP
        );

        INSERT INTO Mock (id, title, author, isSingle, salary) VALUES (1, 'first', 'John Doe', 0, 1111);
        INSERT INTO Mock (id, title, author, isSingle, salary) VALUES (2, 'second', 'Jane Doe', 1, 1212);
        INSERT INTO Mock (id, title, author, isSingle, salary) VALUES (3, 'third', 'Jack Doe', 1, 1313);
        INSERT INTO Mock (id, title, author, isSingle, salary) VALUES (4, 'fourth', 'Jimmy Doe', 0, 1414);
        ",
    );
    TableGateway::new(db, MOCK)
}

pub fn mock_values() -> Row {
    Row::new()
        .with("id", 5)
        .with("title", "fifth")
        .with("author", "Joel Doe")
        .with("isSingle", true)
        .with("salary", 1515)
}

/// Four articles; articles 1 and 2 have two comments each, article 3 one,
/// article 4 none.
pub fn blog_database() -> Arc<Database> {
    let db = database();
    exec(
        &db,
        "
        INSERT INTO Articles VALUES (1, 'John Doe', 'First blog post', 'Lorem ipsum...', '2010-01-01 10:00:00');
        INSERT INTO Articles VALUES (2, 'Jane Doe', 'Second blog post', 'Sir dolor amet...', '2010-01-02 10:00:00');
        INSERT INTO Articles VALUES (3, 'Jack Doe', 'Third blog post', 'Sir dolor amet...', '2010-01-03 10:00:00');
        INSERT INTO Articles VALUES (4, 'Jimmy Doe', 'Fourth blog post', 'Sir dolor amet...', '2010-01-04 10:00:00');

        INSERT INTO Comments VALUES (1, 1, 'John Doe', 'Lorem ipsum...', '2010-01-05 12:00:00');
        INSERT INTO Comments VALUES (2, 1, 'Jane Doe', 'Lorem ipsum...', '2010-01-05 11:00:00');
        INSERT INTO Comments VALUES (3, 2, 'Jack Doe', 'Lorem ipsum...', '2010-01-05 12:00:00');
        INSERT INTO Comments VALUES (4, 2, 'Jimmy Doe', 'Lorem ipsum...', '2010-01-05 13:00:00');
        INSERT INTO Comments VALUES (5, 3, 'Jane Doe', 'Lorem ipsum...', '2010-01-05 14:00:00');
        ",
    );
    db
}
