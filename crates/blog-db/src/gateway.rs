//! Table data gateway shared by every table.
//!
//! A gateway knows one table and its primary key. The trait's provided
//! methods implement the whole CRUD surface; domain gateways override the
//! `prepare`/`complete` hooks or individual writes where they need more.

use std::collections::BTreeMap;
use std::sync::Arc;

use rusqlite::{Connection, params_from_iter};
use tracing::debug;

use crate::Database;
use crate::error::{GatewayError, Result};
use crate::lookup::{Found, Lookup};
use crate::query::{Filter, Keys, Query, ResultSet, placeholders, quote_ident};
use crate::value::{Row, Value};

/// Table name and primary key column of a gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Table {
    pub name: &'static str,
    pub primary: &'static str,
}

impl Table {
    pub const fn new(name: &'static str, primary: &'static str) -> Self {
        Self { name, primary }
    }
}

pub trait Gateway {
    fn db(&self) -> &Database;

    fn table(&self) -> Table;

    /// Normalizes data before it is written. Identity by default.
    fn prepare(&self, data: Row) -> Result<Row> {
        Ok(data)
    }

    /// Post-processes every result read through the gateway.
    fn complete(&self, result: ResultSet) -> ResultSet {
        result.detect_types()
    }

    fn find_all(&self) -> Query<'_> {
        Query::select(self.db(), self.table().name)
    }

    /// Rows whose primary key equals `value`.
    fn find(&self, value: impl Into<Value>) -> Query<'_> {
        self.find_where(self.table().primary, value)
    }

    fn find_where(&self, column: &str, value: impl Into<Value>) -> Query<'_> {
        self.find_all().where_eq(column, value)
    }

    fn fetch(&self, value: impl Into<Value>) -> Result<Option<Row>> {
        self.fetch_where(self.table().primary, value)
    }

    fn fetch_where(&self, column: &str, value: impl Into<Value>) -> Result<Option<Row>> {
        let result = self.find_where(column, value).limit(1).execute()?;
        Ok(self.complete(result).fetch())
    }

    fn fetch_all(&self) -> Result<Vec<Row>> {
        let result = self.find_all().execute()?;
        Ok(self.complete(result).fetch_all())
    }

    /// Inserts a row and returns its primary key: the supplied one, or the
    /// one SQLite generated.
    fn insert(&self, data: Row) -> Result<i64> {
        let data = self.prepare(data)?;
        let table = self.table();
        self.db().with_conn(|conn| insert_row(conn, table, &data))
    }

    fn update(&self, ids: impl Into<Keys>, data: Row) -> Result<usize> {
        let ids = ids.into();
        let data = self.prepare(data)?;
        let table = self.table();
        self.db().with_conn(|conn| update_rows(conn, table, &ids, &data))
    }

    fn delete(&self, ids: impl Into<Keys>) -> Result<usize> {
        let ids = ids.into();
        let table = self.table();
        self.db().with_conn(|conn| delete_rows(conn, table.name, table.primary, ids.as_slice()))
    }

    /// Deletes every row of the table.
    fn flush_table(&self) -> Result<usize> {
        let sql = format!("DELETE FROM {}", quote_ident(self.table().name));
        self.db().with_conn(|conn| {
            debug!(sql = %sql, "flush");
            Ok(conn.execute(&sql, [])?)
        })
    }

    /// First row matching every condition of `filter`.
    fn fetch_by(&self, filter: Filter) -> Result<Option<Row>> {
        let result = self.find_all_by(filter).execute()?;
        Ok(self.complete(result).fetch())
    }

    fn fetch_all_by(&self, filter: Filter) -> Result<Vec<Row>> {
        let result = self.find_all_by(filter).execute()?;
        Ok(self.complete(result).fetch_all())
    }

    fn find_all_by(&self, filter: Filter) -> Query<'_> {
        self.find_all().filter(filter)
    }

    /// `key -> value` over all rows of the table.
    fn fetch_pairs(&self, key: &str, value: &str) -> Result<BTreeMap<Value, Value>> {
        let result = self.find_all().execute()?;
        self.complete(result).fetch_pairs(key, value)
    }

    /// Runs a lookup named by convention, e.g. `fetchAllByAuthorAndIsSingle`.
    ///
    /// Prefer the typed `fetch_by` family; this exists for callers that only
    /// have the method name at hand.
    fn call(&self, method: &str, args: Vec<Value>) -> Result<Found<'_>> {
        let lookup: Lookup = method.parse()?;
        match lookup {
            Lookup::FetchBy(fields) => self.fetch_by(Filter::zip(fields, args)?).map(Found::Row),
            Lookup::FetchAllBy(fields) => self.fetch_all_by(Filter::zip(fields, args)?).map(Found::Rows),
            Lookup::FindAllBy(fields) => Ok(Found::Query(self.find_all_by(Filter::zip(fields, args)?))),
            Lookup::FetchPairsBy(fields) => match fields.as_slice() {
                [key, value] => self.fetch_pairs(key, value).map(Found::Pairs),
                _ => Err(GatewayError::invalid_argument(format!(
                    "pairs lookup expects exactly 2 fields, but {} given",
                    fields.len()
                ))),
            },
        }
    }

    /// Column names in declaration order.
    fn column_names(&self) -> Result<Vec<String>> {
        let name = self.table().name;
        self.db().with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1) ORDER BY cid")?;
            let names = stmt
                .query_map([name], |row| row.get(0))?
                .collect::<std::result::Result<Vec<String>, _>>()?;
            Ok(names)
        })
    }
}

/// Gateway over any table with no table-specific behavior.
#[derive(Clone)]
pub struct TableGateway {
    db: Arc<Database>,
    table: Table,
}

impl TableGateway {
    pub fn new(db: Arc<Database>, table: Table) -> Self {
        Self { db, table }
    }
}

impl Gateway for TableGateway {
    fn db(&self) -> &Database {
        &self.db
    }

    fn table(&self) -> Table {
        self.table
    }
}

// -- Statement helpers, usable inside a transaction --

pub(crate) fn insert_row(conn: &Connection, table: Table, data: &Row) -> Result<i64> {
    let sql = if data.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES", quote_ident(table.name))
    } else {
        let columns = data.columns().map(quote_ident).collect::<Vec<_>>().join(", ");
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(table.name),
            columns,
            placeholders(1, data.len())
        )
    };

    debug!(sql = %sql, "insert");
    conn.execute(&sql, params_from_iter(data.iter().map(|(_, v)| v)))?;

    match data.get(table.primary).and_then(Value::as_i64) {
        Some(id) => Ok(id),
        None => Ok(conn.last_insert_rowid()),
    }
}

pub(crate) fn update_rows(conn: &Connection, table: Table, ids: &Keys, data: &Row) -> Result<usize> {
    if data.is_empty() {
        return Err(GatewayError::invalid_argument("update requires at least one column"));
    }
    if ids.is_empty() {
        return Ok(0);
    }

    let assignments = data
        .columns()
        .enumerate()
        .map(|(i, column)| format!("{} = ?{}", quote_ident(column), i + 1))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "UPDATE {} SET {} WHERE {} IN ({})",
        quote_ident(table.name),
        assignments,
        quote_ident(table.primary),
        placeholders(data.len() + 1, ids.len())
    );

    debug!(sql = %sql, "update");
    let params = data.iter().map(|(_, v)| v).chain(ids.iter());
    Ok(conn.execute(&sql, params_from_iter(params))?)
}

pub(crate) fn delete_rows(conn: &Connection, table: &str, column: &str, values: &[Value]) -> Result<usize> {
    if values.is_empty() {
        return Ok(0);
    }

    let sql = format!(
        "DELETE FROM {} WHERE {} IN ({})",
        quote_ident(table),
        quote_ident(column),
        placeholders(1, values.len())
    );

    debug!(sql = %sql, "delete");
    Ok(conn.execute(&sql, params_from_iter(values))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock() -> TableGateway {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            conn.execute_batch(
                "CREATE TABLE Mock (
                    id INTEGER NOT NULL PRIMARY KEY CHECK (id > 0),
                    title VARCHAR(128) NOT NULL
                );",
            )?;
            Ok(())
        })
        .unwrap();
        TableGateway::new(Arc::new(db), Table::new("Mock", "id"))
    }

    #[test]
    fn insert_returns_generated_key() {
        let gw = mock();
        let first = gw.insert(Row::new().with("title", "a")).unwrap();
        let second = gw.insert(Row::new().with("title", "b")).unwrap();
        assert_eq!(first, 1);
        assert_eq!(second, 2);
    }

    #[test]
    fn empty_key_set_touches_nothing() {
        let gw = mock();
        gw.insert(Row::new().with("title", "a")).unwrap();
        assert_eq!(gw.delete(Vec::<i64>::new()).unwrap(), 0);
        assert_eq!(gw.update(Vec::<i64>::new(), Row::new().with("title", "b")).unwrap(), 0);
        assert_eq!(gw.find_all().count().unwrap(), 1);
    }

    #[test]
    fn update_without_columns_is_rejected() {
        let gw = mock();
        let err = gw.update(1, Row::new()).unwrap_err();
        assert!(matches!(err, GatewayError::InvalidArgument(_)));
    }

    #[test]
    fn column_names_follow_declaration_order() {
        let gw = mock();
        assert_eq!(gw.column_names().unwrap(), vec!["id", "title"]);
    }
}
