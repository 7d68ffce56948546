use std::collections::BTreeMap;
use std::fmt;

use chrono::DateTime;
use rusqlite::{Connection, params_from_iter};
use tracing::debug;

use crate::Database;
use crate::error::{GatewayError, Result};
use crate::value::{Row, TIMESTAMP_FORMAT, Value};

pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// `?start, ?start+1, ...` for `count` bound parameters.
pub(crate) fn placeholders(start: usize, count: usize) -> String {
    (start..start + count)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Equality conditions joined with AND.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((column.into(), value.into()));
        self
    }

    /// Pairs field names with values positionally.
    ///
    /// Fails with `InvalidArgument` unless both sides have the same length.
    pub fn zip<I, S>(fields: I, values: Vec<Value>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        if fields.len() != values.len() {
            return Err(GatewayError::invalid_argument(format!(
                "filter expects {} parameters, but {} given",
                fields.len(),
                values.len()
            )));
        }
        Ok(Self {
            conditions: fields.into_iter().zip(values).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.conditions.iter().map(|(c, v)| (c.as_str(), v))
    }

    /// Renders the WHERE body, appending bound values to `params`.
    fn render(&self, params: &mut Vec<Value>) -> String {
        self.conditions
            .iter()
            .map(|(column, value)| {
                if value.is_null() {
                    format!("{} IS NULL", quote_ident(column))
                } else {
                    params.push(value.clone());
                    format!("{} = ?{}", quote_ident(column), params.len())
                }
            })
            .collect::<Vec<_>>()
            .join(" AND ")
    }
}

/// A de-duplicated set of primary key values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Keys(Vec<Value>);

impl Keys {
    pub fn new(values: impl IntoIterator<Item = Value>) -> Self {
        let mut keys: Vec<Value> = Vec::new();
        for value in values {
            if !keys.contains(&value) {
                keys.push(value);
            }
        }
        Keys(keys)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.iter()
    }
}

impl From<Value> for Keys {
    fn from(v: Value) -> Self {
        Keys(vec![v])
    }
}

impl From<i64> for Keys {
    fn from(v: i64) -> Self {
        Keys(vec![v.into()])
    }
}

impl From<i32> for Keys {
    fn from(v: i32) -> Self {
        Keys(vec![v.into()])
    }
}

impl From<&str> for Keys {
    fn from(v: &str) -> Self {
        Keys(vec![v.into()])
    }
}

impl<T: Into<Value>> From<Vec<T>> for Keys {
    fn from(v: Vec<T>) -> Self {
        Keys::new(v.into_iter().map(Into::into))
    }
}

impl<T: Into<Value> + Clone> From<&[T]> for Keys {
    fn from(v: &[T]) -> Self {
        Keys::new(v.iter().cloned().map(Into::into))
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Keys {
    fn from(v: [T; N]) -> Self {
        Keys::new(v.into_iter().map(Into::into))
    }
}

/// Storage class inferred from a column's declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Boolean,
    Real,
    Text,
    Timestamp,
    Unknown,
}

impl ColumnType {
    pub fn from_decl(decl: Option<&str>) -> Self {
        let Some(decl) = decl else {
            return ColumnType::Unknown;
        };
        let decl = decl.to_ascii_uppercase();
        if decl.contains("BOOL") {
            ColumnType::Boolean
        } else if decl.contains("INT") {
            ColumnType::Integer
        } else if decl.contains("DATE") || decl.contains("TIME") {
            ColumnType::Timestamp
        } else if decl.contains("CHAR") || decl.contains("CLOB") || decl.contains("TEXT") {
            ColumnType::Text
        } else if ["REAL", "FLOA", "DOUB", "DEC", "NUM"].iter().any(|t| decl.contains(t)) {
            ColumnType::Real
        } else {
            ColumnType::Unknown
        }
    }

    fn coerce(self, value: Value) -> Value {
        match (self, value) {
            (_, Value::Null) => Value::Null,
            (ColumnType::Integer, Value::Text(s)) => match s.trim().parse::<i64>() {
                Ok(i) => Value::Integer(i),
                Err(_) => Value::Text(s),
            },
            (ColumnType::Integer, Value::Real(f)) if f.fract() == 0.0 => Value::Integer(f as i64),
            (ColumnType::Boolean, v) => match v.as_bool() {
                Some(b) => Value::from(b),
                None => v,
            },
            (ColumnType::Real, Value::Integer(i)) => Value::Real(i as f64),
            (ColumnType::Real, Value::Text(s)) => match s.trim().parse::<f64>() {
                Ok(f) => Value::Real(f),
                Err(_) => Value::Text(s),
            },
            (ColumnType::Timestamp, Value::Integer(secs)) => match DateTime::from_timestamp(secs, 0) {
                Some(ts) => Value::Text(ts.naive_utc().format(TIMESTAMP_FORMAT).to_string()),
                None => Value::Integer(secs),
            },
            (ColumnType::Text, Value::Integer(i)) => Value::Text(i.to_string()),
            (ColumnType::Text, Value::Real(f)) => Value::Text(f.to_string()),
            (_, v) => v,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    pub name: String,
    pub decl_type: Option<String>,
}

/// Raw rows returned by the driver, before they are handed out as [`Row`]s.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    columns: Vec<ColumnInfo>,
    rows: Vec<Vec<Value>>,
}

impl ResultSet {
    pub(crate) fn read(conn: &Connection, sql: &str, params: &[Value]) -> Result<Self> {
        debug!(sql, params = params.len(), "select");
        let mut stmt = conn.prepare(sql)?;
        let columns: Vec<ColumnInfo> = stmt
            .columns()
            .iter()
            .map(|c| ColumnInfo {
                name: c.name().to_string(),
                decl_type: c.decl_type().map(str::to_string),
            })
            .collect();

        let mut rows = Vec::new();
        let mut cursor = stmt.query(params_from_iter(params))?;
        while let Some(row) = cursor.next()? {
            let mut values = Vec::with_capacity(columns.len());
            for idx in 0..columns.len() {
                values.push(Value::from(row.get_ref(idx)?));
            }
            rows.push(values);
        }

        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Coerces every value to the storage class its column declares.
    pub fn detect_types(mut self) -> Self {
        let types: Vec<ColumnType> = self
            .columns
            .iter()
            .map(|c| ColumnType::from_decl(c.decl_type.as_deref()))
            .collect();

        for row in &mut self.rows {
            for (value, ty) in row.iter_mut().zip(&types) {
                *value = ty.coerce(std::mem::replace(value, Value::Null));
            }
        }
        self
    }

    pub fn fetch(self) -> Option<Row> {
        self.fetch_all().into_iter().next()
    }

    pub fn fetch_all(self) -> Vec<Row> {
        let names: Vec<String> = self.columns.into_iter().map(|c| c.name).collect();
        self.rows
            .into_iter()
            .map(|values| names.iter().cloned().zip(values).collect())
            .collect()
    }

    /// Builds `key column -> value column` over all rows. Later rows win on
    /// duplicate keys.
    pub fn fetch_pairs(self, key: &str, value: &str) -> Result<BTreeMap<Value, Value>> {
        let position = |name: &str| {
            self.columns
                .iter()
                .position(|c| c.name == name)
                .ok_or_else(|| GatewayError::invalid_argument(format!("unknown column '{}'", name)))
        };
        let (k, v) = (position(key)?, position(value)?);

        Ok(self
            .rows
            .into_iter()
            .map(|mut row| {
                let val = if k == v {
                    row[v].clone()
                } else {
                    std::mem::replace(&mut row[v], Value::Null)
                };
                (row.swap_remove(k), val)
            })
            .collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Asc,
    Desc,
}

/// An unexecuted `SELECT * FROM table ...`.
///
/// Built by the gateways; callers may add clauses before running it.
#[derive(Clone)]
pub struct Query<'a> {
    db: &'a Database,
    table: String,
    filter: Filter,
    order: Vec<(String, Direction)>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl<'a> Query<'a> {
    pub fn select(db: &'a Database, table: impl Into<String>) -> Self {
        Self {
            db,
            table: table.into(),
            filter: Filter::default(),
            order: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter.conditions.extend(filter.conditions);
        self
    }

    pub fn where_eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter = self.filter.eq(column, value);
        self
    }

    pub fn order_by(mut self, column: impl Into<String>) -> Self {
        self.order.push((column.into(), Direction::Asc));
        self
    }

    pub fn order_by_desc(mut self, column: impl Into<String>) -> Self {
        self.order.push((column.into(), Direction::Desc));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// SQL text with `?N` placeholders plus the values to bind.
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        let mut params = Vec::new();
        let mut sql = format!("SELECT * FROM {}", quote_ident(&self.table));

        if !self.filter.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.filter.render(&mut params));
        }

        if !self.order.is_empty() {
            let order = self
                .order
                .iter()
                .map(|(column, dir)| match dir {
                    Direction::Asc => quote_ident(column),
                    Direction::Desc => format!("{} DESC", quote_ident(column)),
                })
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(" ORDER BY ");
            sql.push_str(&order);
        }

        match (self.limit, self.offset) {
            (Some(limit), Some(offset)) => sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset)),
            (Some(limit), None) => sql.push_str(&format!(" LIMIT {}", limit)),
            (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {}", offset)),
            (None, None) => {}
        }

        (sql, params)
    }

    pub fn execute(&self) -> Result<ResultSet> {
        let (sql, params) = self.to_sql();
        self.db.with_conn(|conn| ResultSet::read(conn, &sql, &params))
    }

    pub fn count(&self) -> Result<usize> {
        let (sql, params) = self.to_sql();
        let sql = format!("SELECT COUNT(*) FROM ({})", sql);
        self.db.with_conn(|conn| {
            debug!(sql = %sql, "count");
            let n: i64 = conn.query_row(&sql, params_from_iter(&params), |row| row.get(0))?;
            Ok(n as usize)
        })
    }

    pub fn fetch(&self) -> Result<Option<Row>> {
        Ok(self.execute()?.fetch())
    }

    pub fn fetch_all(&self) -> Result<Vec<Row>> {
        Ok(self.execute()?.fetch_all())
    }

    pub fn fetch_pairs(&self, key: &str, value: &str) -> Result<BTreeMap<Value, Value>> {
        self.execute()?.fetch_pairs(key, value)
    }
}

impl fmt::Display for Query<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql().0)
    }
}

impl fmt::Debug for Query<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (sql, params) = self.to_sql();
        f.debug_struct("Query")
            .field("sql", &sql)
            .field("params", &params)
            .finish()
    }
}
