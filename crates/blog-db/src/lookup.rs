use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::GatewayError;
use crate::query::Query;
use crate::value::{Row, Value};

/// A lookup named by convention: a prefix selecting the result shape, then
/// field names joined with `And`.
///
/// `fetchAllByCategoryIdAndVisibility` parses to
/// `FetchAllBy(["categoryId", "visibility"])`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// First matching row.
    FetchBy(Vec<String>),
    /// All matching rows.
    FetchAllBy(Vec<String>),
    /// Unexecuted query.
    FindAllBy(Vec<String>),
    /// `first field -> second field` over all rows.
    FetchPairsBy(Vec<String>),
}

const PREFIXES: [(&str, fn(Vec<String>) -> Lookup); 4] = [
    ("fetchPairsBy", Lookup::FetchPairsBy),
    ("fetchAllBy", Lookup::FetchAllBy),
    ("findAllBy", Lookup::FindAllBy),
    ("fetchBy", Lookup::FetchBy),
];

impl FromStr for Lookup {
    type Err = GatewayError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let (make, rest) = PREFIXES
            .iter()
            .find_map(|(prefix, make)| name.strip_prefix(prefix).map(|rest| (make, rest)))
            .ok_or_else(|| GatewayError::NoSuchMethod(name.to_string()))?;

        let fields = rest
            .split("And")
            .map(lcfirst)
            .collect::<Vec<_>>();
        if fields.iter().any(String::is_empty) {
            return Err(GatewayError::invalid_argument(format!(
                "'{}' names an empty field",
                name
            )));
        }

        Ok(make(fields))
    }
}

fn lcfirst(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Result of [`Gateway::call`](crate::Gateway::call), shaped by the lookup.
#[derive(Debug)]
pub enum Found<'a> {
    Row(Option<Row>),
    Rows(Vec<Row>),
    Query(Query<'a>),
    Pairs(BTreeMap<Value, Value>),
}

impl<'a> Found<'a> {
    pub fn into_row(self) -> Option<Row> {
        match self {
            Found::Row(row) => row,
            _ => None,
        }
    }

    pub fn into_rows(self) -> Option<Vec<Row>> {
        match self {
            Found::Rows(rows) => Some(rows),
            _ => None,
        }
    }

    pub fn into_query(self) -> Option<Query<'a>> {
        match self {
            Found::Query(query) => Some(query),
            _ => None,
        }
    }

    pub fn into_pairs(self) -> Option<BTreeMap<Value, Value>> {
        match self {
            Found::Pairs(pairs) => Some(pairs),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_fields_on_and() {
        let lookup: Lookup = "fetchByAuthorAndIsSingleAndId".parse().unwrap();
        assert_eq!(
            lookup,
            Lookup::FetchBy(vec!["author".into(), "isSingle".into(), "id".into()])
        );
    }

    #[test]
    fn prefixes_select_shape() {
        assert!(matches!("fetchAllByAuthor".parse::<Lookup>(), Ok(Lookup::FetchAllBy(_))));
        assert!(matches!("findAllByIsSingle".parse::<Lookup>(), Ok(Lookup::FindAllBy(_))));
        assert!(matches!("fetchPairsByIdAndAuthor".parse::<Lookup>(), Ok(Lookup::FetchPairsBy(_))));
        assert!(matches!("fetchByUrl".parse::<Lookup>(), Ok(Lookup::FetchBy(_))));
    }

    #[test]
    fn unknown_prefix_is_no_such_method() {
        let err = "fetchInvalidMethod".parse::<Lookup>().unwrap_err();
        assert!(matches!(err, GatewayError::NoSuchMethod(name) if name == "fetchInvalidMethod"));
    }

    #[test]
    fn empty_field_is_rejected() {
        assert!(matches!(
            "fetchBy".parse::<Lookup>(),
            Err(GatewayError::InvalidArgument(_))
        ));
        assert!(matches!(
            "fetchByAuthorAnd".parse::<Lookup>(),
            Err(GatewayError::InvalidArgument(_))
        ));
    }
}
