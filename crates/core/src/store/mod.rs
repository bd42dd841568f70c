//! Collaborator interfaces for the backend.
//!
//! The core never talks to the network directly. It describes each table read as a
//! [`TableQuery`] and hands it to an injected [`DataStore`]; pathology matching goes through an
//! injected [`MatchingService`]. Both are object-safe so a session can hold them as
//! `Arc<dyn ...>` and tests can substitute [`memory::MemoryStore`].

pub mod memory;

use crate::error::FetchError;
use crate::model::DoctorSummary;
use async_trait::async_trait;
use medir_types::RecordId;
use serde_json::Value;

/// One predicate of a table read.
#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    /// `column = value`
    Eq(String, Value),
    /// Case-insensitive pattern match; `%` matches any run of characters, `_` any single
    /// character, and `\` escapes the next one. Without wildcards this is case-insensitive
    /// equality.
    ILike(String, String),
    /// `column IN (values...)`
    In(String, Vec<Value>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// A single request-response read against one table.
#[derive(Clone, Debug, PartialEq)]
pub struct TableQuery {
    pub table: String,
    pub columns: Vec<String>,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
}

impl TableQuery {
    /// Select every column of `table`.
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            columns: Vec::new(),
            filters: Vec::new(),
            order: None,
        }
    }

    pub fn select(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq(column.to_string(), value.into()));
        self
    }

    pub fn ilike(mut self, column: &str, pattern: &str) -> Self {
        self.filters
            .push(Filter::ILike(column.to_string(), pattern.to_string()));
        self
    }

    pub fn in_list<V: Into<Value>>(
        mut self,
        column: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.filters.push(Filter::In(
            column.to_string(),
            values.into_iter().map(Into::into).collect(),
        ));
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            ascending,
        });
        self
    }

    /// Columns to return, `*` when none were named.
    pub fn column_list(&self) -> String {
        if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns.join(",")
        }
    }
}

/// Escapes `%`, `_` and `\` so `text` matches itself under [`Filter::ILike`].
pub fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Row-level access to the backend's tables.
///
/// Every call is a single terminal request/response; there is no streaming.
#[async_trait]
pub trait DataStore: Send + Sync {
    async fn select(&self, query: &TableQuery) -> Result<Vec<Value>, FetchError>;

    /// Inserts `row` into `table` and returns the row as stored (with generated columns).
    async fn insert(&self, table: &str, row: Value) -> Result<Value, FetchError>;

    /// Deletes the rows of `table` matching every filter and returns how many were removed.
    ///
    /// An empty filter list is refused rather than treated as "every row".
    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<usize, FetchError>;
}

/// The service that knows which doctors treat a pathology.
#[async_trait]
pub trait MatchingService: Send + Sync {
    async fn doctors_by_pathology(
        &self,
        pathology_id: &RecordId,
    ) -> Result<Vec<DoctorSummary>, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_collects_filters_in_order() {
        let query = TableQuery::new("doctor_locations")
            .select(&["doctor_id"])
            .ilike("city", "Caracas")
            .in_list("id", ["a", "b"])
            .order("name", true);

        assert_eq!(query.column_list(), "doctor_id");
        assert_eq!(
            query.filters,
            vec![
                Filter::ILike("city".into(), "Caracas".into()),
                Filter::In("id".into(), vec![json!("a"), json!("b")]),
            ]
        );
        assert_eq!(
            query.order,
            Some(Order {
                column: "name".into(),
                ascending: true
            })
        );
    }

    #[test]
    fn column_list_defaults_to_star() {
        assert_eq!(TableQuery::new("doctors").column_list(), "*");
    }
}
