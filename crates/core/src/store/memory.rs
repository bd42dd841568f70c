//! In-memory implementation of the collaborator traits.
//!
//! `MemoryStore` keeps every table as a vector of JSON rows and evaluates [`TableQuery`]
//! filters and ordering itself. It backs the CLI's offline mode and the crate's tests, where
//! its per-table call counters prove which lookups were (or were not) issued.

use super::{DataStore, Filter, MatchingService, Order, TableQuery};
use crate::constants::{DOCTORS_TABLE, DOCTOR_PATHOLOGIES_TABLE};
use crate::error::FetchError;
use crate::model::{decode_rows, DoctorSummary};
use async_trait::async_trait;
use chrono::Utc;
use medir_types::RecordId;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct Inner {
    tables: HashMap<String, Vec<Value>>,
    select_calls: HashMap<String, usize>,
    failures: HashMap<String, FetchError>,
}

/// Tables held in memory.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from a fixture object mapping table names to arrays of rows.
    ///
    /// ```text
    /// { "pathologies": [ {...}, ... ], "doctors": [ ... ], "doctor_locations": [ ... ] }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] if the fixture is not an object of arrays of objects.
    pub fn from_fixture(fixture: Value) -> Result<Self, FetchError> {
        let Value::Object(tables) = fixture else {
            return Err(FetchError::new("fixture must be a JSON object of tables"));
        };

        let store = Self::new();
        for (table, rows) in tables {
            let Value::Array(rows) = rows else {
                return Err(FetchError::new(format!(
                    "fixture table '{table}' must be an array of rows"
                )));
            };
            if rows.iter().any(|row| !row.is_object()) {
                return Err(FetchError::new(format!(
                    "fixture table '{table}' contains a row that is not an object"
                )));
            }
            store.lock().tables.insert(table, rows);
        }
        Ok(store)
    }

    /// Replaces the contents of `table`.
    pub fn put_table(&self, table: &str, rows: Vec<Value>) {
        self.lock().tables.insert(table.to_string(), rows);
    }

    /// Number of `select` calls made against `table` so far.
    pub fn select_calls(&self, table: &str) -> usize {
        self.lock().select_calls.get(table).copied().unwrap_or(0)
    }

    /// Makes every later `select` or `insert` on `table` fail with `error`.
    ///
    /// Used to simulate a backend outage for one table.
    pub fn fail_table(&self, table: &str, error: FetchError) {
        self.lock().failures.insert(table.to_string(), error);
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn select(&self, query: &TableQuery) -> Result<Vec<Value>, FetchError> {
        let mut inner = self.lock();
        *inner.select_calls.entry(query.table.clone()).or_default() += 1;

        if let Some(err) = inner.failures.get(&query.table) {
            return Err(err.clone());
        }

        let mut rows: Vec<Value> = inner
            .tables
            .get(&query.table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| query.filters.iter().all(|f| row_matches(row, f)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = &query.order {
            sort_rows(&mut rows, order);
        }

        if !query.columns.is_empty() {
            rows = rows
                .into_iter()
                .map(|row| project(row, &query.columns))
                .collect();
        }

        tracing::debug!("memory store: {} row(s) from {}", rows.len(), query.table);
        Ok(rows)
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, FetchError> {
        let mut inner = self.lock();
        if let Some(err) = inner.failures.get(table) {
            return Err(err.clone());
        }

        let Value::Object(mut fields) = row else {
            return Err(FetchError::new("inserted row must be a JSON object"));
        };
        fields
            .entry("id")
            .or_insert_with(|| Value::String(uuid::Uuid::new_v4().simple().to_string()));
        fields
            .entry("created_at")
            .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));

        let stored = Value::Object(fields);
        inner
            .tables
            .entry(table.to_string())
            .or_default()
            .push(stored.clone());
        Ok(stored)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<usize, FetchError> {
        if filters.is_empty() {
            return Err(FetchError::new(format!("refusing to delete every row of {table}")));
        }
        let mut inner = self.lock();
        if let Some(err) = inner.failures.get(table) {
            return Err(err.clone());
        }

        let Some(rows) = inner.tables.get_mut(table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|row| !filters.iter().all(|f| row_matches(row, f)));
        Ok(before - rows.len())
    }
}

#[async_trait]
impl MatchingService for MemoryStore {
    async fn doctors_by_pathology(
        &self,
        pathology_id: &RecordId,
    ) -> Result<Vec<DoctorSummary>, FetchError> {
        let links = self
            .select(
                &TableQuery::new(DOCTOR_PATHOLOGIES_TABLE)
                    .select(&["doctor_id"])
                    .eq("pathology_id", pathology_id.as_str()),
            )
            .await?;

        let doctor_ids: Vec<Value> = links
            .into_iter()
            .filter_map(|row| row.get("doctor_id").cloned())
            .collect();
        if doctor_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = self
            .select(&TableQuery::new(DOCTORS_TABLE).in_list("id", doctor_ids))
            .await?;
        decode_rows("doctor", rows)
    }
}

fn row_matches(row: &Value, filter: &Filter) -> bool {
    match filter {
        Filter::Eq(column, expected) => row
            .get(column)
            .is_some_and(|actual| values_equal(actual, expected)),
        Filter::ILike(column, pattern) => row
            .get(column)
            .and_then(Value::as_str)
            .is_some_and(|actual| ilike(actual, pattern)),
        Filter::In(column, candidates) => row
            .get(column)
            .is_some_and(|actual| candidates.iter().any(|c| values_equal(actual, c))),
    }
}

/// JSON equality that treats `10` and `10.0` as the same number, and a number and a string as
/// equal when the string spells the number (`7` and `"7"`), as a SQL comparison would.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            n.to_string() == *s
        }
        _ => a == b,
    }
}

enum LikeToken {
    AnyRun,
    AnyChar,
    Literal(char),
}

fn like_tokens(pattern: &str) -> Vec<LikeToken> {
    let mut tokens = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        tokens.push(match c {
            '%' => LikeToken::AnyRun,
            '_' => LikeToken::AnyChar,
            '\\' => LikeToken::Literal(chars.next().unwrap_or('\\')),
            other => LikeToken::Literal(other),
        });
    }
    tokens
}

/// Case-insensitive `LIKE`: `%` is any run of characters, `_` one character, `\` escapes.
fn ilike(value: &str, pattern: &str) -> bool {
    let tokens = like_tokens(&pattern.to_lowercase());

    // matched[j]: the value consumed so far matches the first j tokens.
    let mut matched = vec![false; tokens.len() + 1];
    matched[0] = true;
    for (j, token) in tokens.iter().enumerate() {
        matched[j + 1] = matched[j] && matches!(token, LikeToken::AnyRun);
    }

    for c in value.to_lowercase().chars() {
        let mut next = vec![false; tokens.len() + 1];
        for (j, token) in tokens.iter().enumerate() {
            next[j + 1] = match token {
                LikeToken::AnyRun => next[j] || matched[j + 1],
                LikeToken::AnyChar => matched[j],
                LikeToken::Literal(l) => matched[j] && *l == c,
            };
        }
        matched = next;
    }
    matched[tokens.len()]
}

fn sort_rows(rows: &mut [Value], order: &Order) {
    rows.sort_by(|a, b| {
        let ord = compare_values(a.get(&order.column), b.get(&order.column));
        if order.ascending {
            ord
        } else {
            ord.reverse()
        }
    });
}

/// Nulls sort last; strings compare case-insensitively.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::String(x)), Some(Value::String(y))) => x
            .to_lowercase()
            .cmp(&y.to_lowercase())
            .then_with(|| x.cmp(y)),
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

fn project(row: Value, columns: &[String]) -> Value {
    let Value::Object(fields) = row else {
        return row;
    };
    let projected: Map<String, Value> = fields
        .into_iter()
        .filter(|(key, _)| columns.iter().any(|c| c == key))
        .collect();
    Value::Object(projected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> MemoryStore {
        MemoryStore::from_fixture(json!({
            "doctor_locations": [
                {"id": "l1", "doctor_id": "d1", "city": "Caracas", "latitude": 10},
                {"id": "l2", "doctor_id": "d2", "city": "caracas", "latitude": 10.5},
                {"id": "l3", "doctor_id": "d3", "city": "Maracay", "latitude": null}
            ]
        }))
        .expect("valid fixture")
    }

    #[test]
    fn ilike_handles_wildcards() {
        assert!(ilike("Caracas", "caracas"));
        assert!(ilike("Caracas", "car%"));
        assert!(ilike("Caracas", "%ACAS"));
        assert!(ilike("Caracas", "c%r%s"));
        assert!(!ilike("Caracas", "cara"));
        assert!(!ilike("Maracay", "%cas"));
        assert!(ilike("Mérida", "m_rida"));
        assert!(ilike("San_José", "san\\_josé"));
        assert!(!ilike("SanXJosé", "san\\_josé"));
        assert!(ilike("100%", "100\\%"));
        assert!(!ilike("1000", "100\\%"));
    }

    #[test]
    fn numbers_equal_their_spelled_form() {
        assert!(values_equal(&json!(7), &json!("7")));
        assert!(values_equal(&json!("7"), &json!(7)));
        assert!(!values_equal(&json!(7), &json!("07")));
    }

    #[tokio::test]
    async fn delete_removes_matching_rows_only() {
        let store = store();
        let removed = store
            .delete(
                "doctor_locations",
                &[Filter::Eq("id".into(), json!("l2"))],
            )
            .await
            .expect("delete");
        assert_eq!(removed, 1);

        let rows = store
            .select(&TableQuery::new("doctor_locations").select(&["id"]))
            .await
            .expect("select");
        assert_eq!(rows, vec![json!({"id": "l1"}), json!({"id": "l3"})]);

        let removed = store
            .delete("doctor_locations", &[Filter::Eq("id".into(), json!("nope"))])
            .await
            .expect("delete");
        assert_eq!(removed, 0);

        store
            .delete("doctor_locations", &[])
            .await
            .expect_err("unfiltered delete");
    }

    #[tokio::test]
    async fn select_filters_projects_and_counts() {
        let store = store();
        let rows = store
            .select(
                &TableQuery::new("doctor_locations")
                    .select(&["doctor_id"])
                    .ilike("city", "CARACAS")
                    .order("doctor_id", false),
            )
            .await
            .expect("select");

        assert_eq!(rows, vec![json!({"doctor_id": "d2"}), json!({"doctor_id": "d1"})]);
        assert_eq!(store.select_calls("doctor_locations"), 1);
        assert_eq!(store.select_calls("doctors"), 0);
    }

    #[tokio::test]
    async fn eq_compares_integers_and_floats() {
        let store = store();
        let rows = store
            .select(&TableQuery::new("doctor_locations").eq("latitude", 10.0))
            .await
            .expect("select");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], "l1");
    }

    #[tokio::test]
    async fn insert_fills_generated_columns() {
        let store = MemoryStore::new();
        let stored = store
            .insert("doctor_locations", json!({"doctor_id": "d1"}))
            .await
            .expect("insert");

        assert!(stored["id"].as_str().is_some_and(|id| id.len() == 32));
        assert!(stored["created_at"].is_string());
        assert_eq!(
            store
                .select(&TableQuery::new("doctor_locations"))
                .await
                .expect("select")
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn failing_table_reports_error_and_still_counts() {
        let store = store();
        store.fail_table("doctor_locations", FetchError::with_status(500, "boom"));

        let err = store
            .select(&TableQuery::new("doctor_locations"))
            .await
            .expect_err("should fail");
        assert_eq!(err.status, Some(500));
        assert_eq!(store.select_calls("doctor_locations"), 1);
    }

    #[test]
    fn fixture_must_be_object_of_arrays() {
        assert!(MemoryStore::from_fixture(json!([])).is_err());
        assert!(MemoryStore::from_fixture(json!({"doctors": {}})).is_err());
        assert!(MemoryStore::from_fixture(json!({"doctors": [1]})).is_err());
    }
}
