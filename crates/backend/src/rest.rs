//! PostgREST table client.
//!
//! A [`TableQuery`] becomes `GET /rest/v1/{table}` with one query parameter per filter:
//!
//! ```text
//! TableQuery::new("doctor_locations").select(&["doctor_id"]).ilike("city", "Caracas")
//!   -> /rest/v1/doctor_locations?select=doctor_id&city=ilike.Caracas
//! ```

use crate::client::{send_json, BackendClient};
use async_trait::async_trait;
use medir_core::store::{Filter, Order};
use medir_core::{DataStore, FetchError, TableQuery};
use serde_json::Value;

pub struct RestStore {
    client: BackendClient,
}

impl RestStore {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataStore for RestStore {
    async fn select(&self, query: &TableQuery) -> Result<Vec<Value>, FetchError> {
        let params = query_params(query);
        tracing::debug!("GET {} {:?}", query.table, params);

        let request = self
            .client
            .get(&table_path(&query.table))
            .query(&params);
        let rows: Option<Vec<Value>> = send_json(&query.table, request).await?;
        Ok(rows.unwrap_or_default())
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, FetchError> {
        tracing::debug!("POST {}", table);
        let request = self
            .client
            .post(&table_path(table))
            .header("Prefer", "return=representation")
            .json(&row);

        let mut stored: Vec<Value> = send_json(table, request).await?;
        stored
            .pop()
            .ok_or_else(|| FetchError::new(format!("insert into {table} returned no row")))
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<usize, FetchError> {
        if filters.is_empty() {
            return Err(FetchError::new(format!("refusing to delete every row of {table}")));
        }
        let params = filter_params(filters);
        tracing::debug!("DELETE {} {:?}", table, params);

        let request = self
            .client
            .delete(&table_path(table))
            .query(&params)
            .header("Prefer", "return=representation");
        let removed: Option<Vec<Value>> = send_json(table, request).await?;
        Ok(removed.map_or(0, |rows| rows.len()))
    }
}

fn table_path(table: &str) -> String {
    format!("/rest/v1/{table}")
}

/// PostgREST query parameters for `query`, in a stable order.
pub(crate) fn query_params(query: &TableQuery) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), query.column_list())];
    params.extend(filter_params(&query.filters));

    if let Some(Order { column, ascending }) = &query.order {
        let direction = if *ascending { "asc" } else { "desc.nullslast" };
        params.push(("order".to_string(), format!("{column}.{direction}")));
    }
    params
}

fn filter_params(filters: &[Filter]) -> Vec<(String, String)> {
    let mut params = Vec::with_capacity(filters.len());
    for filter in filters {
        let param = match filter {
            Filter::Eq(column, Value::Null) => (column.clone(), "is.null".to_string()),
            Filter::Eq(column, value) => (column.clone(), format!("eq.{}", scalar(value))),
            Filter::ILike(column, pattern) => (column.clone(), format!("ilike.{pattern}")),
            Filter::In(column, values) => {
                let list: Vec<String> = values.iter().map(quoted).collect();
                (column.clone(), format!("in.({})", list.join(",")))
            }
        };
        params.push(param);
    }
    params
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A list member, double-quoted so reserved characters (`,` `.` `:` `(` `)`) survive.
fn quoted(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
        other => other.to_string(),
    }
}
