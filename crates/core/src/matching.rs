//! Doctor match queries.
//!
//! Two independent lookups produce a doctor list:
//! - by pathology, through the external [`MatchingService`]
//! - by city, as a two-step table read: matching locations first, then the doctors they
//!   reference
//!
//! Every collaborator call is bounded by the configured timeout. Both lookups only borrow
//! `self`, so several can be outstanding at once; deciding which result is shown is the
//! reconciler's job, not this module's.

use crate::constants::{DOCTORS_TABLE, DOCTOR_LOCATIONS_TABLE};
use crate::error::{DiscoveryResult, FetchError};
use crate::model::{decode_rows, DoctorSummary};
use crate::store::{escape_like, DataStore, MatchingService, TableQuery};
use medir_types::{City, RecordId};
use serde_json::Value;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// What a triggered search looks up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchRequest {
    ByPathology(RecordId),
    ByCity(City),
}

/// Issues doctor lookups against injected collaborators.
#[derive(Clone)]
pub struct DoctorMatchQuery {
    store: Arc<dyn DataStore>,
    matcher: Arc<dyn MatchingService>,
    timeout: Duration,
}

impl DoctorMatchQuery {
    pub fn new(
        store: Arc<dyn DataStore>,
        matcher: Arc<dyn MatchingService>,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            matcher,
            timeout,
        }
    }

    pub fn store(&self) -> &dyn DataStore {
        self.store.as_ref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Runs whichever lookup `request` describes.
    pub async fn execute(&self, request: &SearchRequest) -> DiscoveryResult<Vec<DoctorSummary>> {
        match request {
            SearchRequest::ByPathology(id) => self.by_pathology(id).await,
            SearchRequest::ByCity(city) => self.by_city(city).await,
        }
    }

    /// Doctors the matching service associates with `pathology_id`.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] on transport failure, non-success status or timeout. Callers
    /// must clear their list on error rather than keep showing older matches.
    pub async fn by_pathology(
        &self,
        pathology_id: &RecordId,
    ) -> DiscoveryResult<Vec<DoctorSummary>> {
        tracing::debug!("searching doctors for pathology {}", pathology_id);
        let lookup = self.matcher.doctors_by_pathology(pathology_id);
        let doctors = bounded(self.timeout, lookup).await?;
        tracing::info!(
            "{} doctor(s) found for pathology {}",
            doctors.len(),
            pathology_id
        );
        Ok(doctors)
    }

    /// Doctors with at least one location in `city` (case-insensitive).
    ///
    /// The doctor table is only read when some location matched; each doctor appears once no
    /// matter how many of their locations are in the city.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] if either step fails; a failure in the second step never
    /// yields a partial list.
    pub async fn by_city(&self, city: &City) -> DiscoveryResult<Vec<DoctorSummary>> {
        tracing::debug!("searching doctors in {}", city);
        let locations = TableQuery::new(DOCTOR_LOCATIONS_TABLE)
            .select(&["doctor_id"])
            .ilike("city", &escape_like(city.as_str()));
        let rows = bounded(self.timeout, self.store.select(&locations)).await?;

        let doctor_ids = distinct_doctor_ids(&rows);
        if doctor_ids.is_empty() {
            tracing::info!("no doctor locations in {}", city);
            return Ok(Vec::new());
        }
        tracing::debug!("{} distinct doctor(s) in {}", doctor_ids.len(), city);

        let doctors = TableQuery::new(DOCTORS_TABLE).in_list("id", doctor_ids);
        let rows = bounded(self.timeout, self.store.select(&doctors)).await?;
        let doctors = decode_rows::<DoctorSummary>("doctor", rows)?;

        tracing::info!("{} doctor(s) found in {}", doctors.len(), city);
        Ok(doctors)
    }
}

/// Awaits `call`, converting an elapsed `limit` into a [`FetchError`].
pub(crate) async fn bounded<T>(
    limit: Duration,
    call: impl Future<Output = Result<T, FetchError>>,
) -> Result<T, FetchError> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.inspect_err(|e| tracing::warn!("backend call failed: {}", e)),
        Err(_) => {
            tracing::warn!("backend call timed out after {:?}", limit);
            Err(FetchError::timeout(limit))
        }
    }
}

/// `doctor_id` values in first-seen order, without repeats.
///
/// Ids are passed on as the JSON values the store returned, so integer keys stay integers.
fn distinct_doctor_ids(rows: &[Value]) -> Vec<Value> {
    let mut seen = HashSet::new();
    rows.iter()
        .filter_map(|row| match row.get("doctor_id") {
            Some(id @ Value::String(key)) => Some((key.clone(), id.clone())),
            Some(id @ Value::Number(key)) => Some((key.to_string(), id.clone())),
            _ => None,
        })
        .filter(|(key, _)| seen.insert(key.clone()))
        .map(|(_, id)| id)
        .collect()
}
