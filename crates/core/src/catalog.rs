//! Pathology catalog cache.
//!
//! The full catalog is fetched once per session, ordered by name, and then filtered locally on
//! every keystroke. Filtering never touches the network.

use crate::constants::PATHOLOGIES_TABLE;
use crate::error::FetchError;
use crate::model::{decode_rows, Pathology};
use crate::store::{DataStore, TableQuery};
use std::time::Duration;

/// Outcome of the most recent catalog load.
///
/// [`PathologyCatalog::load`] holds the catalog mutably for the whole fetch, so there is no
/// observable in-between state; callers show a loading indicator while the future is pending.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum CatalogStatus {
    #[default]
    NotLoaded,
    Ready,
    Failed(FetchError),
}

/// Read-only snapshot of the pathology table.
#[derive(Clone, Debug, Default)]
pub struct PathologyCatalog {
    pathologies: Vec<Pathology>,
    status: CatalogStatus,
}

impl PathologyCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an already-loaded catalog. `pathologies` must be in name order.
    pub fn from_loaded(pathologies: Vec<Pathology>) -> Self {
        Self {
            pathologies,
            status: CatalogStatus::Ready,
        }
    }

    /// Fetches every pathology ordered by name ascending, replacing the snapshot.
    ///
    /// On failure the cache is left empty and the error is both recorded in
    /// [`status`](Self::status) and returned.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] on transport/service failure, undecodable rows, or when the
    /// store does not answer within `timeout`.
    pub async fn load(
        &mut self,
        store: &dyn DataStore,
        timeout: Duration,
    ) -> Result<(), FetchError> {
        self.pathologies.clear();

        let query = TableQuery::new(PATHOLOGIES_TABLE).order("name", true);
        let outcome = match tokio::time::timeout(timeout, store.select(&query)).await {
            Ok(result) => result.and_then(|rows| decode_rows::<Pathology>("pathology", rows)),
            Err(_) => Err(FetchError::timeout(timeout)),
        };

        match outcome {
            Ok(pathologies) => {
                tracing::info!("loaded {} pathologies", pathologies.len());
                self.pathologies = pathologies;
                self.status = CatalogStatus::Ready;
                Ok(())
            }
            Err(err) => {
                tracing::warn!("failed to load pathology catalog: {}", err);
                self.status = CatalogStatus::Failed(err.clone());
                Err(err)
            }
        }
    }

    /// Pathologies whose name or code contains `query`, case-insensitively, in catalog order.
    ///
    /// An empty query returns the whole catalog.
    pub fn filter(&self, query: &str) -> Vec<&Pathology> {
        if query.is_empty() {
            return self.pathologies.iter().collect();
        }
        let needle = query.to_lowercase();
        self.pathologies
            .iter()
            .filter(|p| p.matches_lowercase(&needle))
            .collect()
    }

    pub fn status(&self) -> &CatalogStatus {
        &self.status
    }

    /// True once a load has completed successfully. The pathology input stays disabled until
    /// then.
    pub fn is_ready(&self) -> bool {
        matches!(self.status, CatalogStatus::Ready)
    }

    /// The load error, if the last load failed.
    pub fn error(&self) -> Option<&FetchError> {
        match &self.status {
            CatalogStatus::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.pathologies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pathologies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use serde_json::json;

    fn asthma_catalog_store() -> MemoryStore {
        MemoryStore::from_fixture(json!({
            "pathologies": [
                {"id": 2, "name": "Asbestosis", "code": "J61"},
                {"id": 3, "name": "Bronquitis", "code": null, "description": "Inflamación"},
                {"id": 1, "name": "Asma", "code": "J45"}
            ]
        }))
        .expect("fixture")
    }

    fn names(found: &[&Pathology]) -> Vec<String> {
        found.iter().map(|p| p.name.clone()).collect()
    }

    #[tokio::test]
    async fn load_orders_by_name() {
        let store = asthma_catalog_store();
        let mut catalog = PathologyCatalog::new();
        catalog
            .load(&store, Duration::from_secs(1))
            .await
            .expect("load");

        assert!(catalog.is_ready());
        assert_eq!(
            names(&catalog.filter("")),
            vec!["Asbestosis", "Asma", "Bronquitis"]
        );
    }

    #[tokio::test]
    async fn filter_matches_name_or_code_case_insensitively() {
        let store = asthma_catalog_store();
        let mut catalog = PathologyCatalog::new();
        catalog
            .load(&store, Duration::from_secs(1))
            .await
            .expect("load");

        assert_eq!(names(&catalog.filter("as")), vec!["Asbestosis", "Asma"]);
        assert_eq!(names(&catalog.filter("j61")), vec!["Asbestosis"]);
        assert_eq!(names(&catalog.filter("QUITIS")), vec!["Bronquitis"]);
        assert!(catalog.filter("zzz").is_empty());
    }

    #[tokio::test]
    async fn failed_load_leaves_cache_empty() {
        let store = asthma_catalog_store();
        let mut catalog = PathologyCatalog::new();
        catalog
            .load(&store, Duration::from_secs(1))
            .await
            .expect("first load");

        store.fail_table(PATHOLOGIES_TABLE, FetchError::with_status(401, "JWT expired"));
        let err = catalog
            .load(&store, Duration::from_secs(1))
            .await
            .expect_err("second load fails");

        assert_eq!(err.status, Some(401));
        assert!(catalog.is_empty());
        assert!(!catalog.is_ready());
        assert_eq!(catalog.error(), Some(&err));
    }

    #[tokio::test]
    async fn status_records_each_load_outcome() {
        let store = asthma_catalog_store();
        let mut catalog = PathologyCatalog::new();
        assert_eq!(catalog.status(), &CatalogStatus::NotLoaded);

        store.fail_table(PATHOLOGIES_TABLE, FetchError::new("offline"));
        let err = catalog
            .load(&store, Duration::from_secs(1))
            .await
            .expect_err("offline");
        assert_eq!(catalog.status(), &CatalogStatus::Failed(err));
    }
}
