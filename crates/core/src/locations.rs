//! Doctor location registry.
//!
//! Locations are what the city search reads. Registering one stores the place the doctor picked
//! in the geocoding widget together with the locality, region and country taken from its address
//! components. Removing one deletes the row by id.

use crate::constants::DOCTOR_LOCATIONS_TABLE;
use crate::error::{DiscoveryResult, ValidationError};
use crate::matching::bounded;
use crate::model::{decode_rows, DoctorLocation};
use crate::place::{address_parts, PlaceSelection};
use crate::store::{DataStore, Filter, TableQuery};
use medir_types::RecordId;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

pub struct LocationRegistry {
    store: Arc<dyn DataStore>,
    timeout: Duration,
}

impl LocationRegistry {
    pub fn new(store: Arc<dyn DataStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Stores `place` as a practice location of `doctor_id`.
    ///
    /// Coordinates default to `0.0` when the place has no geometry. A location is a duplicate
    /// when the doctor already has one at exactly the same coordinates.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::MissingPlace`] if the place has no place id
    /// - [`ValidationError::DuplicateLocation`] if the doctor already has this location
    /// - a fetch error if either backend call fails
    pub async fn register(
        &self,
        doctor_id: &RecordId,
        place: &PlaceSelection,
    ) -> DiscoveryResult<DoctorLocation> {
        let place_id = place
            .place_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(ValidationError::MissingPlace)?;
        let (latitude, longitude) = place.coordinates();

        let existing = TableQuery::new(DOCTOR_LOCATIONS_TABLE)
            .select(&["id"])
            .eq("doctor_id", doctor_id.as_str())
            .eq("latitude", latitude)
            .eq("longitude", longitude);
        if !bounded(self.timeout, self.store.select(&existing))
            .await?
            .is_empty()
        {
            tracing::info!("doctor {} already has location {}", doctor_id, place_id);
            return Err(ValidationError::DuplicateLocation.into());
        }

        let parts = address_parts(place);
        let row = json!({
            "doctor_id": doctor_id.as_str(),
            "place_id": place_id,
            "formatted_address": place.formatted_address.clone().unwrap_or_default(),
            "latitude": latitude,
            "longitude": longitude,
            "city": parts.city,
            "region": parts.region,
            "country": parts.country,
        });
        let stored = bounded(
            self.timeout,
            self.store.insert(DOCTOR_LOCATIONS_TABLE, row),
        )
        .await?;

        let mut decoded = decode_rows::<DoctorLocation>("doctor location", vec![stored])?;
        let location = decoded
            .pop()
            .ok_or_else(|| crate::FetchError::new("insert returned no row"))?;
        tracing::info!(
            "registered location {} for doctor {} in {}",
            location.id,
            doctor_id,
            location.city.as_deref().unwrap_or("<no city>")
        );
        Ok(location)
    }

    /// Deletes the location `location_id`.
    ///
    /// # Errors
    ///
    /// [`ValidationError::LocationNotFound`] if no row was removed, or a fetch error.
    pub async fn remove(&self, location_id: &RecordId) -> DiscoveryResult<()> {
        let filters = [Filter::Eq("id".into(), location_id.as_str().into())];
        let removed = bounded(
            self.timeout,
            self.store.delete(DOCTOR_LOCATIONS_TABLE, &filters),
        )
        .await?;

        if removed == 0 {
            tracing::warn!("no location {} to remove", location_id);
            return Err(ValidationError::LocationNotFound.into());
        }
        tracing::info!("removed location {}", location_id);
        Ok(())
    }

    /// Every location of `doctor_id`, newest first.
    pub async fn list(&self, doctor_id: &RecordId) -> DiscoveryResult<Vec<DoctorLocation>> {
        let query = TableQuery::new(DOCTOR_LOCATIONS_TABLE)
            .eq("doctor_id", doctor_id.as_str())
            .order("created_at", false);
        let rows = bounded(self.timeout, self.store.select(&query)).await?;
        Ok(decode_rows("doctor location", rows)?)
    }
}
