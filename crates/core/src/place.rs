//! Place selections from the geocoding widget.
//!
//! The widget hands over a loosely-shaped object. The core only relies on the fields modelled
//! here (address components, their type labels, optional geometry); everything else is ignored
//! during deserialisation.

use crate::constants::{
    ADMINISTRATIVE_AREA_LEVEL_1, ADMINISTRATIVE_AREA_LEVEL_2, COUNTRY, LOCALITY,
};
use medir_types::City;
use serde::Deserialize;
use std::collections::BTreeSet;

/// One piece of a structured address, tagged with semantic labels such as `locality`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct AddressComponent {
    pub long_name: String,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub types: BTreeSet<String>,
}

impl AddressComponent {
    pub fn has_type(&self, label: &str) -> bool {
        self.types.contains(label)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct Geometry {
    pub location: LatLng,
}

/// The place the user picked in the geocoding widget.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct PlaceSelection {
    #[serde(default)]
    pub place_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub formatted_address: Option<String>,
    #[serde(default)]
    pub address_components: Vec<AddressComponent>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
}

impl PlaceSelection {
    /// First component carrying `label`.
    pub fn first_with(&self, label: &str) -> Option<&AddressComponent> {
        self.address_components.iter().find(|c| c.has_type(label))
    }

    /// Last component carrying `label`.
    pub fn last_with(&self, label: &str) -> Option<&AddressComponent> {
        self.address_components
            .iter()
            .rev()
            .find(|c| c.has_type(label))
    }

    /// Coordinates, or `(0.0, 0.0)` when the widget sent no geometry.
    pub fn coordinates(&self) -> (f64, f64) {
        self.geometry
            .map(|g| (g.location.lat, g.location.lng))
            .unwrap_or((0.0, 0.0))
    }
}

/// Outcome of [`resolve_city`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CityResolution {
    Resolved(City),
    /// No usable locality or level-2 administrative area; no query may be issued.
    Unresolved,
}

impl CityResolution {
    pub fn city(&self) -> Option<&City> {
        match self {
            CityResolution::Resolved(city) => Some(city),
            CityResolution::Unresolved => None,
        }
    }
}

/// Extracts the city a place belongs to.
///
/// The first `locality` component wins; without one, the first `administrative_area_level_2`
/// component is used. A component whose name is blank counts as absent.
pub fn resolve_city(place: &PlaceSelection) -> CityResolution {
    let candidate = place
        .first_with(LOCALITY)
        .or_else(|| place.first_with(ADMINISTRATIVE_AREA_LEVEL_2));

    match candidate.and_then(|c| City::new(&c.long_name).ok()) {
        Some(city) => CityResolution::Resolved(city),
        None => {
            tracing::warn!(
                "no city in place selection: {}",
                place.formatted_address.as_deref().unwrap_or("<no address>")
            );
            CityResolution::Unresolved
        }
    }
}

/// Address fields stored with a doctor location.
///
/// Unlike [`resolve_city`], `city` here is the locality only, and each field takes the last
/// component carrying its label.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AddressParts {
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
}

pub fn address_parts(place: &PlaceSelection) -> AddressParts {
    let name = |label: &str| place.last_with(label).map(|c| c.long_name.clone());
    AddressParts {
        city: name(LOCALITY),
        region: name(ADMINISTRATIVE_AREA_LEVEL_1),
        country: name(COUNTRY),
    }
}
