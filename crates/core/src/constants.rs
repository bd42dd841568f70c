//! Constants used throughout the medir core crate.
//!
//! Table names, column names and geocoding labels live here so the query builders, the
//! in-memory store and the HTTP adapter all agree on them.

use std::time::Duration;

/// Table holding the pathology catalog.
pub const PATHOLOGIES_TABLE: &str = "pathologies";

/// Table holding doctor profiles.
pub const DOCTORS_TABLE: &str = "doctors";

/// Table holding the places where doctors practise.
pub const DOCTOR_LOCATIONS_TABLE: &str = "doctor_locations";

/// Join table between doctors and the pathologies they treat.
pub const DOCTOR_PATHOLOGIES_TABLE: &str = "doctor_pathologies";

/// Name of the edge function that matches doctors to a pathology.
pub const DEFAULT_MATCHING_FUNCTION: &str = "doctors-by-pathology";

/// Bound applied to every collaborator call when no timeout is configured.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Address component label for a city.
pub const LOCALITY: &str = "locality";

/// Address component label for a county/municipality, used when no locality is present.
pub const ADMINISTRATIVE_AREA_LEVEL_2: &str = "administrative_area_level_2";

/// Address component label for a state/region.
pub const ADMINISTRATIVE_AREA_LEVEL_1: &str = "administrative_area_level_1";

/// Address component label for a country.
pub const COUNTRY: &str = "country";
