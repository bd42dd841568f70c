//! Directory records as the core sees them.
//!
//! The shapes mirror the backend's table rows. Unknown columns are ignored on deserialisation so
//! the backend can grow without breaking the core.

use chrono::{DateTime, Utc};
use medir_types::RecordId;
use serde::{Deserialize, Serialize};

/// A medical condition used as a doctor-search filter key.
///
/// Immutable once fetched; the catalog is a read-only snapshot for the session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pathology {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Pathology {
    /// Text placed in the input box when this pathology is committed.
    pub fn display_name(&self) -> &str {
        &self.name
    }

    /// True if `needle` (already lowercased) occurs in the name or the code.
    pub(crate) fn matches_lowercase(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self
                .code
                .as_deref()
                .is_some_and(|code| code.to_lowercase().contains(needle))
    }
}

/// The doctor fields shown in a search result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DoctorSummary {
    pub id: RecordId,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub specialty: Option<String>,
    #[serde(default)]
    pub experience_description: Option<String>,
    #[serde(default)]
    pub profile_photo_url: Option<String>,
}

impl DoctorSummary {
    pub fn display_name(&self) -> String {
        format!("Dr(a). {} {}", self.first_name, self.last_name)
    }
}

/// A place where a doctor practises.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DoctorLocation {
    pub id: RecordId,
    pub doctor_id: RecordId,
    pub place_id: String,
    #[serde(default)]
    pub formatted_address: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Decodes table rows into typed records.
pub(crate) fn decode_rows<T: serde::de::DeserializeOwned>(
    what: &str,
    rows: Vec<serde_json::Value>,
) -> Result<Vec<T>, crate::FetchError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(|e| crate::FetchError::decode(what, e)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pathology_ignores_unknown_columns() {
        let row = json!({
            "id": "p1",
            "name": "Asma",
            "code": "J45",
            "created_at": "2025-01-10T12:00:00Z",
            "updated_by": "someone"
        });
        let pathology: Pathology = serde_json::from_value(row).expect("decode pathology");
        assert_eq!(pathology.code.as_deref(), Some("J45"));
        assert!(pathology.description.is_none());
    }

    #[test]
    fn matches_name_or_code() {
        let pathology = Pathology {
            id: RecordId::new("2").unwrap(),
            name: "Asbestosis".into(),
            code: Some("J61".into()),
            description: None,
            created_at: None,
        };
        assert!(pathology.matches_lowercase("bes"));
        assert!(pathology.matches_lowercase("j61"));
        assert!(!pathology.matches_lowercase("j45"));
    }

    #[test]
    fn decode_rows_reports_bad_shape() {
        let err = decode_rows::<DoctorSummary>("doctor", vec![json!({"id": "d1"})])
            .expect_err("missing names");
        assert!(err.message.starts_with("unexpected doctor data"));
    }
}
