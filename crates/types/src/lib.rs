//! # Medir Types
//!
//! Validated value types shared across the medical directory crates.
//!
//! Every type here guarantees its invariant once constructed, so downstream code can accept
//! them without re-checking:
//! - [`NonEmptyText`]: trimmed text with at least one non-whitespace character
//! - [`RecordId`]: an opaque, non-empty backend record identifier
//! - [`City`]: a city name derived from a place selection and used as a query parameter

use std::fmt;

/// Errors that can occur when creating validated text types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("text cannot be empty")]
    Empty,
}

/// Text that is guaranteed to contain at least one non-whitespace character.
///
/// Input is trimmed during construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Trims `input` and wraps it.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::Empty`] if nothing remains after trimming.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Opaque identifier of a backend record (pathology, doctor, location).
///
/// The backend hands out UUID strings today, but nothing here depends on that. Identifiers are
/// compared byte-for-byte and are never normalised.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Wraps `input` as an identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::Empty`] if `input` is empty or whitespace.
    pub fn new(input: impl Into<String>) -> Result<Self, TextError> {
        let input = input.into();
        if input.trim().is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(input))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> serde::Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        // Some tables use integer keys; accept both and keep the textual form.
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(i64),
        }

        let raw = match Raw::deserialize(deserializer)? {
            Raw::Text(s) => s,
            Raw::Number(n) => n.to_string(),
        };
        RecordId::new(raw).map_err(serde::de::Error::custom)
    }
}

/// City name used to look up doctor locations.
///
/// A `City` is never empty, so a query keyed by one can never degenerate into "match every
/// location".
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct City(NonEmptyText);

impl City {
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        NonEmptyText::new(input).map(Self)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl AsRef<str> for City {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_trims_input() {
        let text = NonEmptyText::new("  Asma  ").expect("valid text");
        assert_eq!(text.as_str(), "Asma");
    }

    #[test]
    fn non_empty_text_rejects_whitespace() {
        assert_eq!(NonEmptyText::new("   \t"), Err(TextError::Empty));
    }

    #[test]
    fn record_id_accepts_numeric_json() {
        let id: RecordId = serde_json::from_str("42").expect("numeric id");
        assert_eq!(id.as_str(), "42");

        let id: RecordId = serde_json::from_str("\"a1b2\"").expect("text id");
        assert_eq!(id.as_str(), "a1b2");
    }

    #[test]
    fn record_id_rejects_empty_json_string() {
        let err = serde_json::from_str::<RecordId>("\"\"").expect_err("empty id");
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn city_rejects_empty() {
        assert!(City::new("").is_err());
        assert_eq!(City::new(" Caracas ").expect("city").as_str(), "Caracas");
    }
}
