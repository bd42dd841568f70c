//! # Medir Core
//!
//! Doctor discovery for the medical directory.
//!
//! This crate holds the search behaviour and nothing else:
//! - the pathology catalog cache and its local filter
//! - the combobox selector state machine
//! - city extraction from geocoded places
//! - doctor lookups by pathology or by city
//! - last-request-wins reconciliation of the result list
//! - doctor location registration
//!
//! **No transport concerns**: HTTP clients for the backend live in `medir-backend`; the core
//! only sees the [`DataStore`] and [`MatchingService`] traits.

pub mod catalog;
pub mod config;
pub mod constants;
pub mod error;
pub mod locations;
pub mod matching;
pub mod model;
pub mod place;
pub mod reconciler;
pub mod selector;
pub mod session;
pub mod store;

pub use catalog::{CatalogStatus, PathologyCatalog};
pub use config::DiscoveryConfig;
pub use error::{
    ConfigError, ConfigResult, DiscoveryError, DiscoveryResult, FetchError, ValidationError,
};
pub use locations::LocationRegistry;
pub use matching::{DoctorMatchQuery, SearchRequest};
pub use model::{DoctorLocation, DoctorSummary, Pathology};
pub use place::{resolve_city, CityResolution, PlaceSelection};
pub use reconciler::{Completion, EmptyState, ResultReconciler, ResultsView, SearchTicket};
pub use selector::{SelectorEffect, SelectorEvent, SelectorState};
pub use session::{DiscoverySession, DropdownView, PendingSearch};
pub use store::memory::MemoryStore;
pub use store::{DataStore, MatchingService, TableQuery};
