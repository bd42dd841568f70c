//! Doctor discovery session.
//!
//! `DiscoverySession` is the state behind one doctor-search screen. It is driven by events and
//! never awaits while holding state: handlers return a [`PendingSearch`] describing the lookup
//! to run, and the caller feeds the outcome back through [`DiscoverySession::complete`]. This
//! keeps every transition deterministic and lets several lookups be in flight at once, with the
//! reconciler deciding which one lands.
//!
//! ```text
//! keystrokes --> selector --Search--> PendingSearch --execute--> complete --> results
//! place pick --> resolve_city -------> PendingSearch --execute--> complete --> results
//! ```

use crate::catalog::PathologyCatalog;
use crate::error::{DiscoveryResult, FetchError, ValidationError};
use crate::matching::{DoctorMatchQuery, SearchRequest};
use crate::model::{DoctorSummary, Pathology};
use crate::place::{resolve_city, CityResolution, PlaceSelection};
use crate::reconciler::{Completion, ResultReconciler, ResultsView, SearchTicket};
use crate::selector::{SelectorEffect, SelectorEvent, SelectorState};
use medir_types::City;

/// A lookup the caller must run, tagged with the ticket that identifies it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingSearch {
    pub ticket: SearchTicket,
    pub request: SearchRequest,
}

/// What the pathology dropdown should render.
#[derive(Clone, Debug, PartialEq)]
pub enum DropdownView<'a> {
    Hidden,
    Candidates {
        items: Vec<&'a Pathology>,
        highlight: usize,
    },
    /// Open, with typed text that matches nothing.
    NoMatches,
}

#[derive(Debug, Default)]
pub struct DiscoverySession {
    catalog: PathologyCatalog,
    selector: SelectorState,
    results: ResultReconciler,
    location_notice: Option<ValidationError>,
    catalog_error_dismissed: bool,
    focus_requested: bool,
}

impl DiscoverySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a session over an already-loaded catalog.
    pub fn with_catalog(catalog: PathologyCatalog) -> Self {
        Self {
            catalog,
            ..Self::default()
        }
    }

    /// Loads the pathology catalog.
    ///
    /// A failure only disables the pathology input; the location search keeps working and the
    /// results area is untouched.
    pub async fn load_catalog(&mut self, query: &DoctorMatchQuery) -> Result<(), FetchError> {
        self.catalog_error_dismissed = false;
        self.catalog.load(query.store(), query.timeout()).await
    }

    /// Feeds one combobox event through the selector.
    pub fn handle_selector(&mut self, event: SelectorEvent) -> Option<PendingSearch> {
        let state = std::mem::take(&mut self.selector);
        let transition = state.reduce(event, &self.catalog);
        self.selector = transition.state;

        let mut pending = None;
        for effect in transition.effects {
            match effect {
                SelectorEffect::ClearResults => self.results.clear_pathology(),
                SelectorEffect::FocusInput => self.focus_requested = true,
                SelectorEffect::Search(pathology) => {
                    let request = SearchRequest::ByPathology(pathology.id.clone());
                    let ticket = self.results.begin_pathology(pathology);
                    pending = Some(PendingSearch { ticket, request });
                }
            }
        }
        pending
    }

    /// Handles a place picked in the geocoding widget.
    ///
    /// When no city can be derived the location notice is set and no lookup is issued.
    pub fn handle_place(&mut self, place: &PlaceSelection) -> Option<PendingSearch> {
        match resolve_city(place) {
            CityResolution::Resolved(city) => {
                self.location_notice = None;
                Some(self.search_city(city))
            }
            CityResolution::Unresolved => {
                self.location_notice = Some(ValidationError::UnresolvedCity);
                None
            }
        }
    }

    /// Starts a city search directly, bypassing the geocoding widget.
    pub fn search_city(&mut self, city: City) -> PendingSearch {
        let request = SearchRequest::ByCity(city.clone());
        let ticket = self.results.begin_city(city);
        PendingSearch { ticket, request }
    }

    /// Drops the city filter, as when the location input is emptied.
    pub fn clear_city(&mut self) {
        self.results.clear_city();
        self.location_notice = None;
    }

    /// Applies the outcome of a lookup previously returned by a handler.
    pub fn complete(
        &mut self,
        ticket: SearchTicket,
        outcome: DiscoveryResult<Vec<DoctorSummary>>,
    ) -> Completion {
        self.results.complete(ticket, outcome)
    }

    /// Runs `pending` to completion against `query`.
    pub async fn search(&mut self, query: &DoctorMatchQuery, pending: PendingSearch) -> Completion {
        let outcome = query.execute(&pending.request).await;
        self.complete(pending.ticket, outcome)
    }

    pub fn catalog(&self) -> &PathologyCatalog {
        &self.catalog
    }

    pub fn selector(&self) -> &SelectorState {
        &self.selector
    }

    pub fn results(&self) -> ResultsView<'_> {
        self.results.view()
    }

    pub fn selected_pathology(&self) -> Option<&Pathology> {
        self.selector.committed()
    }

    pub fn selected_city(&self) -> Option<&City> {
        self.results.city()
    }

    /// True while the catalog is unavailable and the pathology input must be disabled.
    pub fn pathology_input_disabled(&self) -> bool {
        !self.catalog.is_ready()
    }

    pub fn dropdown(&self) -> DropdownView<'_> {
        let Some(highlight) = self.selector.highlight() else {
            return DropdownView::Hidden;
        };
        if !self.catalog.is_ready() {
            return DropdownView::Hidden;
        }

        let items = self.selector.candidates(&self.catalog);
        if !items.is_empty() {
            DropdownView::Candidates { items, highlight }
        } else if !self.selector.input().is_empty() {
            DropdownView::NoMatches
        } else {
            DropdownView::Hidden
        }
    }

    /// Catalog load error, shown next to the pathology input.
    pub fn catalog_error(&self) -> Option<&FetchError> {
        if self.catalog_error_dismissed {
            return None;
        }
        self.catalog.error()
    }

    /// Hides the catalog error. The pathology input stays disabled.
    pub fn dismiss_catalog_error(&mut self) {
        self.catalog_error_dismissed = true;
    }

    /// Search error, shown above the results.
    pub fn search_error(&self) -> Option<String> {
        self.results.error().map(ToString::to_string)
    }

    pub fn dismiss_search_error(&mut self) {
        self.results.dismiss_error();
    }

    /// Notice shown next to the location input.
    pub fn location_notice(&self) -> Option<&ValidationError> {
        self.location_notice.as_ref()
    }

    pub fn dismiss_location_notice(&mut self) {
        self.location_notice = None;
    }

    /// Returns and resets the pending request to focus the pathology input.
    pub fn take_focus_request(&mut self) -> bool {
        std::mem::take(&mut self.focus_requested)
    }
}
