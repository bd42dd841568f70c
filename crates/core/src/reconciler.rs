//! Result reconciliation.
//!
//! The reconciler owns the one doctor list on screen and the two active-filter flags. Every
//! triggered lookup is stamped with a generation number; a completion is applied only if its
//! generation is still the latest, so a slow earlier response can never overwrite a newer one.
//! Superseded responses are dropped silently.
//!
//! Pathology and city results are never intersected: whichever lookup was triggered last
//! replaces the list wholesale.

use crate::error::DiscoveryError;
use crate::model::{DoctorSummary, Pathology};
use medir_types::City;
use std::fmt;

/// Which filter a search was triggered by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterKind {
    Pathology,
    City,
}

/// Receipt for a triggered search. Hand it back to [`ResultReconciler::complete`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchTicket {
    generation: u64,
    kind: FilterKind,
}

impl SearchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn kind(&self) -> FilterKind {
        self.kind
    }
}

/// What happened to a completed search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// A newer search (or a clear) happened after this one was triggered.
    Discarded,
}

/// Message shown when there is no doctor to list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EmptyState {
    /// No filter is active yet.
    Initial,
    PathologyOnly,
    CityOnly(City),
    Both(City),
}

impl fmt::Display for EmptyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmptyState::Initial => write!(
                f,
                "Search for doctors by location or pathology. Select a location or choose a \
                 pathology to see the available doctors."
            ),
            EmptyState::PathologyOnly => write!(f, "No doctors specialise in this pathology."),
            EmptyState::CityOnly(city) => write!(f, "No doctors in {city}."),
            EmptyState::Both(city) => {
                write!(f, "No doctors in {city} specialise in this pathology.")
            }
        }
    }
}

/// What the results area should render.
#[derive(Clone, Debug, PartialEq)]
pub enum ResultsView<'a> {
    Searching,
    Doctors(&'a [DoctorSummary]),
    /// Nothing to list; `EmptyState::Initial` when no filter has been applied.
    Empty(EmptyState),
}

#[derive(Clone, Debug, Default)]
pub struct ResultReconciler {
    doctors: Vec<DoctorSummary>,
    pathology: Option<Pathology>,
    city: Option<City>,
    latest: u64,
    /// Filter that triggered the latest search; what the list currently belongs to.
    current: Option<FilterKind>,
    searching: bool,
    error: Option<DiscoveryError>,
}

impl ResultReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `pathology` as the active pathology filter and stamps a new search.
    pub fn begin_pathology(&mut self, pathology: Pathology) -> SearchTicket {
        self.pathology = Some(pathology);
        self.begin(FilterKind::Pathology)
    }

    /// Marks `city` as the active city filter and stamps a new search.
    pub fn begin_city(&mut self, city: City) -> SearchTicket {
        self.city = Some(city);
        self.begin(FilterKind::City)
    }

    fn begin(&mut self, kind: FilterKind) -> SearchTicket {
        self.latest += 1;
        self.current = Some(kind);
        self.searching = true;
        self.error = None;
        SearchTicket {
            generation: self.latest,
            kind,
        }
    }

    /// Applies the outcome of the search identified by `ticket`, unless it was superseded.
    ///
    /// Success replaces the list; failure empties it and records the error.
    pub fn complete(
        &mut self,
        ticket: SearchTicket,
        outcome: Result<Vec<DoctorSummary>, DiscoveryError>,
    ) -> Completion {
        if ticket.generation != self.latest {
            tracing::warn!(
                "discarding stale {:?} search result (generation {} < {})",
                ticket.kind,
                ticket.generation,
                self.latest
            );
            return Completion::Discarded;
        }

        self.searching = false;
        match outcome {
            Ok(doctors) => {
                self.doctors = doctors;
                self.error = None;
            }
            Err(err) => {
                self.doctors.clear();
                self.error = Some(err);
            }
        }
        Completion::Applied
    }

    /// Drops the pathology filter. The city filter stays active but its lookup is not re-run.
    ///
    /// If the latest search was by pathology, it is discarded along with the displayed list and
    /// its error; a city search triggered after it is left alone.
    pub fn clear_pathology(&mut self) {
        self.pathology = None;
        self.reset_results(FilterKind::Pathology);
    }

    /// Drops the city filter. The pathology filter stays active but its lookup is not re-run.
    ///
    /// Mirror image of [`clear_pathology`](Self::clear_pathology).
    pub fn clear_city(&mut self) {
        self.city = None;
        self.reset_results(FilterKind::City);
    }

    fn reset_results(&mut self, cleared: FilterKind) {
        if self.current != Some(cleared) {
            return;
        }
        // Anything still in flight belongs to the filter being cleared.
        self.latest += 1;
        self.current = None;
        self.searching = false;
        self.doctors.clear();
        self.error = None;
    }

    pub fn doctors(&self) -> &[DoctorSummary] {
        &self.doctors
    }

    pub fn pathology(&self) -> Option<&Pathology> {
        self.pathology.as_ref()
    }

    pub fn city(&self) -> Option<&City> {
        self.city.as_ref()
    }

    pub fn is_searching(&self) -> bool {
        self.searching
    }

    pub fn error(&self) -> Option<&DiscoveryError> {
        self.error.as_ref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn empty_state(&self) -> EmptyState {
        match (&self.pathology, &self.city) {
            (None, None) => EmptyState::Initial,
            (Some(_), None) => EmptyState::PathologyOnly,
            (None, Some(city)) => EmptyState::CityOnly(city.clone()),
            (Some(_), Some(city)) => EmptyState::Both(city.clone()),
        }
    }

    pub fn view(&self) -> ResultsView<'_> {
        if self.searching {
            ResultsView::Searching
        } else if !self.doctors.is_empty() {
            ResultsView::Doctors(&self.doctors)
        } else {
            ResultsView::Empty(self.empty_state())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use medir_types::RecordId;

    fn doctor(id: &str) -> DoctorSummary {
        DoctorSummary {
            id: RecordId::new(id).unwrap(),
            first_name: "Ana".into(),
            last_name: id.into(),
            email: None,
            specialty: None,
            experience_description: None,
            profile_photo_url: None,
        }
    }

    fn pathology(id: &str) -> Pathology {
        Pathology {
            id: RecordId::new(id).unwrap(),
            name: format!("Pathology {id}"),
            code: None,
            description: None,
            created_at: None,
        }
    }

    fn city(name: &str) -> City {
        City::new(name).unwrap()
    }

    #[test]
    fn last_triggered_search_wins() {
        let mut results = ResultReconciler::new();
        let a = results.begin_pathology(pathology("A"));
        let b = results.begin_pathology(pathology("B"));

        assert_eq!(results.complete(b, Ok(vec![doctor("b1")])), Completion::Applied);
        assert_eq!(
            results.complete(a, Ok(vec![doctor("a1"), doctor("a2")])),
            Completion::Discarded
        );

        assert_eq!(results.doctors(), &[doctor("b1")]);
        assert_eq!(results.pathology().map(|p| p.id.as_str()), Some("B"));
    }

    #[test]
    fn city_result_replaces_pathology_result() {
        let mut results = ResultReconciler::new();
        let p = results.begin_pathology(pathology("A"));
        results.complete(p, Ok(vec![doctor("a1")]));

        let c = results.begin_city(city("Caracas"));
        results.complete(c, Ok(vec![doctor("c1"), doctor("c2")]));

        assert_eq!(results.doctors(), &[doctor("c1"), doctor("c2")]);
        assert_eq!(results.empty_state(), EmptyState::Both(city("Caracas")));
    }

    #[test]
    fn failure_clears_list_and_keeps_error() {
        let mut results = ResultReconciler::new();
        let first = results.begin_city(city("Caracas"));
        results.complete(first, Ok(vec![doctor("c1")]));

        let second = results.begin_city(city("Valencia"));
        let err = DiscoveryError::Fetch(FetchError::with_status(502, "Bad Gateway"));
        results.complete(second, Err(err.clone()));

        assert!(results.doctors().is_empty());
        assert_eq!(results.error(), Some(&err));
        results.dismiss_error();
        assert!(results.error().is_none());
    }

    #[test]
    fn clearing_pathology_discards_in_flight_search_and_keeps_city() {
        let mut results = ResultReconciler::new();
        let c = results.begin_city(city("Caracas"));
        results.complete(c, Ok(vec![doctor("c1")]));

        let p = results.begin_pathology(pathology("A"));
        results.clear_pathology();

        assert_eq!(results.complete(p, Ok(vec![doctor("a1")])), Completion::Discarded);
        assert!(results.doctors().is_empty());
        assert!(!results.is_searching());
        assert_eq!(results.empty_state(), EmptyState::CityOnly(city("Caracas")));
    }

    #[test]
    fn clearing_pathology_leaves_later_city_search_in_flight() {
        let mut results = ResultReconciler::new();
        let p = results.begin_pathology(pathology("A"));
        results.complete(p, Ok(vec![doctor("a1")]));

        let c = results.begin_city(city("Caracas"));
        results.clear_pathology();
        assert!(results.is_searching());

        assert_eq!(results.complete(c, Ok(vec![doctor("c1")])), Completion::Applied);
        assert_eq!(results.view(), ResultsView::Doctors(&[doctor("c1")]));
        assert_eq!(results.empty_state(), EmptyState::CityOnly(city("Caracas")));
    }

    #[test]
    fn clearing_city_discards_in_flight_city_search() {
        let mut results = ResultReconciler::new();
        let p = results.begin_pathology(pathology("A"));
        results.complete(p, Ok(vec![doctor("a1")]));

        let c = results.begin_city(city("Caracas"));
        results.clear_city();

        assert_eq!(results.complete(c, Ok(vec![doctor("c1")])), Completion::Discarded);
        assert_eq!(results.view(), ResultsView::Empty(EmptyState::PathologyOnly));
        assert!(results.city().is_none());
    }

    #[test]
    fn clearing_the_failed_filter_drops_its_error() {
        let mut results = ResultReconciler::new();
        let p = results.begin_pathology(pathology("A"));
        let err = DiscoveryError::Fetch(FetchError::with_status(500, "Internal Server Error"));
        results.complete(p, Err(err));
        assert!(results.error().is_some());

        results.clear_pathology();
        assert!(results.error().is_none());
        assert_eq!(results.view(), ResultsView::Empty(EmptyState::Initial));
    }

    #[test]
    fn view_reflects_searching_and_messages() {
        let mut results = ResultReconciler::new();
        assert_eq!(results.view(), ResultsView::Empty(EmptyState::Initial));

        let p = results.begin_pathology(pathology("A"));
        assert_eq!(results.view(), ResultsView::Searching);

        results.complete(p, Ok(Vec::new()));
        assert_eq!(results.view(), ResultsView::Empty(EmptyState::PathologyOnly));
    }

    #[test]
    fn empty_messages_are_tailored() {
        assert_eq!(
            EmptyState::PathologyOnly.to_string(),
            "No doctors specialise in this pathology."
        );
        assert_eq!(
            EmptyState::CityOnly(city("Maracaibo")).to_string(),
            "No doctors in Maracaibo."
        );
        assert_eq!(
            EmptyState::Both(city("Mérida")).to_string(),
            "No doctors in Mérida specialise in this pathology."
        );
        assert!(EmptyState::Initial.to_string().starts_with("Search for doctors"));
    }
}
