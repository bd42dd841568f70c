//! Pathology combobox state machine.
//!
//! The combobox is a single immutable [`SelectorState`] value. Every user interaction is a
//! [`SelectorEvent`]; [`SelectorState::reduce`] returns the next state together with the
//! [`SelectorEffect`]s the caller must carry out (start a search, clear results, refocus).
//!
//! ## Transitions
//!
//! ```text
//! Closed  --input/focus/arrow-->  Open(0)
//! Open(h) --arrow down/up------>  Open(h ± 1), clamped to the candidate list
//! Open(h) --enter (candidates)->  Closed, input = name, Search(candidate h)
//! Open(h) --escape/outside----->  Closed (committed selection untouched)
//! any     --clear-------------->  Closed, empty input, no selection, ClearResults + FocusInput
//! ```
//!
//! While the catalog is not loaded the input is disabled: only `Clear`, `Escape` and
//! `ClickOutside` have any effect.

use crate::catalog::PathologyCatalog;
use crate::model::Pathology;

/// Dropdown visibility and the highlighted row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Dropdown {
    #[default]
    Closed,
    Open { highlight: usize },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectorEvent {
    /// The text in the input changed to the given value.
    InputChanged(String),
    Focus,
    ArrowDown,
    ArrowUp,
    Enter,
    Escape,
    /// Pointer interaction outside the input and the dropdown.
    ClickOutside,
    /// A candidate row was clicked.
    Pick(usize),
    /// The clear button was pressed.
    Clear,
}

/// Work the caller must perform after a transition.
#[derive(Clone, Debug, PartialEq)]
pub enum SelectorEffect {
    /// Look up doctors for this pathology.
    Search(Pathology),
    /// Drop the displayed doctor list and the pathology filter.
    ClearResults,
    /// Move keyboard focus back to the input.
    FocusInput,
}

/// Result of one reducer step.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub state: SelectorState,
    pub effects: Vec<SelectorEffect>,
}

impl Transition {
    fn quiet(state: SelectorState) -> Self {
        Self {
            state,
            effects: Vec::new(),
        }
    }
}

/// Everything the combobox knows.
///
/// Invariant: when open, `highlight` is within `[0, max(0, candidates - 1)]` for the candidates
/// filtered from the current input.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SelectorState {
    input: String,
    dropdown: Dropdown,
    committed: Option<Pathology>,
}

impl SelectorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn dropdown(&self) -> Dropdown {
        self.dropdown
    }

    pub fn is_open(&self) -> bool {
        matches!(self.dropdown, Dropdown::Open { .. })
    }

    /// Highlighted row index, if the dropdown is open.
    pub fn highlight(&self) -> Option<usize> {
        match self.dropdown {
            Dropdown::Open { highlight } => Some(highlight),
            Dropdown::Closed => None,
        }
    }

    /// The pathology most recently committed with Enter or a click.
    pub fn committed(&self) -> Option<&Pathology> {
        self.committed.as_ref()
    }

    /// Candidates for the current input.
    pub fn candidates<'c>(&self, catalog: &'c PathologyCatalog) -> Vec<&'c Pathology> {
        catalog.filter(&self.input)
    }

    /// Computes the next state for `event`.
    pub fn reduce(self, event: SelectorEvent, catalog: &PathologyCatalog) -> Transition {
        let enabled = catalog.is_ready();

        match event {
            SelectorEvent::Clear => Transition {
                state: SelectorState::default(),
                effects: vec![SelectorEffect::ClearResults, SelectorEffect::FocusInput],
            },
            SelectorEvent::Escape | SelectorEvent::ClickOutside => Transition::quiet(Self {
                dropdown: Dropdown::Closed,
                ..self
            }),
            _ if !enabled => Transition::quiet(self),
            SelectorEvent::InputChanged(text) => {
                let mut effects = Vec::new();
                let committed = if text.is_empty() {
                    effects.push(SelectorEffect::ClearResults);
                    None
                } else {
                    self.committed
                };
                Transition {
                    state: Self {
                        input: text,
                        dropdown: Dropdown::Open { highlight: 0 },
                        committed,
                    },
                    effects,
                }
            }
            SelectorEvent::Focus => {
                if self.is_open() {
                    Transition::quiet(self)
                } else {
                    Transition::quiet(self.opened_at(0))
                }
            }
            SelectorEvent::ArrowDown | SelectorEvent::ArrowUp => {
                let Dropdown::Open { highlight } = self.dropdown else {
                    return Transition::quiet(self.opened_at(0));
                };
                let last = self.candidates(catalog).len().saturating_sub(1);
                let next = if event == SelectorEvent::ArrowDown {
                    highlight.saturating_add(1)
                } else {
                    highlight.saturating_sub(1)
                };
                Transition::quiet(self.opened_at(next.min(last)))
            }
            SelectorEvent::Enter => match self.dropdown {
                Dropdown::Open { highlight } => self.commit_index(highlight, catalog),
                Dropdown::Closed => Transition::quiet(self),
            },
            SelectorEvent::Pick(index) => {
                if self.is_open() {
                    self.commit_index(index, catalog)
                } else {
                    Transition::quiet(self)
                }
            }
        }
    }

    fn opened_at(self, highlight: usize) -> Self {
        Self {
            dropdown: Dropdown::Open { highlight },
            ..self
        }
    }

    fn commit_index(self, index: usize, catalog: &PathologyCatalog) -> Transition {
        let Some(chosen) = self.candidates(catalog).get(index).map(|p| (*p).clone()) else {
            return Transition::quiet(self);
        };

        tracing::debug!("pathology committed: {} ({})", chosen.name, chosen.id);
        Transition {
            state: Self {
                input: chosen.display_name().to_string(),
                dropdown: Dropdown::Closed,
                committed: Some(chosen.clone()),
            },
            effects: vec![SelectorEffect::Search(chosen)],
        }
    }
}

#[cfg(test)]
mod tests_support {
    use super::*;
    use medir_types::RecordId;

    pub(super) fn pathology(id: &str, name: &str, code: &str) -> Pathology {
        Pathology {
            id: RecordId::new(id).unwrap(),
            name: name.into(),
            code: Some(code.into()),
            description: None,
            created_at: None,
        }
    }

    pub(super) fn catalog() -> PathologyCatalog {
        PathologyCatalog::from_loaded(vec![
            pathology("2", "Asbestosis", "J61"),
            pathology("1", "Asma", "J45"),
            pathology("3", "Bronquitis", "J40"),
        ])
    }
}


#[cfg(test)]
mod proptests {
    use super::tests_support::catalog;
    use super::*;
    use proptest::prelude::*;

    fn arb_event() -> impl Strategy<Value = SelectorEvent> {
        prop_oneof![
            "[a-zA-Z0-9 ]{0,4}".prop_map(SelectorEvent::InputChanged),
            Just(SelectorEvent::Focus),
            Just(SelectorEvent::ArrowDown),
            Just(SelectorEvent::ArrowUp),
            Just(SelectorEvent::Enter),
            Just(SelectorEvent::Escape),
            Just(SelectorEvent::ClickOutside),
            (0..5usize).prop_map(SelectorEvent::Pick),
            Just(SelectorEvent::Clear),
        ]
    }

    proptest! {
        #[test]
        fn highlight_stays_within_candidates(
            events in prop::collection::vec(arb_event(), 0..64)
        ) {
            let catalog = catalog();
            let mut state = SelectorState::new();
            for event in events {
                state = state.reduce(event, &catalog).state;
                if let Some(highlight) = state.highlight() {
                    let len = state.candidates(&catalog).len();
                    prop_assert!(highlight <= len.saturating_sub(1), "{} / {}", highlight, len);
                }
            }
        }

        #[test]
        fn commits_only_offered_candidates(
            events in prop::collection::vec(arb_event(), 0..64)
        ) {
            let catalog = catalog();
            let mut state = SelectorState::new();
            for event in events {
                let offered: Vec<Pathology> =
                    state.candidates(&catalog).into_iter().cloned().collect();
                let transition = state.reduce(event, &catalog);
                for effect in &transition.effects {
                    if let SelectorEffect::Search(chosen) = effect {
                        prop_assert!(offered.contains(chosen));
                        prop_assert_eq!(transition.state.input(), chosen.display_name());
                    }
                }
                state = transition.state;
            }
        }
    }
}
