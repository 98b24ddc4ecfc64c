//! Plant list state: the search box, the fetch lifecycle, and the
//! bookmarked-only filter.

use core::fmt;

use crate::bookmarks::BookmarkStore;
use crate::plant::Plant;

/// Shown when the list fetch fails.
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load plants. Please try again later.";

/// Shown when the visible list is empty.
pub const NO_MATCHES_MESSAGE: &str = "No plants found matching your criteria.";

/// A submitted search term. Empty means "all plants".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SearchTerm(String);

impl SearchTerm {
    /// Build a term from raw input, trimming surrounding whitespace.
    #[must_use]
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_owned())
    }

    /// The unfiltered term.
    #[must_use]
    pub const fn all() -> Self {
        Self(String::new())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value for the backend's `q` parameter, `None` for an unfiltered list.
    #[must_use]
    pub fn as_query(&self) -> Option<&str> {
        (!self.0.is_empty()).then_some(self.0.as_str())
    }
}

impl fmt::Display for SearchTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The search input and the last term actually submitted.
///
/// Typing never fetches. Submitting does, and so does clearing the input
/// while a non-empty term is active.
#[derive(Debug, Clone, Default)]
pub struct SearchBox {
    input: String,
    submitted: SearchTerm,
}

impl SearchBox {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current contents of the input.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    /// The term driving the list.
    #[must_use]
    pub const fn submitted(&self) -> &SearchTerm {
        &self.submitted
    }

    /// Replace the input text.
    ///
    /// Returns the term to fetch when the edit cleared an active search.
    pub fn edit(&mut self, text: &str) -> Option<SearchTerm> {
        text.clone_into(&mut self.input);
        if text.trim().is_empty() && !self.submitted.is_empty() {
            self.submitted = SearchTerm::all();
            return Some(SearchTerm::all());
        }
        None
    }

    /// Submit the current input and return the term to fetch.
    pub fn submit(&mut self) -> SearchTerm {
        self.submitted = SearchTerm::new(&self.input);
        self.submitted.clone()
    }
}

/// Where the list fetch stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListPhase {
    Loading,
    Loaded(Vec<Plant>),
    Failed,
}

/// Captured by [`PlantList::begin_fetch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct FetchTicket(u64);

/// Fetched plants for the most recently requested term.
///
/// Only the latest fetch may settle the list; an older fetch that completes
/// late is ignored.
#[derive(Debug, Clone)]
pub struct PlantList {
    term: SearchTerm,
    phase: ListPhase,
    issued: u64,
}

impl Default for PlantList {
    fn default() -> Self {
        Self {
            term: SearchTerm::all(),
            phase: ListPhase::Loading,
            issued: 0,
        }
    }
}

impl PlantList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Term of the latest fetch.
    #[must_use]
    pub const fn term(&self) -> &SearchTerm {
        &self.term
    }

    #[must_use]
    pub const fn phase(&self) -> &ListPhase {
        &self.phase
    }

    /// Start fetching `term`, superseding any fetch in flight.
    pub fn begin_fetch(&mut self, term: SearchTerm) -> FetchTicket {
        self.issued += 1;
        self.term = term;
        self.phase = ListPhase::Loading;
        FetchTicket(self.issued)
    }

    /// Whether `ticket` belongs to the latest fetch.
    #[must_use]
    pub const fn is_current(&self, ticket: FetchTicket) -> bool {
        ticket.0 == self.issued
    }

    /// Settle the list with fetched plants. Stale tickets are ignored.
    pub fn complete(&mut self, ticket: FetchTicket, plants: Vec<Plant>) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.phase = ListPhase::Loaded(plants);
        true
    }

    /// Settle the list as failed. Stale tickets are ignored.
    pub fn fail(&mut self, ticket: FetchTicket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.phase = ListPhase::Failed;
        true
    }

    /// Plants to render.
    ///
    /// `bookmarks` is the signed-in user's set, or `None` when nobody is
    /// signed in; the bookmarked-only filter applies only with a user.
    #[must_use]
    pub fn visible(&self, bookmarks: Option<&BookmarkStore>, bookmarked_only: bool) -> Vec<&Plant> {
        let ListPhase::Loaded(plants) = &self.phase else {
            return Vec::new();
        };

        match bookmarks {
            Some(store) if bookmarked_only => plants
                .iter()
                .filter(|plant| store.contains(plant.id))
                .collect(),
            _ => plants.iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plant::sample;
    use crate::types::{PlantId, UserId};

    fn store_with(values: &[i32]) -> BookmarkStore {
        let mut store = BookmarkStore::new();
        let ticket = store.begin_refresh(&UserId::new("u1"));
        store.complete_refresh(ticket, values.iter().copied().map(PlantId::new));
        store
    }

    #[test]
    fn test_typing_does_not_fetch() {
        let mut search = SearchBox::new();
        assert_eq!(search.edit("alo"), None);
        assert_eq!(search.edit("aloe"), None);
        assert!(search.submitted().is_empty());
    }

    #[test]
    fn test_submit_trims_term() {
        let mut search = SearchBox::new();
        search.edit("  aloe ");
        assert_eq!(search.submit().as_str(), "aloe");
        assert_eq!(search.input(), "  aloe ");
    }

    #[test]
    fn test_clearing_input_resets_submitted_term() {
        let mut search = SearchBox::new();
        search.edit("neem");
        search.submit();

        assert_eq!(search.edit(""), Some(SearchTerm::all()));
        assert!(search.submitted().is_empty());
        // Already unfiltered: nothing more to fetch.
        assert_eq!(search.edit(""), None);
    }

    #[test]
    fn test_last_fetch_wins() {
        let mut list = PlantList::new();
        let aloe = list.begin_fetch(SearchTerm::new("aloe"));
        let neem = list.begin_fetch(SearchTerm::new("neem"));

        assert!(list.complete(neem, vec![sample(2, "Neem")]));
        assert!(!list.complete(aloe, vec![sample(1, "Aloe")]));
        assert!(!list.fail(aloe));

        assert_eq!(list.term().as_str(), "neem");
        let names: Vec<_> = list.visible(None, false).iter().map(|p| p.display_name()).collect();
        assert_eq!(names, vec!["Neem"]);
    }

    #[test]
    fn test_failed_fetch() {
        let mut list = PlantList::new();
        let ticket = list.begin_fetch(SearchTerm::all());
        assert!(list.fail(ticket));
        assert_eq!(list.phase(), &ListPhase::Failed);
        assert!(list.visible(None, false).is_empty());
    }

    #[test]
    fn test_bookmarked_only_requires_user() {
        let mut list = PlantList::new();
        let ticket = list.begin_fetch(SearchTerm::all());
        list.complete(ticket, vec![sample(1, "Aloe"), sample(2, "Neem"), sample(3, "Tulsi")]);

        let store = store_with(&[3]);
        let filtered: Vec<_> = list.visible(Some(&store), true).iter().map(|p| p.id).collect();
        assert_eq!(filtered, vec![PlantId::new(3)]);

        assert_eq!(list.visible(None, true).len(), 3);
        assert_eq!(list.visible(Some(&store), false).len(), 3);
    }

    #[test]
    fn test_query_value() {
        assert_eq!(SearchTerm::new("  ").as_query(), None);
        assert_eq!(SearchTerm::new("tulsi").as_query(), Some("tulsi"));
    }
}
