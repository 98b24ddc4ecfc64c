//! The signed-in user's bookmark set.
//!
//! The backend is authoritative for bookmarks; [`BookmarkStore`] holds the
//! plant ids bookmarked by the current user and is updated two ways:
//!
//! - wholesale, when a refresh for the current user completes (login) or when
//!   the user signs out;
//! - incrementally, through [`BookmarkStore::toggle`], after the caller has
//!   confirmed the corresponding backend mutation.
//!
//! Both paths run asynchronously relative to each other, so each carries a
//! ticket captured when the operation started:
//!
//! - a [`RefreshTicket`] only applies if no newer refresh has been issued and
//!   the owner has not changed since;
//! - a [`ToggleTicket`] only applies if the owner has not changed since; a
//!   toggle confirmed while a refresh is in flight is replayed on top of that
//!   refresh's result.

use std::collections::BTreeSet;

use crate::types::{PlantId, UserId};

/// Captured by [`BookmarkStore::begin_refresh`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct RefreshTicket {
    epoch: u64,
    seq: u64,
}

/// Captured by [`BookmarkStore::begin_toggle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct ToggleTicket {
    epoch: u64,
}

#[derive(Debug, Clone, Copy)]
struct Patch {
    plant: PlantId,
    was_bookmarked: bool,
}

/// Plant ids bookmarked by the current user.
#[derive(Debug, Default)]
pub struct BookmarkStore {
    ids: BTreeSet<PlantId>,
    owner: Option<UserId>,
    /// Bumped whenever the owner changes or the set is cleared.
    epoch: u64,
    issued_refreshes: u64,
    in_flight: Option<u64>,
    replay: Vec<Patch>,
}

impl BookmarkStore {
    /// Create an empty store with no owner.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `plant` is bookmarked.
    #[must_use]
    pub fn contains(&self, plant: PlantId) -> bool {
        self.ids.contains(&plant)
    }

    /// Bookmarked plant ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = PlantId> + '_ {
        self.ids.iter().copied()
    }

    /// Number of bookmarked plants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// User whose bookmarks the set mirrors.
    #[must_use]
    pub const fn owner(&self) -> Option<&UserId> {
        self.owner.as_ref()
    }

    /// Whether a refresh has been issued and not yet completed.
    #[must_use]
    pub const fn is_refreshing(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Drop every bookmark and the owner (sign-out).
    ///
    /// Outstanding refresh and toggle tickets become stale.
    pub fn clear(&mut self) {
        self.ids.clear();
        self.owner = None;
        self.epoch += 1;
        self.in_flight = None;
        self.replay.clear();
    }

    /// Start a refresh of `owner`'s bookmarks.
    ///
    /// Switching to a different owner empties the set immediately so the
    /// previous user's bookmarks are never shown for the new one.
    pub fn begin_refresh(&mut self, owner: &UserId) -> RefreshTicket {
        if self.owner.as_ref() != Some(owner) {
            self.clear();
            self.owner = Some(owner.clone());
        }

        self.issued_refreshes += 1;
        self.in_flight = Some(self.issued_refreshes);
        self.replay.clear();

        RefreshTicket {
            epoch: self.epoch,
            seq: self.issued_refreshes,
        }
    }

    /// Replace the set with a fetched list.
    ///
    /// Returns `false` (and changes nothing) when the ticket is stale.
    pub fn complete_refresh(
        &mut self,
        ticket: RefreshTicket,
        fetched: impl IntoIterator<Item = PlantId>,
    ) -> bool {
        if !self.is_current(ticket) {
            return false;
        }

        self.ids = fetched.into_iter().collect();
        for patch in std::mem::take(&mut self.replay) {
            self.toggle(patch.plant, patch.was_bookmarked);
        }
        self.in_flight = None;
        true
    }

    /// Record a failed refresh: the set becomes empty.
    ///
    /// No partial state is retained and a network failure is not
    /// distinguished from an empty result. Returns `false` when the ticket
    /// is stale.
    pub fn fail_refresh(&mut self, ticket: RefreshTicket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }

        self.ids.clear();
        self.replay.clear();
        self.in_flight = None;
        true
    }

    /// Capture the state a toggle starts from.
    pub const fn begin_toggle(&self) -> ToggleTicket {
        ToggleTicket { epoch: self.epoch }
    }

    /// Apply a confirmed toggle unless the owner changed since `ticket`.
    pub fn commit_toggle(
        &mut self,
        ticket: ToggleTicket,
        plant: PlantId,
        was_bookmarked: bool,
    ) -> bool {
        if ticket.epoch != self.epoch {
            return false;
        }

        self.toggle(plant, was_bookmarked);
        if self.in_flight.is_some() {
            self.replay.push(Patch {
                plant,
                was_bookmarked,
            });
        }
        true
    }

    /// Local patch: remove `plant` if it was bookmarked, otherwise add it.
    ///
    /// Performs no I/O and cannot fail.
    pub fn toggle(&mut self, plant: PlantId, was_bookmarked: bool) {
        if was_bookmarked {
            self.ids.remove(&plant);
        } else {
            self.ids.insert(plant);
        }
    }

    fn is_current(&self, ticket: RefreshTicket) -> bool {
        ticket.epoch == self.epoch && self.in_flight == Some(ticket.seq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[i32]) -> Vec<PlantId> {
        values.iter().copied().map(PlantId::new).collect()
    }

    fn collect(store: &BookmarkStore) -> Vec<i32> {
        store.ids().map(|id| id.as_i32()).collect()
    }

    fn signed_in(user: &str, values: &[i32]) -> BookmarkStore {
        let mut store = BookmarkStore::new();
        let ticket = store.begin_refresh(&UserId::new(user));
        assert!(store.complete_refresh(ticket, ids(values)));
        store
    }

    #[test]
    fn test_toggle_sequence_matches_ordered_application() {
        let cases: &[(&[i32], &[(i32, bool)], &[i32])] = &[
            (&[], &[(1, false), (2, false), (1, true)], &[2]),
            (&[3], &[(3, true), (3, true)], &[]),
            (&[4, 5], &[(6, false), (6, false), (4, true)], &[5, 6]),
            (&[1], &[(2, true)], &[1]),
        ];

        for (initial, toggles, expected) in cases {
            let mut store = signed_in("u1", initial);
            for &(plant, was) in *toggles {
                store.toggle(PlantId::new(plant), was);
            }
            assert_eq!(collect(&store), *expected, "initial {initial:?}");
        }
    }

    #[test]
    fn test_refresh_replaces_set() {
        let store = signed_in("u1", &[3, 7]);
        assert_eq!(collect(&store), vec![3, 7]);
        assert_eq!(store.owner(), Some(&UserId::new("u1")));
        assert!(!store.is_refreshing());
    }

    #[test]
    fn test_failed_refresh_empties_set() {
        let mut store = signed_in("u1", &[3, 7]);
        let ticket = store.begin_refresh(&UserId::new("u1"));
        assert!(store.fail_refresh(ticket));
        assert!(store.is_empty());
    }

    #[test]
    fn test_older_refresh_is_discarded() {
        let mut store = BookmarkStore::new();
        let user = UserId::new("u1");
        let first = store.begin_refresh(&user);
        let second = store.begin_refresh(&user);

        assert!(store.complete_refresh(second, ids(&[9])));
        assert!(!store.complete_refresh(first, ids(&[1, 2])));
        assert_eq!(collect(&store), vec![9]);
    }

    #[test]
    fn test_clear_invalidates_in_flight_refresh() {
        let mut store = BookmarkStore::new();
        let ticket = store.begin_refresh(&UserId::new("u1"));
        store.clear();

        assert!(!store.complete_refresh(ticket, ids(&[1])));
        assert!(store.is_empty());
        assert_eq!(store.owner(), None);
    }

    #[test]
    fn test_toggle_after_sign_out_does_not_resurrect() {
        let mut store = signed_in("u1", &[1]);
        let ticket = store.begin_toggle();

        store.clear();
        let refresh = store.begin_refresh(&UserId::new("u2"));
        assert!(store.complete_refresh(refresh, ids(&[8])));

        assert!(!store.commit_toggle(ticket, PlantId::new(5), false));
        assert_eq!(collect(&store), vec![8]);
    }

    #[test]
    fn test_toggle_during_refresh_is_replayed() {
        let mut store = signed_in("u1", &[1]);
        let refresh = store.begin_refresh(&UserId::new("u1"));

        let toggle = store.begin_toggle();
        assert!(store.commit_toggle(toggle, PlantId::new(5), false));

        // The refresh raced the create and did not see plant 5.
        assert!(store.complete_refresh(refresh, ids(&[1])));
        assert_eq!(collect(&store), vec![1, 5]);
    }

    #[test]
    fn test_owner_change_empties_before_fetch() {
        let mut store = signed_in("u1", &[1, 2]);
        let _ticket = store.begin_refresh(&UserId::new("u2"));
        assert!(store.is_empty());
        assert!(store.is_refreshing());
    }
}
