//! Multi-criterion profiles and Pareto frontiers.

use crate::domain::{ConnectionId, TripRun};

use super::legs::LegId;

/// Two criteria to minimize: transfers and a time figure.
pub trait Criteria {
    fn transfers(&self) -> i32;
    fn weight(&self) -> i64;

    /// At least as good on both criteria and strictly better on one.
    fn dominates(&self, other: &Self) -> bool {
        self.transfers() <= other.transfers()
            && self.weight() <= other.weight()
            && (self.transfers() < other.transfers() || self.weight() < other.weight())
    }
}

/// One non-dominated way to reach a stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Profile {
    /// Absolute seconds since the reference midnight.
    pub seconds: i64,
    pub transfers: i32,
    pub lazyness: i64,
    pub trip: Option<TripRun>,
    /// The connection that reached this stop; `None` for access.
    pub connection: Option<ConnectionId>,
    /// The connection taken before `connection` on this profile's chain.
    pub previous_connection: Option<ConnectionId>,
    pub(crate) leg: Option<LegId>,
}

impl Profile {
    /// A profile reached directly by the access search.
    pub fn seed(seconds: i64, lazyness: i64) -> Self {
        Self {
            seconds,
            transfers: 0,
            lazyness,
            trip: None,
            connection: None,
            previous_connection: None,
            leg: None,
        }
    }
}

impl Criteria for Profile {
    fn transfers(&self) -> i32 {
        self.transfers
    }

    fn weight(&self) -> i64 {
        self.seconds + self.lazyness
    }
}

/// Entries none of which dominates another.
///
/// Kept sorted by transfers ascending. Since no entry dominates another,
/// transfer counts are distinct and weights strictly decrease along the
/// list, so the last entry is always the one with the lowest weight.
#[derive(Debug, Clone)]
pub struct ProfileFrontier<T = Profile> {
    entries: Vec<T>,
}

impl<T> Default for ProfileFrontier<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T: Criteria> ProfileFrontier<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A frontier holding one entry.
    pub fn with(entry: T) -> Self {
        Self {
            entries: vec![entry],
        }
    }

    /// Insert `candidate` unless an entry is at least as good on both
    /// criteria. Entries the candidate dominates are removed.
    ///
    /// Returns whether the frontier changed.
    pub fn try_add(&mut self, candidate: T) -> bool {
        let bounded = self.entries.iter().any(|e| {
            e.transfers() <= candidate.transfers() && e.weight() <= candidate.weight()
        });
        if bounded {
            return false;
        }

        self.entries.retain(|e| !candidate.dominates(e));
        let at = self
            .entries
            .partition_point(|e| e.transfers() < candidate.transfers());
        self.entries.insert(at, candidate);
        true
    }

    /// The entry with the lowest weight.
    pub fn best(&self) -> Option<&T> {
        self.entries.last()
    }

    /// The lowest weight among entries with at most `transfers` transfers.
    pub fn best_within(&self, transfers: i32) -> Option<i64> {
        self.entries
            .iter()
            .take_while(|e| e.transfers() <= transfers)
            .last()
            .map(|e| e.weight())
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(seconds: i64, transfers: i32) -> Profile {
        Profile {
            transfers,
            ..Profile::seed(seconds, 0)
        }
    }

    fn points(frontier: &ProfileFrontier) -> Vec<(i32, i64)> {
        frontier.iter().map(|p| (p.transfers, p.seconds)).collect()
    }

    #[test]
    fn dominance() {
        assert!(profile(100, 1).dominates(&profile(200, 1)));
        assert!(profile(100, 1).dominates(&profile(100, 2)));
        assert!(!profile(100, 1).dominates(&profile(100, 1)));
        assert!(!profile(100, 2).dominates(&profile(200, 1)));
    }

    #[test]
    fn keeps_trade_offs() {
        let mut frontier = ProfileFrontier::new();
        assert!(frontier.try_add(profile(3_000, 1)));
        assert!(frontier.try_add(profile(2_000, 2)));
        assert_eq!(points(&frontier), vec![(1, 3_000), (2, 2_000)]);
        assert_eq!(frontier.best().map(|p| p.seconds), Some(2_000));
    }

    #[test]
    fn rejects_dominated_and_equal() {
        let mut frontier = ProfileFrontier::with(profile(2_000, 1));
        assert!(!frontier.try_add(profile(2_500, 1)));
        assert!(!frontier.try_add(profile(2_000, 1)));
        assert!(!frontier.try_add(profile(2_000, 3)));
        assert_eq!(frontier.len(), 1);
    }

    #[test]
    fn removes_dominated_entries() {
        let mut frontier = ProfileFrontier::new();
        frontier.try_add(profile(3_000, 1));
        frontier.try_add(profile(2_500, 2));
        frontier.try_add(profile(2_000, 3));

        assert!(frontier.try_add(profile(2_400, 1)));
        assert_eq!(points(&frontier), vec![(1, 2_400), (3, 2_000)]);
    }

    #[test]
    fn inserts_in_transfer_order() {
        let mut frontier = ProfileFrontier::new();
        frontier.try_add(profile(2_000, 3));
        frontier.try_add(profile(3_000, 1));
        frontier.try_add(profile(2_500, 2));
        assert_eq!(points(&frontier), vec![(1, 3_000), (2, 2_500), (3, 2_000)]);
    }

    #[test]
    fn best_within_transfer_limit() {
        let mut frontier = ProfileFrontier::new();
        frontier.try_add(profile(3_000, 1));
        frontier.try_add(profile(2_000, 3));

        assert_eq!(frontier.best_within(0), None);
        assert_eq!(frontier.best_within(1), Some(3_000));
        assert_eq!(frontier.best_within(2), Some(3_000));
        assert_eq!(frontier.best_within(5), Some(2_000));
    }

    #[test]
    fn lazyness_is_part_of_weight() {
        let mut frontier = ProfileFrontier::with(Profile::seed(1_000, 500));
        assert!(frontier.try_add(profile(1_200, 0)));
        assert_eq!(frontier.len(), 1);
        assert_eq!(frontier.best().map(|p| p.lazyness), Some(0));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Whatever the insertion order, no entry dominates another and
        /// every rejected candidate is bounded by some entry.
        #[test]
        fn frontier_stays_non_dominated(
            candidates in prop::collection::vec((0i64..5_000, 0i32..6), 0..60),
        ) {
            let mut frontier = ProfileFrontier::new();
            for (seconds, transfers) in &candidates {
                frontier.try_add(Profile { transfers: *transfers, ..Profile::seed(*seconds, 0) });
            }

            let entries = frontier.as_slice();
            for a in entries {
                for b in entries {
                    if a != b {
                        prop_assert!(!a.dominates(b));
                    }
                }
            }
            for pair in entries.windows(2) {
                prop_assert!(pair[0].transfers < pair[1].transfers);
                prop_assert!(pair[0].weight() > pair[1].weight());
            }
            for (seconds, transfers) in &candidates {
                let covered = entries
                    .iter()
                    .any(|e| e.transfers <= *transfers && e.weight() <= *seconds);
                prop_assert!(covered);
            }
        }
    }
}
