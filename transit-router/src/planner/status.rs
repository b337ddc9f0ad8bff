//! Per-stop status model shared by the scans.

use std::cmp::Ordering;

use crate::domain::{ConnectionId, StopId, TripRun};

use super::legs::LegId;

/// Best known way to (forward) or from (backward) a stop.
///
/// Forward statuses hold absolute seconds since the reference midnight;
/// backward statuses hold the raw egress cost in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopStatus {
    pub seconds: i64,
    /// Vehicles boarded so far.
    pub transfers: i32,
    /// Soft penalty in seconds, fixed when the status was seeded.
    pub lazyness: i64,
    /// The trip run the traveller arrived on, if any.
    pub trip: Option<TripRun>,
    /// The connection that reached this stop; `None` for access and egress.
    pub connection: Option<ConnectionId>,
    pub(crate) leg: Option<LegId>,
}

impl StopStatus {
    /// Returned for stops a scan never touched.
    pub const UNREACHED: StopStatus = StopStatus {
        seconds: -1,
        transfers: -1,
        lazyness: 0,
        trip: None,
        connection: None,
        leg: None,
    };

    /// A status reached directly by an access or egress search.
    pub fn seed(seconds: i64, lazyness: i64) -> Self {
        Self {
            seconds,
            transfers: 0,
            lazyness,
            trip: None,
            connection: None,
            leg: None,
        }
    }

    pub fn is_reached(&self) -> bool {
        self.transfers >= 0
    }

    /// Time figure used for comparison: seconds plus lazyness.
    pub fn weight(&self) -> i64 {
        self.seconds + self.lazyness
    }
}

/// Orders two candidate statuses for the same stop; `Less` is better.
pub type StatusComparator = fn(&StopStatus, &StopStatus) -> Ordering;

/// Default comparator: lower weight wins, then fewer transfers.
pub fn compare_weight_then_transfers(a: &StopStatus, b: &StopStatus) -> Ordering {
    a.weight()
        .cmp(&b.weight())
        .then(a.transfers.cmp(&b.transfers))
}

/// Fewer transfers wins, then lower weight.
pub fn compare_transfers_then_weight(a: &StopStatus, b: &StopStatus) -> Ordering {
    a.transfers
        .cmp(&b.transfers)
        .then(a.weight().cmp(&b.weight()))
}

/// Maps an access or egress cost to a penalty, both in seconds.
///
/// Implementations should be monotonic. The penalty is applied once, when a
/// stop is seeded, and carried unchanged by everything reached from there.
pub trait LazynessPenalty {
    fn penalty(&self, cost_seconds: f64) -> f64;
}

/// No bias.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPenalty;

impl LazynessPenalty for NoPenalty {
    fn penalty(&self, _cost_seconds: f64) -> f64 {
        0.0
    }
}

/// Penalty proportional to the walking cost.
#[derive(Debug, Clone, Copy)]
pub struct LinearPenalty {
    pub factor: f64,
}

impl LazynessPenalty for LinearPenalty {
    fn penalty(&self, cost_seconds: f64) -> f64 {
        cost_seconds * self.factor
    }
}

impl<F> LazynessPenalty for F
where
    F: Fn(f64) -> f64,
{
    fn penalty(&self, cost_seconds: f64) -> f64 {
        self(cost_seconds)
    }
}

/// Whole-second penalty: rounded up, never negative.
pub(crate) fn penalty_seconds(penalty: &dyn LazynessPenalty, cost_seconds: f64) -> i64 {
    let value = penalty.penalty(cost_seconds);
    if value.is_finite() && value > 0.0 {
        value.ceil() as i64
    } else {
        0
    }
}

/// Whole-second access cost, rounded up.
pub(crate) fn cost_seconds(cost: f64) -> i64 {
    if cost.is_finite() && cost > 0.0 {
        cost.ceil() as i64
    } else {
        0
    }
}

/// Lifecycle of one stop's entry in a [`StatusTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Unset,
    /// Set by an access or egress search.
    Seeded,
    /// Improved by at least one connection.
    Reached,
}

#[derive(Debug, Clone)]
enum Slot<T> {
    Unset,
    Seeded(T),
    Reached(T),
}

/// Flat table of per-stop values indexed by stop id.
#[derive(Debug, Clone)]
pub struct StatusTable<T> {
    slots: Vec<Slot<T>>,
}

impl<T> Default for StatusTable<T> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<T> StatusTable<T> {
    /// A table preallocated for `stop_count` stops. It grows on demand.
    pub fn with_stops(stop_count: usize) -> Self {
        let mut slots = Vec::with_capacity(stop_count);
        slots.resize_with(stop_count, || Slot::Unset);
        Self { slots }
    }

    pub fn get(&self, stop: StopId) -> Option<&T> {
        match self.slots.get(stop.index()) {
            Some(Slot::Seeded(value) | Slot::Reached(value)) => Some(value),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, stop: StopId) -> Option<&mut T> {
        match self.slots.get_mut(stop.index()) {
            Some(Slot::Seeded(value) | Slot::Reached(value)) => Some(value),
            _ => None,
        }
    }

    pub fn state(&self, stop: StopId) -> SlotState {
        match self.slots.get(stop.index()) {
            Some(Slot::Seeded(_)) => SlotState::Seeded,
            Some(Slot::Reached(_)) => SlotState::Reached,
            _ => SlotState::Unset,
        }
    }

    /// Seed an unset stop. Returns false, leaving the table unchanged, if
    /// the stop already has a value.
    pub fn seed(&mut self, stop: StopId, value: T) -> bool {
        let slot = self.slot_mut(stop);
        if !matches!(slot, Slot::Unset) {
            return false;
        }
        *slot = Slot::Seeded(value);
        true
    }

    /// Store a value reached by a connection, replacing any previous one.
    pub fn reach(&mut self, stop: StopId, value: T) {
        *self.slot_mut(stop) = Slot::Reached(value);
    }

    /// Promote a seeded value that was updated in place.
    pub fn mark_reached(&mut self, stop: StopId) {
        let slot = self.slot_mut(stop);
        *slot = match std::mem::replace(slot, Slot::Unset) {
            Slot::Seeded(value) => Slot::Reached(value),
            other => other,
        };
    }

    /// Stops with a value, in id order.
    pub fn iter(&self) -> impl Iterator<Item = (StopId, &T)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| match slot {
                Slot::Seeded(value) | Slot::Reached(value) => Some((StopId(i as u32), value)),
                Slot::Unset => None,
            })
    }

    fn slot_mut(&mut self, stop: StopId) -> &mut Slot<T> {
        let index = stop.index();
        if self.slots.len() <= index {
            self.slots.resize_with(index + 1, || Slot::Unset);
        }
        &mut self.slots[index]
    }
}
