//! Leg arena and on-board labels.
//!
//! Every time a scan boards a vehicle it records a leg: the boarding
//! connection, the scan day, and where the traveller came from. Statuses and
//! profiles point at the leg they are riding, so reconstruction never
//! depends on a stop's status surviving until the end of the scan.

use crate::domain::ConnectionId;

/// Index of a leg in a [`LegArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LegId(u32);

/// How the traveller reached a leg's boarding stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LegOrigin {
    /// Straight from the access search, arriving at `arrival` (absolute
    /// seconds).
    Access { arrival: i64 },
    /// By alighting from an earlier leg at connection `alight`.
    Transfer { alight: ConnectionId, leg: LegId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LegRecord {
    pub board: ConnectionId,
    pub day: i32,
    pub origin: LegOrigin,
}

/// Append-only store of legs for one scan.
#[derive(Debug, Clone, Default)]
pub(crate) struct LegArena {
    legs: Vec<LegRecord>,
}

impl LegArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, leg: LegRecord) -> LegId {
        let id = LegId(self.legs.len() as u32);
        self.legs.push(leg);
        id
    }

    pub fn get(&self, id: LegId) -> Option<&LegRecord> {
        self.legs.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.legs.len()
    }
}

/// A traveller on board a trip run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct OnBoard {
    pub transfers: i32,
    pub lazyness: i64,
    pub leg: LegId,
}

impl OnBoard {
    /// At least as good on transfers and lazyness.
    pub fn bounds(&self, other: &OnBoard) -> bool {
        self.transfers <= other.transfers && self.lazyness <= other.lazyness
    }
}

/// Non-dominated on-board labels of one trip run, with the last connection
/// of the run the scan processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TripLabels {
    pub last: ConnectionId,
    pub labels: Vec<OnBoard>,
}
