//! Identifier newtypes.
//!
//! Stops, trips and routes are dense small integers assigned by the
//! timetable importer. Connection ids are assigned by the
//! [`ConnectionStore`](crate::store::ConnectionStore) in insertion order.

use std::fmt;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub u32);

        impl $name {
            /// Returns the id as an index into a dense table.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl From<u32> for $name {
            fn from(value: u32) -> Self {
                Self(value)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// A stop (platform, bus bay, station) in the timetable.
    StopId,
    "Stop"
);

id_type!(
    /// A trip: one run of one vehicle along an ordered sequence of connections.
    TripId,
    "Trip"
);

id_type!(
    /// A route grouping trips that serve the same stop pattern.
    RouteId,
    "Route"
);

id_type!(
    /// Index of a connection record in its store.
    ConnectionId,
    "Connection"
);

impl TripId {
    /// Reserved trip id marking a pseudo-connection (a short free transfer
    /// between nearby stops).
    pub const PSEUDO: TripId = TripId(u32::MAX);

    /// Returns true for the pseudo-connection sentinel.
    pub fn is_pseudo(self) -> bool {
        self == Self::PSEUDO
    }
}

/// A trip operated on a specific service day.
///
/// The same trip id scanned on two different days denotes two different
/// vehicles. `day` is relative to the query's reference date and may be
/// negative for after-midnight runs of the previous service date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TripRun {
    pub trip: TripId,
    pub day: i32,
}

impl TripRun {
    pub fn new(trip: TripId, day: i32) -> Self {
        Self { trip, day }
    }
}
