//! Connection records.

use super::ids::{RouteId, StopId, TripId};

/// Error returned when a connection arrives before it departs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid connection: arrives at {arrival_time}s before departing at {departure_time}s")]
pub struct InvalidConnection {
    pub departure_time: u32,
    pub arrival_time: u32,
}

/// One scheduled vehicle movement between two stops.
///
/// Times are seconds since local midnight of the schedule's reference day.
/// Values of 86400 and above are allowed for runs continuing past midnight.
/// `arrival_time >= departure_time` holds for every constructed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    departure_stop: StopId,
    arrival_stop: StopId,
    trip: TripId,
    route: Option<RouteId>,
    departure_time: u32,
    arrival_time: u32,
}

impl Connection {
    /// Create a connection, rejecting one that arrives before it departs.
    pub fn new(
        departure_stop: StopId,
        arrival_stop: StopId,
        trip: TripId,
        route: Option<RouteId>,
        departure_time: u32,
        arrival_time: u32,
    ) -> Result<Self, InvalidConnection> {
        if arrival_time < departure_time {
            return Err(InvalidConnection {
                departure_time,
                arrival_time,
            });
        }

        Ok(Self {
            departure_stop,
            arrival_stop,
            trip,
            route,
            departure_time,
            arrival_time,
        })
    }

    /// Create a pseudo-connection: a free walking transfer between nearby stops.
    pub fn pseudo(
        departure_stop: StopId,
        arrival_stop: StopId,
        departure_time: u32,
        arrival_time: u32,
    ) -> Result<Self, InvalidConnection> {
        Self::new(
            departure_stop,
            arrival_stop,
            TripId::PSEUDO,
            None,
            departure_time,
            arrival_time,
        )
    }

    pub fn departure_stop(&self) -> StopId {
        self.departure_stop
    }

    pub fn arrival_stop(&self) -> StopId {
        self.arrival_stop
    }

    pub fn trip(&self) -> TripId {
        self.trip
    }

    pub fn route(&self) -> Option<RouteId> {
        self.route
    }

    pub fn departure_time(&self) -> u32 {
        self.departure_time
    }

    pub fn arrival_time(&self) -> u32 {
        self.arrival_time
    }

    /// Returns true if this record is a walking transfer rather than a vehicle movement.
    pub fn is_pseudo(&self) -> bool {
        self.trip.is_pseudo()
    }

    /// Travel time in seconds.
    pub fn duration_seconds(&self) -> u32 {
        self.arrival_time - self.departure_time
    }
}
