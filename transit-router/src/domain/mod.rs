//! Domain types for the transit router.
//!
//! This module contains the timetable records the scans operate on. All
//! types enforce their invariants at construction time, so code that
//! receives these types can trust their validity.

mod connection;
mod ids;
mod time;

pub use connection::{Connection, InvalidConnection};
pub use ids::{ConnectionId, RouteId, StopId, TripId, TripRun};
pub use time::{
    SECONDS_PER_DAY, TimeError, datetime_at, format_hhmmss, parse_hhmmss, seconds_of_day,
    shift_date,
};
