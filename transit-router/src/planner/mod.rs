//! Connection-scan journey planner.
//!
//! This module implements the two scans that answer: "leaving now, how do I
//! get there?"
//!
//! - [`EarliestArrivalScan`] keeps one best status per stop and finds the
//!   itinerary arriving first.
//! - [`ProfileScan`] keeps a Pareto frontier per stop and finds every
//!   trade-off between arrival time and the number of transfers.
//!
//! Both make one pass over the store's departure ordering, crossing midnight
//! with a multi-day cursor, and consult the trip feasibility oracle only for
//! trips they try to board.

mod config;
mod cursor;
mod earliest_arrival;
mod error;
mod itinerary;
mod legs;
mod profile;
mod profile_scan;
mod scan;
mod status;

pub use config::{ConfigError, MAX_HORIZON_SECONDS, ScanConfig};
pub use cursor::{DepartureCursor, ScannedConnection};
pub use earliest_arrival::EarliestArrivalScan;
pub use error::ScanError;
pub use itinerary::{Itinerary, ItineraryLeg};
pub use legs::LegId;
pub use profile::{Criteria, Profile, ProfileFrontier};
pub use profile_scan::{ProfileScan, Target};
pub use scan::TransitScan;
pub use status::{
    LazynessPenalty, LinearPenalty, NoPenalty, SlotState, StatusComparator, StatusTable,
    StopStatus, compare_transfers_then_weight, compare_weight_then_transfers,
};
