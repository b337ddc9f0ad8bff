//! Access and egress searches.
//!
//! A scan never walks the road network itself. It asks an
//! [`AccessEgressSearch`] which stops are reachable from the origin (forward)
//! or can reach the destination (backward), and at what cost. The
//! collaborator may be a road-network Dijkstra, a precomputed stop-link
//! table ([`StopLinks`]), a straight-line estimate ([`CrowFlySearch`]), or a
//! mock in tests.

mod crow_fly;
mod stop_links;

pub use crow_fly::{Coordinate, CrowFlyConfig, CrowFlyConfigError, CrowFlySearch, StopLocations};
pub use stop_links::{StopLinks, StopLinksBuilder};

use crate::domain::StopId;

/// Which end of the journey a search serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// From the origin to stops (access).
    Forward,
    /// From stops to the destination (egress).
    Backward,
}

/// Returned by the observer to tell the collaborator whether to keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchControl {
    Continue,
    Stop,
}

/// A search reporting reachable stops with their costs.
pub trait AccessEgressSearch {
    /// The direction this search runs in.
    fn direction(&self) -> Direction;

    /// Run the search, calling `stop_found(stop, cost_seconds)` once per
    /// reachable stop in non-decreasing cost order.
    ///
    /// Costs are non-negative seconds. The search should end as soon as the
    /// observer returns [`SearchControl::Stop`].
    fn run(&mut self, stop_found: &mut dyn FnMut(StopId, f64) -> SearchControl);
}
