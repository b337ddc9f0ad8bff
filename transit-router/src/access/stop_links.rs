//! Precomputed stop links.
//!
//! The simplest access collaborator: a fixed list of stops with the cost of
//! reaching each one, for example exported from an offline road-network
//! search, or a single stop at zero cost when the query starts at a stop.

use std::collections::HashMap;

use crate::domain::StopId;

use super::{AccessEgressSearch, Direction, SearchControl};

/// A fixed table of `(stop, cost)` links reported in cost order.
#[derive(Debug, Clone)]
pub struct StopLinks {
    direction: Direction,
    /// Cheapest known cost per stop, in seconds.
    links: HashMap<StopId, f64>,
}

impl StopLinks {
    /// Create an empty table.
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            links: HashMap::new(),
        }
    }

    /// A table holding one stop reachable at zero cost.
    pub fn at_stop(stop: StopId, direction: Direction) -> Self {
        let mut links = Self::new(direction);
        links.add(stop, 0.0);
        links
    }

    /// Add a link, keeping the cheaper cost if the stop is already present.
    ///
    /// Negative and non-finite costs are ignored.
    pub fn add(&mut self, stop: StopId, cost_seconds: f64) {
        if !cost_seconds.is_finite() || cost_seconds < 0.0 {
            return;
        }
        self.links
            .entry(stop)
            .and_modify(|cost| *cost = cost.min(cost_seconds))
            .or_insert(cost_seconds);
    }

    /// Cost of reaching a stop, if linked.
    pub fn cost(&self, stop: StopId) -> Option<f64> {
        self.links.get(&stop).copied()
    }

    /// Links in reporting order: cost ascending, then stop id.
    pub fn sorted_links(&self) -> Vec<(StopId, f64)> {
        let mut links: Vec<_> = self.links.iter().map(|(s, c)| (*s, *c)).collect();
        links.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        links
    }

    /// Number of linked stops.
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Returns true if no stop is linked.
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

impl AccessEgressSearch for StopLinks {
    fn direction(&self) -> Direction {
        self.direction
    }

    fn run(&mut self, stop_found: &mut dyn FnMut(StopId, f64) -> SearchControl) {
        for (stop, cost) in self.sorted_links() {
            if stop_found(stop, cost) == SearchControl::Stop {
                break;
            }
        }
    }
}

/// Builder for creating stop-link tables.
///
/// Provides a fluent API for adding links.
#[derive(Debug)]
pub struct StopLinksBuilder {
    inner: StopLinks,
}

impl StopLinksBuilder {
    /// Create a new builder.
    pub fn new(direction: Direction) -> Self {
        Self {
            inner: StopLinks::new(direction),
        }
    }

    /// Add a link.
    pub fn link(mut self, stop: u32, cost_seconds: f64) -> Self {
        self.inner.add(StopId(stop), cost_seconds);
        self
    }

    /// Build the table.
    pub fn build(self) -> StopLinks {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reported(links: &mut StopLinks) -> Vec<(StopId, f64)> {
        let mut found = Vec::new();
        links.run(&mut |stop, cost| {
            found.push((stop, cost));
            SearchControl::Continue
        });
        found
    }

    #[test]
    fn empty_links() {
        let mut links = StopLinks::new(Direction::Forward);
        assert!(links.is_empty());
        assert_eq!(links.len(), 0);
        assert!(reported(&mut links).is_empty());
    }

    #[test]
    fn at_stop_is_free() {
        let links = StopLinks::at_stop(StopId(3), Direction::Backward);
        assert_eq!(links.cost(StopId(3)), Some(0.0));
        assert_eq!(links.direction(), Direction::Backward);
    }

    #[test]
    fn reports_in_cost_order() {
        let mut links = StopLinksBuilder::new(Direction::Forward)
            .link(1, 120.0)
            .link(2, 30.0)
            .link(3, 60.0)
            .link(4, 30.0)
            .build();

        let stops: Vec<_> = reported(&mut links).into_iter().map(|(s, _)| s.0).collect();
        assert_eq!(stops, vec![2, 4, 3, 1]);
    }

    #[test]
    fn keeps_cheapest_cost() {
        let links = StopLinksBuilder::new(Direction::Forward)
            .link(1, 120.0)
            .link(1, 90.0)
            .link(1, 300.0)
            .build();
        assert_eq!(links.len(), 1);
        assert_eq!(links.cost(StopId(1)), Some(90.0));
    }

    #[test]
    fn builder_ignores_invalid_costs() {
        let links = StopLinksBuilder::new(Direction::Forward)
            .link(1, -5.0)
            .link(2, f64::NAN)
            .link(3, f64::INFINITY)
            .link(4, 10.0)
            .build();
        assert_eq!(links.len(), 1);
        assert!(links.cost(StopId(4)).is_some());
    }

    #[test]
    fn stops_when_asked() {
        let mut links = StopLinksBuilder::new(Direction::Forward)
            .link(1, 10.0)
            .link(2, 20.0)
            .link(3, 30.0)
            .build();

        let mut seen = 0;
        links.run(&mut |_, cost| {
            seen += 1;
            if cost >= 20.0 {
                SearchControl::Stop
            } else {
                SearchControl::Continue
            }
        });
        assert_eq!(seen, 2);
    }
}
