//! Straight-line walking access.
//!
//! Estimates the walking cost from a set of weighted points to every stop
//! within a maximum distance, using great-circle distance and a fixed
//! walking speed. Useful where no road network is loaded, and as a cheap
//! lower bound of what a road-network search would report.

use serde::Deserialize;

use crate::domain::StopId;

use super::{AccessEgressSearch, Direction, SearchControl};

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS84 position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Great-circle distance in metres (haversine).
    pub fn distance_m(&self, other: &Coordinate) -> f64 {
        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let dlat = lat2 - lat1;
        let dlon = (other.lon - self.lon).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().asin()
    }
}

/// Stop positions, indexed by stop id.
#[derive(Debug, Clone, Default)]
pub struct StopLocations {
    coordinates: Vec<Option<Coordinate>>,
}

impl StopLocations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or replace) the position of a stop.
    pub fn set(&mut self, stop: StopId, coordinate: Coordinate) {
        if self.coordinates.len() <= stop.index() {
            self.coordinates.resize(stop.index() + 1, None);
        }
        self.coordinates[stop.index()] = Some(coordinate);
    }

    pub fn get(&self, stop: StopId) -> Option<Coordinate> {
        self.coordinates.get(stop.index()).copied().flatten()
    }

    /// Stops with a known position.
    pub fn iter(&self) -> impl Iterator<Item = (StopId, Coordinate)> + '_ {
        self.coordinates
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.map(|c| (StopId(i as u32), c)))
    }
}

fn default_walking_speed() -> f64 {
    1.4
}

fn default_max_distance() -> f64 {
    1_000.0
}

/// A walking parameter that cannot produce finite costs.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CrowFlyConfigError {
    #[error("walking speed must be positive and finite, got {0} m/s")]
    WalkingSpeed(f64),

    #[error("maximum distance must not be negative, got {0} m")]
    MaxDistance(f64),
}

/// Configuration for straight-line access.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "CrowFlyFields")]
pub struct CrowFlyConfig {
    /// Walking speed in metres per second.
    pub walking_speed_mps: f64,

    /// Stops further than this from every origin point are not reported.
    pub max_distance_m: f64,
}

#[derive(Deserialize)]
struct CrowFlyFields {
    #[serde(default = "default_walking_speed")]
    walking_speed_mps: f64,
    #[serde(default = "default_max_distance")]
    max_distance_m: f64,
}

impl TryFrom<CrowFlyFields> for CrowFlyConfig {
    type Error = CrowFlyConfigError;

    fn try_from(fields: CrowFlyFields) -> Result<Self, Self::Error> {
        Self::new(fields.walking_speed_mps, fields.max_distance_m)
    }
}

impl CrowFlyConfig {
    pub fn new(walking_speed_mps: f64, max_distance_m: f64) -> Result<Self, CrowFlyConfigError> {
        if !(walking_speed_mps.is_finite() && walking_speed_mps > 0.0) {
            return Err(CrowFlyConfigError::WalkingSpeed(walking_speed_mps));
        }
        if max_distance_m.is_nan() || max_distance_m < 0.0 {
            return Err(CrowFlyConfigError::MaxDistance(max_distance_m));
        }
        Ok(Self {
            walking_speed_mps,
            max_distance_m,
        })
    }
}

impl Default for CrowFlyConfig {
    fn default() -> Self {
        Self {
            walking_speed_mps: default_walking_speed(),
            max_distance_m: default_max_distance(),
        }
    }
}

/// Straight-line walking search from weighted points.
#[derive(Debug, Clone)]
pub struct CrowFlySearch<'a> {
    locations: &'a StopLocations,
    /// Points with the cost (seconds) already spent to reach them.
    origins: Vec<(Coordinate, f64)>,
    config: CrowFlyConfig,
    direction: Direction,
}

impl<'a> CrowFlySearch<'a> {
    pub fn new(locations: &'a StopLocations, config: CrowFlyConfig, direction: Direction) -> Self {
        Self {
            locations,
            origins: Vec::new(),
            config,
            direction,
        }
    }

    /// Add an origin point reached at `initial_cost` seconds (usually 0).
    pub fn with_origin(mut self, point: Coordinate, initial_cost: f64) -> Self {
        self.origins.push((point, initial_cost.max(0.0)));
        self
    }

    /// Cost of every stop within range, cheapest first.
    pub fn costs(&self) -> Vec<(StopId, f64)> {
        let speed = self.config.walking_speed_mps;
        let mut costs: Vec<(StopId, f64)> = self
            .locations
            .iter()
            .filter_map(|(stop, position)| {
                self.origins
                    .iter()
                    .filter_map(|(origin, initial)| {
                        let distance = origin.distance_m(&position);
                        (distance <= self.config.max_distance_m)
                            .then(|| initial + distance / speed)
                    })
                    .min_by(f64::total_cmp)
                    .map(|cost| (stop, cost))
            })
            .collect();

        costs.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        costs
    }
}

impl AccessEgressSearch for CrowFlySearch<'_> {
    fn direction(&self) -> Direction {
        self.direction
    }

    fn run(&mut self, stop_found: &mut dyn FnMut(StopId, f64) -> SearchControl) {
        for (stop, cost) in self.costs() {
            if stop_found(stop, cost) == SearchControl::Stop {
                break;
            }
        }
    }
}
