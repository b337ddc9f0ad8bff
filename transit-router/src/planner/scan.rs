//! Query surface and seeding shared by both scans.

use chrono::{Duration, NaiveDateTime};
use tracing::trace;

use crate::access::{AccessEgressSearch, Direction, SearchControl};
use crate::domain::{Connection, ConnectionId, StopId, datetime_at, seconds_of_day};

use super::error::ScanError;
use super::itinerary::Itinerary;
use super::status::{LazynessPenalty, cost_seconds, penalty_seconds};

/// What a caller that needs one chosen itinerary asks of a finished scan.
///
/// Both [`EarliestArrivalScan`](super::EarliestArrivalScan) and
/// [`ProfileScan`](super::ProfileScan) implement it.
pub trait TransitScan {
    /// The query departure.
    fn departure(&self) -> NaiveDateTime;

    fn has_run(&self) -> bool;

    /// Whether a target was reached within the horizon.
    fn has_succeeded(&self) -> bool;

    fn best_target_stop(&self) -> Option<StopId>;

    fn connection(&self, id: ConnectionId) -> Result<&Connection, ScanError>;

    /// Arrival at the destination in seconds since the reference midnight.
    fn arrival_seconds(&self) -> Result<i64, ScanError>;

    /// The itinerary to the best target.
    fn itinerary(&self) -> Result<Itinerary, ScanError>;

    fn arrival_time(&self) -> Result<NaiveDateTime, ScanError> {
        let seconds = self.arrival_seconds()?;
        datetime_at(self.departure().date(), seconds).ok_or(ScanError::TimeOutOfRange)
    }

    /// Time from the query departure to arrival at the destination.
    fn duration(&self) -> Result<Duration, ScanError> {
        let seconds = self.arrival_seconds()? - seconds_of_day(self.departure());
        Ok(Duration::seconds(seconds))
    }
}

/// A stop reported by an access or egress search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Seed {
    pub stop: StopId,
    /// Cost in whole seconds.
    pub cost: i64,
    pub lazyness: i64,
}

/// Run `search` to completion, collecting every stop it reports within the
/// horizon in reporting order. Stops reported at a non-finite cost are
/// unreachable and are skipped.
pub(crate) fn collect_seeds(
    search: &mut dyn AccessEgressSearch,
    expected: Direction,
    horizon_seconds: i64,
    lazyness: &dyn LazynessPenalty,
) -> Result<Vec<Seed>, ScanError> {
    if search.direction() != expected {
        return Err(ScanError::WrongDirection { expected });
    }

    let mut seeds = Vec::new();
    search.run(&mut |stop, cost| {
        if !cost.is_finite() {
            trace!(?expected, %stop, cost, "skipped unreachable stop");
            return SearchControl::Continue;
        }
        let cost_s = cost_seconds(cost);
        if cost_s > horizon_seconds {
            return SearchControl::Stop;
        }
        let seed = Seed {
            stop,
            cost: cost_s,
            lazyness: penalty_seconds(lazyness, cost),
        };
        trace!(?expected, %stop, cost = cost_s, lazyness = seed.lazyness, "seeded stop");
        seeds.push(seed);
        SearchControl::Continue
    });

    Ok(seeds)
}
