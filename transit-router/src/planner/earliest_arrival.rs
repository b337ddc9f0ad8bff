//! Single-criterion connection scan.
//!
//! One pass over the connections in departure order, keeping one best
//! status per stop. The result is the itinerary with the lowest arrival
//! weight (arrival seconds plus lazyness) at the destination.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::NaiveDateTime;
use tracing::{debug, trace};

use crate::access::{AccessEgressSearch, Direction};
use crate::domain::{Connection, ConnectionId, StopId, TripRun, seconds_of_day};
use crate::oracle::{AlwaysRunning, FeasibilityCache, TripFeasibilityOracle};
use crate::store::{ConnectionStore, SortOrder};

use super::config::ScanConfig;
use super::cursor::{DepartureCursor, ScannedConnection};
use super::error::ScanError;
use super::itinerary::{ChainEnd, Itinerary, reconstruct};
use super::legs::{LegArena, LegOrigin, LegRecord, OnBoard};
use super::scan::{TransitScan, collect_seeds};
use super::status::{
    LazynessPenalty, NoPenalty, SlotState, StatusComparator, StatusTable, StopStatus,
    compare_weight_then_transfers,
};

/// The best target found so far.
#[derive(Debug, Clone, Copy)]
struct BestTarget {
    stop: StopId,
    forward: StopStatus,
    backward: StopStatus,
}

impl BestTarget {
    fn weight(&self) -> i64 {
        self.forward.weight() + self.backward.weight()
    }

    /// Strictly better by weight, then transfers. Full ties keep the
    /// earlier target.
    fn improves_on(&self, other: &BestTarget) -> bool {
        (self.weight(), self.forward.transfers) < (other.weight(), other.forward.transfers)
    }
}

/// Earliest-arrival connection scan. Single use: build, `run` once, query.
pub struct EarliestArrivalScan<'a> {
    store: &'a ConnectionStore,
    departure: NaiveDateTime,
    config: ScanConfig,
    oracle: &'a dyn TripFeasibilityOracle,
    lazyness: &'a dyn LazynessPenalty,
    comparator: StatusComparator,

    forward: StatusTable<StopStatus>,
    backward: StatusTable<StopStatus>,
    legs: LegArena,
    best: Option<BestTarget>,
    has_run: bool,
    connections_scanned: usize,
}

impl<'a> EarliestArrivalScan<'a> {
    /// A scan over `store` departing at `departure`. Every trip runs every
    /// day and there is no lazyness penalty unless configured otherwise.
    pub fn new(store: &'a ConnectionStore, departure: NaiveDateTime, config: ScanConfig) -> Self {
        Self {
            store,
            departure,
            config,
            oracle: &AlwaysRunning,
            lazyness: &NoPenalty,
            comparator: compare_weight_then_transfers,
            forward: StatusTable::with_stops(store.stop_count()),
            backward: StatusTable::with_stops(store.stop_count()),
            legs: LegArena::new(),
            best: None,
            has_run: false,
            connections_scanned: 0,
        }
    }

    pub fn with_oracle(mut self, oracle: &'a dyn TripFeasibilityOracle) -> Self {
        self.oracle = oracle;
        self
    }

    pub fn with_lazyness(mut self, lazyness: &'a dyn LazynessPenalty) -> Self {
        self.lazyness = lazyness;
        self
    }

    pub fn with_comparator(mut self, comparator: StatusComparator) -> Self {
        self.comparator = comparator;
        self
    }

    /// Run the scan from the stops `source` reports to those `target`
    /// reports.
    ///
    /// Both searches run to completion before any connection is scanned.
    /// Finding no itinerary is not an error; check
    /// [`has_succeeded`](TransitScan::has_succeeded).
    pub fn run(
        &mut self,
        source: &mut dyn AccessEgressSearch,
        target: &mut dyn AccessEgressSearch,
    ) -> Result<(), ScanError> {
        if self.has_run {
            return Err(ScanError::AlreadyRun);
        }
        if !self.store.is_sorted(SortOrder::Departure) {
            return Err(ScanError::NotSorted);
        }
        self.config.validate()?;

        let horizon = self.config.horizon_seconds;
        let start = seconds_of_day(self.departure);
        let access = collect_seeds(source, Direction::Forward, horizon, self.lazyness)?;
        let egress = collect_seeds(target, Direction::Backward, horizon, self.lazyness)?;
        self.has_run = true;

        for seed in &access {
            self.forward
                .seed(seed.stop, StopStatus::seed(start + seed.cost, seed.lazyness));
        }
        for seed in &egress {
            self.backward
                .seed(seed.stop, StopStatus::seed(seed.cost, seed.lazyness));
        }

        let walk_only: Vec<StopId> = self
            .backward
            .iter()
            .map(|(stop, _)| stop)
            .filter(|stop| self.forward.get(*stop).is_some())
            .collect();
        for stop in walk_only {
            self.consider_target(stop);
        }

        self.scan(start)?;

        debug!(
            connections = self.connections_scanned,
            legs = self.legs.len(),
            succeeded = self.best.is_some(),
            best_target = ?self.best.map(|b| b.stop),
            "earliest arrival scan finished"
        );
        Ok(())
    }

    fn scan(&mut self, start: i64) -> Result<(), ScanError> {
        let horizon = self.config.horizon_seconds;
        let end = start.saturating_add(horizon);
        let cursor =
            DepartureCursor::new(self.store, start, end).map_err(ScanError::from_store)?;
        let mut feasibility = FeasibilityCache::new(self.oracle, self.departure.date());
        let mut on_board: HashMap<TripRun, OnBoard> = HashMap::new();

        for scanned in cursor {
            if scanned.departure - start > horizon {
                break;
            }
            // Nothing departing later can arrive earlier.
            if self.best.is_some_and(|best| scanned.departure > best.weight()) {
                break;
            }
            self.connections_scanned += 1;
            self.relax(&scanned, &mut feasibility, &mut on_board);
        }

        Ok(())
    }

    fn relax(
        &mut self,
        scanned: &ScannedConnection<'_>,
        feasibility: &mut FeasibilityCache<'_>,
        on_board: &mut HashMap<TripRun, OnBoard>,
    ) {
        let connection = scanned.connection;
        let pseudo = connection.is_pseudo();
        let run = TripRun::new(connection.trip(), scanned.day);

        let riding = if pseudo {
            None
        } else {
            on_board.get(&run).copied()
        };
        let boarding_from = self.boarding_status(scanned, run, feasibility);

        let arriving = |transfers: i32, lazyness: i64| StopStatus {
            seconds: scanned.arrival,
            transfers,
            lazyness,
            trip: (!pseudo).then_some(run),
            connection: Some(scanned.id),
            leg: None,
        };

        let candidate = match (riding, boarding_from) {
            (None, None) => return,
            (Some(ride), from) => {
                let stay = StopStatus {
                    leg: Some(ride.leg),
                    ..arriving(ride.transfers, ride.lazyness)
                };
                match from {
                    Some(from)
                        if (self.comparator)(
                            &arriving(from.transfers + 1, from.lazyness),
                            &stay,
                        ) == Ordering::Less =>
                    {
                        self.board(scanned, &from, arriving(from.transfers + 1, from.lazyness))
                    }
                    _ => stay,
                }
            }
            (None, Some(from)) => {
                self.board(scanned, &from, arriving(from.transfers + 1, from.lazyness))
            }
        };

        if !pseudo {
            if let Some(leg) = candidate.leg {
                on_board.insert(
                    run,
                    OnBoard {
                        transfers: candidate.transfers,
                        lazyness: candidate.lazyness,
                        leg,
                    },
                );
            }
        }

        let stop = connection.arrival_stop();
        let improves = match self.forward.get(stop) {
            Some(existing) => (self.comparator)(&candidate, existing) == Ordering::Less,
            None => true,
        };
        if improves {
            self.forward.reach(stop, candidate);
            self.consider_target(stop);
        }
    }

    /// The status at the departure stop, if it can board this connection.
    fn boarding_status(
        &self,
        scanned: &ScannedConnection<'_>,
        run: TripRun,
        feasibility: &mut FeasibilityCache<'_>,
    ) -> Option<StopStatus> {
        let connection = scanned.connection;
        let from = *self.forward.get(connection.departure_stop())?;

        if connection.is_pseudo() {
            // A pseudo-connection is the transfer itself.
            return (from.seconds <= scanned.departure).then_some(from);
        }
        if from.trip == Some(run) {
            return None;
        }
        if from.seconds > scanned.departure - self.config.min_transfer_seconds {
            return None;
        }
        feasibility.is_running(run).then_some(from)
    }

    /// Record a new leg boarded from `from` and attach it to `arriving`.
    fn board(
        &mut self,
        scanned: &ScannedConnection<'_>,
        from: &StopStatus,
        arriving: StopStatus,
    ) -> StopStatus {
        let origin = match (from.connection, from.leg) {
            (Some(alight), Some(leg)) => LegOrigin::Transfer { alight, leg },
            _ => LegOrigin::Access {
                arrival: from.seconds,
            },
        };
        let leg = self.legs.push(LegRecord {
            board: scanned.id,
            day: scanned.day,
            origin,
        });
        StopStatus {
            leg: Some(leg),
            ..arriving
        }
    }

    fn consider_target(&mut self, stop: StopId) {
        let (Some(forward), Some(backward)) = (self.forward.get(stop), self.backward.get(stop))
        else {
            return;
        };
        let candidate = BestTarget {
            stop,
            forward: *forward,
            backward: *backward,
        };

        if self.best.is_none_or(|best| candidate.improves_on(&best)) {
            trace!(
                %stop,
                weight = candidate.weight(),
                transfers = candidate.forward.transfers,
                "new best target"
            );
            self.best = Some(candidate);
        }
    }

    /// Forward status of a stop; [`StopStatus::UNREACHED`] if never touched.
    pub fn stop_status(&self, stop: StopId) -> StopStatus {
        self.forward
            .get(stop)
            .copied()
            .unwrap_or(StopStatus::UNREACHED)
    }

    /// Egress status of a stop; [`StopStatus::UNREACHED`] if the egress
    /// search never reported it.
    pub fn backward_status(&self, stop: StopId) -> StopStatus {
        self.backward
            .get(stop)
            .copied()
            .unwrap_or(StopStatus::UNREACHED)
    }

    pub fn stop_state(&self, stop: StopId) -> SlotState {
        self.forward.state(stop)
    }

    /// Connections processed by the last run.
    pub fn connections_scanned(&self) -> usize {
        self.connections_scanned
    }

    fn best(&self) -> Result<&BestTarget, ScanError> {
        if !self.has_run {
            return Err(ScanError::NotRun);
        }
        self.best.as_ref().ok_or(ScanError::NotSucceeded)
    }
}

impl TransitScan for EarliestArrivalScan<'_> {
    fn departure(&self) -> NaiveDateTime {
        self.departure
    }

    fn has_run(&self) -> bool {
        self.has_run
    }

    fn has_succeeded(&self) -> bool {
        self.best.is_some()
    }

    fn best_target_stop(&self) -> Option<StopId> {
        self.best.map(|b| b.stop)
    }

    fn connection(&self, id: ConnectionId) -> Result<&Connection, ScanError> {
        Ok(self.store.connection(id)?)
    }

    fn arrival_seconds(&self) -> Result<i64, ScanError> {
        let best = self.best()?;
        Ok(best.forward.seconds + best.backward.seconds)
    }

    fn itinerary(&self) -> Result<Itinerary, ScanError> {
        let best = self.best()?;
        reconstruct(
            self.store,
            &self.legs,
            self.departure.date(),
            seconds_of_day(self.departure),
            ChainEnd {
                stop: best.stop,
                arrival: best.forward.seconds,
                transfers: best.forward.transfers,
                connection: best.forward.connection,
                leg: best.forward.leg,
                egress_seconds: best.backward.seconds,
            },
        )
    }
}
