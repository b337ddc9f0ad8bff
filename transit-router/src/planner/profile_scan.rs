//! Multi-criterion connection scan.
//!
//! Like the earliest-arrival scan, but every stop keeps a Pareto frontier
//! over (transfers, weight) instead of one best status, and every profile
//! in a departure stop's frontier is a boarding candidate. The targets
//! reached form their own frontier, from which the full set of trade-off
//! itineraries is rebuilt.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use tracing::{debug, trace};

use crate::access::{AccessEgressSearch, Direction};
use crate::domain::{Connection, ConnectionId, RouteId, StopId, TripRun, seconds_of_day};
use crate::oracle::{AlwaysRunning, FeasibilityCache, TripFeasibilityOracle};
use crate::store::{ConnectionStore, SortOrder};

use super::config::ScanConfig;
use super::cursor::{DepartureCursor, ScannedConnection};
use super::error::ScanError;
use super::itinerary::{ChainEnd, Itinerary, reconstruct};
use super::legs::{LegArena, LegId, LegOrigin, LegRecord, OnBoard, TripLabels};
use super::profile::{Criteria, Profile, ProfileFrontier};
use super::scan::{TransitScan, collect_seeds};
use super::status::{LazynessPenalty, NoPenalty, StatusTable, StopStatus};

/// A profile that reached a stop the egress search also reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub stop: StopId,
    pub profile: Profile,
    pub egress: StopStatus,
}

impl Target {
    /// Arrival at the destination, seconds since the reference midnight.
    pub fn arrival(&self) -> i64 {
        self.profile.seconds + self.egress.seconds
    }
}

impl Criteria for Target {
    fn transfers(&self) -> i32 {
        self.profile.transfers
    }

    fn weight(&self) -> i64 {
        self.profile.weight() + self.egress.weight()
    }
}

/// Where an on-board candidate's leg comes from.
#[derive(Debug, Clone, Copy)]
enum LegSource {
    Riding(LegId),
    Boarding(LegOrigin),
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    transfers: i32,
    lazyness: i64,
    previous: Option<ConnectionId>,
    source: LegSource,
}

impl Candidate {
    fn bounds(&self, other: &Candidate) -> bool {
        self.transfers <= other.transfers && self.lazyness <= other.lazyness
    }
}

/// Which run of a route was last boarded at a stop, and when it left.
type RouteRuns = HashMap<(RouteId, StopId), (TripRun, i64)>;

/// Profile connection scan. Single use: build, `run` once, query.
pub struct ProfileScan<'a> {
    store: &'a ConnectionStore,
    departure: NaiveDateTime,
    config: ScanConfig,
    oracle: &'a dyn TripFeasibilityOracle,
    lazyness: &'a dyn LazynessPenalty,

    forward: StatusTable<ProfileFrontier>,
    backward: StatusTable<StopStatus>,
    legs: LegArena,
    targets: ProfileFrontier<Target>,
    has_run: bool,
    connections_scanned: usize,
}

impl<'a> ProfileScan<'a> {
    pub fn new(store: &'a ConnectionStore, departure: NaiveDateTime, config: ScanConfig) -> Self {
        Self {
            store,
            departure,
            config,
            oracle: &AlwaysRunning,
            lazyness: &NoPenalty,
            forward: StatusTable::with_stops(store.stop_count()),
            backward: StatusTable::with_stops(store.stop_count()),
            legs: LegArena::new(),
            targets: ProfileFrontier::new(),
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

    /// Run the scan from the stops `source` reports to those `target`
    /// reports.
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
            let profile = Profile::seed(start + seed.cost, seed.lazyness);
            self.forward.seed(seed.stop, ProfileFrontier::with(profile));
        }
        for seed in &egress {
            self.backward
                .seed(seed.stop, StopStatus::seed(seed.cost, seed.lazyness));
        }

        let walk_only: Vec<(StopId, Profile)> = self
            .backward
            .iter()
            .filter_map(|(stop, _)| {
                let frontier = self.forward.get(stop)?;
                frontier.best().map(|profile| (stop, *profile))
            })
            .collect();
        for (stop, profile) in walk_only {
            self.consider_target(stop, profile);
        }

        self.scan(start)?;

        debug!(
            connections = self.connections_scanned,
            legs = self.legs.len(),
            targets = self.targets.len(),
            best_target = ?self.best_target_stop(),
            "profile scan finished"
        );
        Ok(())
    }

    fn scan(&mut self, start: i64) -> Result<(), ScanError> {
        let horizon = self.config.horizon_seconds;
        let end = start.saturating_add(horizon);
        let cursor =
            DepartureCursor::new(self.store, start, end).map_err(ScanError::from_store)?;
        let mut feasibility = FeasibilityCache::new(self.oracle, self.departure.date());
        let mut on_board: HashMap<TripRun, TripLabels> = HashMap::new();
        let mut route_runs = RouteRuns::new();

        for scanned in cursor {
            if scanned.departure - start > horizon {
                break;
            }
            // A target with at most one transfer bounds everything still to
            // come: any new itinerary boards at least once and arrives no
            // earlier than it departs.
            if self
                .targets
                .best_within(1)
                .is_some_and(|bound| scanned.departure > bound)
            {
                break;
            }
            self.connections_scanned += 1;
            self.relax(&scanned, &mut feasibility, &mut on_board, &mut route_runs);
        }

        Ok(())
    }

    fn relax(
        &mut self,
        scanned: &ScannedConnection<'_>,
        feasibility: &mut FeasibilityCache<'_>,
        on_board: &mut HashMap<TripRun, TripLabels>,
        route_runs: &mut RouteRuns,
    ) {
        let connection = scanned.connection;
        let pseudo = connection.is_pseudo();
        let run = TripRun::new(connection.trip(), scanned.day);

        let mut candidates = Vec::new();
        if !pseudo {
            if let Some(riding) = on_board.get(&run) {
                candidates.extend(riding.labels.iter().map(|label| Candidate {
                    transfers: label.transfers,
                    lazyness: label.lazyness,
                    previous: Some(riding.last),
                    source: LegSource::Riding(label.leg),
                }));
            }
        }

        let route_key = connection
            .route()
            .map(|route| (route, connection.departure_stop()));
        let boarded = self.boarding_candidates(scanned, run, route_key, route_runs, feasibility);
        if boarded.is_empty() && candidates.is_empty() {
            return;
        }
        if let (Some(key), false) = (route_key, boarded.is_empty()) {
            route_runs.insert(key, (run, scanned.departure));
        }
        candidates.extend(boarded);

        // Riding labels come first, so they win ties against boarding.
        let mut kept: Vec<Candidate> = Vec::new();
        for candidate in candidates {
            if kept.iter().any(|k| k.bounds(&candidate)) {
                continue;
            }
            kept.retain(|k| !candidate.bounds(k));
            kept.push(candidate);
        }

        let mut labels = Vec::with_capacity(kept.len());
        for candidate in &kept {
            let leg = match candidate.source {
                LegSource::Riding(leg) => leg,
                LegSource::Boarding(origin) => self.legs.push(LegRecord {
                    board: scanned.id,
                    day: scanned.day,
                    origin,
                }),
            };
            labels.push(OnBoard {
                transfers: candidate.transfers,
                lazyness: candidate.lazyness,
                leg,
            });
        }

        let stop = connection.arrival_stop();
        for (candidate, label) in kept.iter().zip(&labels) {
            let profile = Profile {
                seconds: scanned.arrival,
                transfers: label.transfers,
                lazyness: label.lazyness,
                trip: (!pseudo).then_some(run),
                connection: Some(scanned.id),
                previous_connection: candidate.previous,
                leg: Some(label.leg),
            };

            let changed = match self.forward.get_mut(stop) {
                Some(frontier) => frontier.try_add(profile),
                None => {
                    self.forward.reach(stop, ProfileFrontier::with(profile));
                    true
                }
            };
            if changed {
                self.forward.mark_reached(stop);
                self.consider_target(stop, profile);
            }
        }

        if !pseudo {
            on_board.insert(
                run,
                TripLabels {
                    last: scanned.id,
                    labels,
                },
            );
        }
    }

    /// On-board candidates from every profile at the departure stop that
    /// can board this connection.
    fn boarding_candidates(
        &self,
        scanned: &ScannedConnection<'_>,
        run: TripRun,
        route_key: Option<(RouteId, StopId)>,
        route_runs: &RouteRuns,
        feasibility: &mut FeasibilityCache<'_>,
    ) -> Vec<Candidate> {
        let connection = scanned.connection;
        let Some(frontier) = self.forward.get(connection.departure_stop()) else {
            return Vec::new();
        };

        let pseudo = connection.is_pseudo();
        let min_transfer = self.config.min_transfer_seconds;
        let latest = if pseudo {
            scanned.departure
        } else {
            scanned.departure - min_transfer
        };
        // Profiles that could have caught the previously boarded run of the
        // same route get nothing from a later run of it.
        let overtaken_before = route_key
            .and_then(|key| route_runs.get(&key))
            .filter(|(other, _)| *other != run)
            .map(|(_, departure)| departure - min_transfer);

        let mut candidates = Vec::new();
        for profile in frontier.iter() {
            if profile.seconds > latest {
                continue;
            }
            if !pseudo && profile.trip == Some(run) {
                continue;
            }
            if overtaken_before.is_some_and(|bound| profile.seconds <= bound) {
                continue;
            }
            if !pseudo && !feasibility.is_running(run) {
                break;
            }

            let origin = match (profile.connection, profile.leg) {
                (Some(alight), Some(leg)) => LegOrigin::Transfer { alight, leg },
                _ => LegOrigin::Access {
                    arrival: profile.seconds,
                },
            };
            candidates.push(Candidate {
                transfers: profile.transfers + 1,
                lazyness: profile.lazyness,
                previous: profile.connection,
                source: LegSource::Boarding(origin),
            });
        }
        candidates
    }

    fn consider_target(&mut self, stop: StopId, profile: Profile) {
        let Some(egress) = self.backward.get(stop).copied() else {
            return;
        };
        let target = Target {
            stop,
            profile,
            egress,
        };
        if self.targets.try_add(target) {
            trace!(
                %stop,
                weight = target.weight(),
                transfers = profile.transfers,
                "new target profile"
            );
        }
    }

    /// The frontier of a stop; empty if never reached.
    pub fn stop_profiles(&self, stop: StopId) -> &[Profile] {
        self.forward
            .get(stop)
            .map(ProfileFrontier::as_slice)
            .unwrap_or(&[])
    }

    /// Egress status of a stop; [`StopStatus::UNREACHED`] if the egress
    /// search never reported it.
    pub fn backward_status(&self, stop: StopId) -> StopStatus {
        self.backward
            .get(stop)
            .copied()
            .unwrap_or(StopStatus::UNREACHED)
    }

    /// Non-dominated targets, fewest transfers first.
    pub fn targets(&self) -> &[Target] {
        self.targets.as_slice()
    }

    /// Connections processed by the last run.
    pub fn connections_scanned(&self) -> usize {
        self.connections_scanned
    }

    /// One itinerary per non-dominated (transfers, weight) trade-off,
    /// fewest transfers first.
    pub fn pareto_itineraries(&self) -> Result<Vec<Itinerary>, ScanError> {
        if !self.has_run {
            return Err(ScanError::NotRun);
        }
        self.targets
            .iter()
            .map(|target| self.rebuild(target))
            .collect()
    }

    fn rebuild(&self, target: &Target) -> Result<Itinerary, ScanError> {
        reconstruct(
            self.store,
            &self.legs,
            self.departure.date(),
            seconds_of_day(self.departure),
            ChainEnd {
                stop: target.stop,
                arrival: target.profile.seconds,
                transfers: target.profile.transfers,
                connection: target.profile.connection,
                leg: target.profile.leg,
                egress_seconds: target.egress.seconds,
            },
        )
    }

    fn best(&self) -> Result<&Target, ScanError> {
        if !self.has_run {
            return Err(ScanError::NotRun);
        }
        self.targets.best().ok_or(ScanError::NotSucceeded)
    }
}

impl TransitScan for ProfileScan<'_> {
    fn departure(&self) -> NaiveDateTime {
        self.departure
    }

    fn has_run(&self) -> bool {
        self.has_run
    }

    fn has_succeeded(&self) -> bool {
        !self.targets.is_empty()
    }

    fn best_target_stop(&self) -> Option<StopId> {
        self.targets.best().map(|t| t.stop)
    }

    fn connection(&self, id: ConnectionId) -> Result<&Connection, ScanError> {
        Ok(self.store.connection(id)?)
    }

    fn arrival_seconds(&self) -> Result<i64, ScanError> {
        Ok(self.best()?.arrival())
    }

    fn itinerary(&self) -> Result<Itinerary, ScanError> {
        self.rebuild(self.best()?)
    }
}
