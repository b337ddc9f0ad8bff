//! Trip feasibility: "is trip T running on date D?"
//!
//! The scans consult an oracle lazily, only for trips they try to board,
//! and memoize each answer for the rest of the scan in a
//! [`FeasibilityCache`].

mod calendar;

pub use calendar::{ServiceCalendar, WeeklyPattern};

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::domain::{TripId, TripRun, shift_date};

/// Answers whether a trip operates on a service date.
///
/// Implementations must be pure: the same question always gets the same answer.
pub trait TripFeasibilityOracle {
    fn is_running(&self, trip: TripId, date: NaiveDate) -> bool;
}

/// Oracle for timetables where every trip runs every day.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysRunning;

impl TripFeasibilityOracle for AlwaysRunning {
    fn is_running(&self, _trip: TripId, _date: NaiveDate) -> bool {
        true
    }
}

impl<F> TripFeasibilityOracle for F
where
    F: Fn(TripId, NaiveDate) -> bool,
{
    fn is_running(&self, trip: TripId, date: NaiveDate) -> bool {
        self(trip, date)
    }
}

/// Per-scan memo of oracle answers, keyed by trip run.
pub struct FeasibilityCache<'a> {
    oracle: &'a dyn TripFeasibilityOracle,
    reference_date: NaiveDate,
    answers: HashMap<TripRun, bool>,
    queries: usize,
}

impl<'a> FeasibilityCache<'a> {
    /// `reference_date` is day 0 of the scan.
    pub fn new(oracle: &'a dyn TripFeasibilityOracle, reference_date: NaiveDate) -> Self {
        Self {
            oracle,
            reference_date,
            answers: HashMap::new(),
            queries: 0,
        }
    }

    /// Is this trip running on the scan day it is being boarded on?
    pub fn is_running(&mut self, run: TripRun) -> bool {
        let oracle = self.oracle;
        let reference_date = self.reference_date;
        let queries = &mut self.queries;

        *self.answers.entry(run).or_insert_with(|| {
            *queries += 1;
            shift_date(reference_date, run.day)
                .is_some_and(|date| oracle.is_running(run.trip, date))
        })
    }

    /// How many times the underlying oracle was asked.
    pub fn oracle_queries(&self) -> usize {
        self.queries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[test]
    fn always_running() {
        assert!(AlwaysRunning.is_running(TripId(0), date()));
    }

    #[test]
    fn closure_oracle() {
        let odd_trips = |trip: TripId, _date: NaiveDate| trip.0 % 2 == 1;
        assert!(odd_trips.is_running(TripId(1), date()));
        assert!(!odd_trips.is_running(TripId(2), date()));
    }

    #[test]
    fn cache_memoizes_per_trip_run() {
        let calls = Cell::new(0);
        let oracle = |_trip: TripId, _date: NaiveDate| {
            calls.set(calls.get() + 1);
            true
        };

        let mut cache = FeasibilityCache::new(&oracle, date());
        assert!(cache.is_running(TripRun::new(TripId(1), 0)));
        assert!(cache.is_running(TripRun::new(TripId(1), 0)));
        assert!(cache.is_running(TripRun::new(TripId(1), 1)));

        assert_eq!(calls.get(), 2);
        assert_eq!(cache.oracle_queries(), 2);
    }

    #[test]
    fn cache_asks_about_the_shifted_date() {
        let tomorrow = NaiveDate::from_ymd_opt(2024, 3, 16).unwrap();
        let oracle = move |_trip: TripId, d: NaiveDate| d == tomorrow;

        let mut cache = FeasibilityCache::new(&oracle, date());
        assert!(!cache.is_running(TripRun::new(TripId(0), 0)));
        assert!(cache.is_running(TripRun::new(TripId(0), 1)));
        assert!(!cache.is_running(TripRun::new(TripId(0), -1)));
    }
}
