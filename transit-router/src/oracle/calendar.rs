//! Service calendars.

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDate, Weekday};

use crate::domain::TripId;

use super::TripFeasibilityOracle;

/// Days of the week a trip runs on, within an inclusive date range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyPattern {
    /// Indexed by days from Monday.
    days: [bool; 7],
    start: NaiveDate,
    end: NaiveDate,
}

impl WeeklyPattern {
    /// Runs on the given weekdays between `start` and `end` inclusive.
    pub fn new(weekdays: &[Weekday], start: NaiveDate, end: NaiveDate) -> Self {
        let mut days = [false; 7];
        for day in weekdays {
            days[day.num_days_from_monday() as usize] = true;
        }
        Self { days, start, end }
    }

    /// Runs every day between `start` and `end` inclusive.
    pub fn every_day(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            days: [true; 7],
            start,
            end,
        }
    }

    /// Monday to Friday between `start` and `end` inclusive.
    pub fn weekdays(start: NaiveDate, end: NaiveDate) -> Self {
        use Weekday::*;
        Self::new(&[Mon, Tue, Wed, Thu, Fri], start, end)
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        date >= self.start
            && date <= self.end
            && self.days[date.weekday().num_days_from_monday() as usize]
    }
}

/// Running dates per trip: a weekly pattern plus added and removed dates.
///
/// Exceptions win over the pattern; a trip with neither a pattern nor an
/// added date never runs.
#[derive(Debug, Clone, Default)]
pub struct ServiceCalendar {
    patterns: HashMap<TripId, WeeklyPattern>,
    added: HashSet<(TripId, NaiveDate)>,
    removed: HashSet<(TripId, NaiveDate)>,
}

impl ServiceCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the weekly pattern of a trip, replacing any previous one.
    pub fn set_pattern(&mut self, trip: TripId, pattern: WeeklyPattern) {
        self.patterns.insert(trip, pattern);
    }

    /// The trip runs on `date` regardless of its pattern.
    pub fn add_date(&mut self, trip: TripId, date: NaiveDate) {
        self.removed.remove(&(trip, date));
        self.added.insert((trip, date));
    }

    /// The trip does not run on `date` regardless of its pattern.
    pub fn remove_date(&mut self, trip: TripId, date: NaiveDate) {
        self.added.remove(&(trip, date));
        self.removed.insert((trip, date));
    }
}

impl TripFeasibilityOracle for ServiceCalendar {
    fn is_running(&self, trip: TripId, date: NaiveDate) -> bool {
        if self.removed.contains(&(trip, date)) {
            return false;
        }
        if self.added.contains(&(trip, date)) {
            return true;
        }
        self.patterns
            .get(&trip)
            .is_some_and(|pattern| pattern.covers(date))
    }
}
