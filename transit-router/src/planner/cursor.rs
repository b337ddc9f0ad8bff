//! Multi-day departure cursor.
//!
//! The store holds one service day. A scan that runs past midnight sees the
//! same records again on the next day, shifted by 86400 seconds, and a
//! scan starting just after midnight may still catch records of the previous
//! service day timed at 24:00:00 or later. The cursor merges all relevant day
//! copies of the departure ordering into one sequence of non-decreasing
//! absolute departure times.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::domain::{Connection, ConnectionId, SECONDS_PER_DAY};
use crate::store::{ConnectionStore, Enumerator, SortOrder, StoreError};

/// One record as seen on one scan day.
#[derive(Debug, Clone, Copy)]
pub struct ScannedConnection<'a> {
    pub id: ConnectionId,
    pub connection: &'a Connection,
    /// Day relative to the reference date.
    pub day: i32,
    /// Departure in seconds since the reference midnight.
    pub departure: i64,
    /// Arrival in seconds since the reference midnight.
    pub arrival: i64,
}

/// Merges day-shifted copies of the departure ordering.
pub struct DepartureCursor<'a> {
    days: Vec<(i32, Enumerator<'a>)>,
    /// Next absolute departure per day slot, smallest first.
    heap: BinaryHeap<Reverse<(i64, usize)>>,
}

impl<'a> DepartureCursor<'a> {
    /// Cursor over every record departing at or after `start`, using day
    /// copies up to the day containing `end` (both seconds since the
    /// reference midnight). Callers stop at their own horizon.
    pub fn new(store: &'a ConnectionStore, start: i64, end: i64) -> Result<Self, StoreError> {
        let first_day = -(i64::from(store.max_departure_time()) / SECONDS_PER_DAY);
        let last_day = end.div_euclid(SECONDS_PER_DAY);

        let mut cursor = Self {
            days: Vec::new(),
            heap: BinaryHeap::new(),
        };

        for day in first_day..=last_day {
            let offset = day * SECONDS_PER_DAY;
            let mut enumerator = store.enumerator(SortOrder::Departure)?;

            let threshold = start - offset;
            let positioned = if threshold <= 0 {
                enumerator.move_next()
            } else {
                u32::try_from(threshold)
                    .map(|t| enumerator.move_to_departure_time(t))
                    .unwrap_or(false)
            };
            if !positioned {
                continue;
            }

            let slot = cursor.days.len();
            cursor.days.push((day as i32, enumerator));
            cursor.push_current(slot);
        }

        Ok(cursor)
    }

    fn push_current(&mut self, slot: usize) {
        let (day, enumerator) = &self.days[slot];
        if let Some(connection) = enumerator.current() {
            let departure =
                i64::from(connection.departure_time()) + i64::from(*day) * SECONDS_PER_DAY;
            self.heap.push(Reverse((departure, slot)));
        }
    }
}

impl<'a> Iterator for DepartureCursor<'a> {
    type Item = ScannedConnection<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let Reverse((departure, slot)) = self.heap.pop()?;

        let (day, enumerator) = &mut self.days[slot];
        let day = *day;
        let id = enumerator.current_id()?;
        let connection = enumerator.current()?;
        let advanced = enumerator.move_next();

        if advanced {
            self.push_current(slot);
        }

        let offset = i64::from(day) * SECONDS_PER_DAY;
        Some(ScannedConnection {
            id,
            connection,
            day,
            departure,
            arrival: i64::from(connection.arrival_time()) + offset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{StopId, TripId};

    fn store(times: &[(u32, u32)]) -> ConnectionStore {
        let mut store = ConnectionStore::new();
        for (i, (dep, arr)) in times.iter().enumerate() {
            store
                .add(StopId(0), StopId(1), TripId(i as u32), *dep, *arr)
                .unwrap();
        }
        store.sort(SortOrder::Departure);
        store
    }

    fn departures(cursor: DepartureCursor<'_>) -> Vec<(i64, i32)> {
        cursor.map(|s| (s.departure, s.day)).collect()
    }

    #[test]
    fn single_day_starts_at_first_eligible_departure() {
        let store = store(&[(100, 200), (300, 400), (500, 600)]);
        let cursor = DepartureCursor::new(&store, 250, 1_000).unwrap();
        assert_eq!(departures(cursor), vec![(300, 0), (500, 0)]);
    }

    #[test]
    fn wraps_into_next_day() {
        let store = store(&[(100, 200), (80_000, 80_100)]);
        let cursor = DepartureCursor::new(&store, 50_000, 50_000 + SECONDS_PER_DAY).unwrap();
        assert_eq!(
            departures(cursor),
            vec![(80_000, 0), (86_500, 1), (166_400, 1)]
        );
    }

    #[test]
    fn includes_previous_day_after_midnight_runs() {
        // A run timed 24:30 on the previous service day departs at 00:30 today.
        let store = store(&[(88_200, 88_800), (3_000, 3_600)]);
        let cursor = DepartureCursor::new(&store, 600, 10_000).unwrap();

        let scanned: Vec<_> = cursor.map(|s| (s.departure, s.day, s.arrival)).collect();
        assert_eq!(
            scanned,
            vec![(1_800, -1, 2_400), (3_000, 0, 3_600), (88_200, 0, 88_800)]
        );
    }

    #[test]
    fn empty_store_yields_nothing() {
        let store = store(&[]);
        let mut cursor = DepartureCursor::new(&store, 0, SECONDS_PER_DAY).unwrap();
        assert!(cursor.next().is_none());
    }

    #[test]
    fn requires_departure_ordering() {
        let mut store = ConnectionStore::new();
        store.add(StopId(0), StopId(1), TripId(0), 0, 1).unwrap();
        assert!(matches!(
            DepartureCursor::new(&store, 0, 10),
            Err(StoreError::NotSorted(SortOrder::Departure))
        ));
    }
}
