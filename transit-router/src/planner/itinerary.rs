//! Itinerary reconstruction.
//!
//! A scan result is a chain of legs ending at a target stop. Reconstruction
//! follows the chain backward through the leg arena and, within each leg,
//! walks the trip back from the alighting connection to the boarding one
//! with the store [`Enumerator`]'s `move_to_previous_connection`.
//!
//! [`Enumerator`]: crate::store::Enumerator

use std::fmt;

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::domain::{
    ConnectionId, RouteId, SECONDS_PER_DAY, StopId, TripId, datetime_at, format_hhmmss,
};
use crate::store::{ConnectionStore, SortOrder};

use super::error::ScanError;
use super::legs::{LegArena, LegId, LegOrigin, LegRecord};

/// One part of an itinerary. Times are seconds since the reference midnight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItineraryLeg {
    /// Walk from the origin to the first stop.
    Access {
        to: StopId,
        departure: i64,
        arrival: i64,
    },
    /// Ride one trip run.
    Transit {
        trip: TripId,
        route: Option<RouteId>,
        day: i32,
        from: StopId,
        to: StopId,
        departure: i64,
        arrival: i64,
        /// Connections ridden, in travel order.
        connections: Vec<ConnectionId>,
    },
    /// A pseudo-connection between nearby stops.
    Transfer {
        from: StopId,
        to: StopId,
        departure: i64,
        arrival: i64,
        connection: ConnectionId,
    },
    /// Walk from the last stop to the destination.
    Egress {
        from: StopId,
        departure: i64,
        arrival: i64,
    },
}

impl ItineraryLeg {
    pub fn departure(&self) -> i64 {
        match self {
            ItineraryLeg::Access { departure, .. }
            | ItineraryLeg::Transit { departure, .. }
            | ItineraryLeg::Transfer { departure, .. }
            | ItineraryLeg::Egress { departure, .. } => *departure,
        }
    }

    pub fn arrival(&self) -> i64 {
        match self {
            ItineraryLeg::Access { arrival, .. }
            | ItineraryLeg::Transit { arrival, .. }
            | ItineraryLeg::Transfer { arrival, .. }
            | ItineraryLeg::Egress { arrival, .. } => *arrival,
        }
    }
}

/// A complete journey from origin to destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Itinerary {
    pub reference_date: NaiveDate,
    /// Query departure, seconds since the reference midnight.
    pub departure: i64,
    /// Arrival at the destination, seconds since the reference midnight.
    pub arrival: i64,
    /// Vehicles boarded, pseudo-connections included.
    pub transfers: i32,
    pub legs: Vec<ItineraryLeg>,
}

impl Itinerary {
    pub fn departure_time(&self) -> Option<NaiveDateTime> {
        datetime_at(self.reference_date, self.departure)
    }

    pub fn arrival_time(&self) -> Option<NaiveDateTime> {
        datetime_at(self.reference_date, self.arrival)
    }

    pub fn duration(&self) -> Duration {
        Duration::seconds(self.arrival - self.departure)
    }

    /// Trips ridden, in travel order.
    pub fn trips(&self) -> Vec<TripId> {
        self.legs
            .iter()
            .filter_map(|leg| match leg {
                ItineraryLeg::Transit { trip, .. } => Some(*trip),
                _ => None,
            })
            .collect()
    }
}

impl fmt::Display for Itinerary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} {} -> {} ({} min, {} transfers)",
            self.reference_date,
            format_hhmmss(self.departure),
            format_hhmmss(self.arrival),
            self.duration().num_minutes(),
            self.transfers
        )?;
        for leg in &self.legs {
            let span = format!(
                "{} - {}",
                format_hhmmss(leg.departure()),
                format_hhmmss(leg.arrival())
            );
            match leg {
                ItineraryLeg::Access { to, .. } => writeln!(f, "  {span}  walk to stop {to}")?,
                ItineraryLeg::Transit {
                    trip, from, to, day, ..
                } => {
                    let on = if *day == 0 {
                        String::new()
                    } else {
                        format!(" (day {day:+})")
                    };
                    writeln!(f, "  {span}  trip {trip}{on} from stop {from} to stop {to}")?
                }
                ItineraryLeg::Transfer { from, to, .. } => {
                    writeln!(f, "  {span}  transfer from stop {from} to stop {to}")?
                }
                ItineraryLeg::Egress { from, .. } => {
                    writeln!(f, "  {span}  walk from stop {from}")?
                }
            }
        }
        Ok(())
    }
}

/// Where a result chain ends.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ChainEnd {
    pub stop: StopId,
    /// Forward arrival at `stop`, absolute seconds.
    pub arrival: i64,
    pub transfers: i32,
    pub connection: Option<ConnectionId>,
    pub leg: Option<LegId>,
    /// Cost from `stop` to the destination.
    pub egress_seconds: i64,
}

/// Rebuild the itinerary ending at `end`.
pub(crate) fn reconstruct(
    store: &ConnectionStore,
    legs: &LegArena,
    reference_date: NaiveDate,
    start: i64,
    end: ChainEnd,
) -> Result<Itinerary, ScanError> {
    let arrival = end.arrival + end.egress_seconds;
    let mut reversed = Vec::new();

    if end.egress_seconds > 0 {
        reversed.push(ItineraryLeg::Egress {
            from: end.stop,
            departure: end.arrival,
            arrival,
        });
    }

    let (first_stop, access_arrival) = match (end.connection, end.leg) {
        (Some(mut alight), Some(mut leg_id)) => loop {
            let leg = legs.get(leg_id).ok_or(ScanError::BrokenChain(alight))?;
            reversed.push(ride(store, leg, alight)?);

            match leg.origin {
                LegOrigin::Access { arrival } => {
                    break (store.connection(leg.board)?.departure_stop(), arrival);
                }
                LegOrigin::Transfer {
                    alight: previous,
                    leg: previous_leg,
                } => {
                    alight = previous;
                    leg_id = previous_leg;
                }
            }
        },
        _ => (end.stop, end.arrival),
    };

    if access_arrival > start {
        reversed.push(ItineraryLeg::Access {
            to: first_stop,
            departure: start,
            arrival: access_arrival,
        });
    }

    reversed.reverse();
    Ok(Itinerary {
        reference_date,
        departure: start,
        arrival,
        transfers: end.transfers,
        legs: reversed,
    })
}

/// The part of `leg` from its boarding connection to `alight`.
fn ride(
    store: &ConnectionStore,
    leg: &LegRecord,
    alight: ConnectionId,
) -> Result<ItineraryLeg, ScanError> {
    let offset = i64::from(leg.day) * SECONDS_PER_DAY;
    let first = store.connection(leg.board)?;
    let last = store.connection(alight)?;

    if first.is_pseudo() {
        return Ok(ItineraryLeg::Transfer {
            from: first.departure_stop(),
            to: first.arrival_stop(),
            departure: i64::from(first.departure_time()) + offset,
            arrival: i64::from(first.arrival_time()) + offset,
            connection: leg.board,
        });
    }

    let mut enumerator = store
        .enumerator(SortOrder::Departure)
        .map_err(ScanError::from_store)?;
    if !enumerator.move_to(alight) {
        return Err(ScanError::BrokenChain(alight));
    }

    let mut connections = Vec::new();
    loop {
        let current = enumerator
            .current_id()
            .ok_or(ScanError::BrokenChain(alight))?;
        connections.push(current);
        if current == leg.board {
            break;
        }
        if !enumerator.move_to_previous_connection() {
            return Err(ScanError::BrokenChain(alight));
        }
    }
    connections.reverse();

    Ok(ItineraryLeg::Transit {
        trip: first.trip(),
        route: first.route(),
        day: leg.day,
        from: first.departure_stop(),
        to: last.arrival_stop(),
        departure: i64::from(first.departure_time()) + offset,
        arrival: i64::from(last.arrival_time()) + offset,
        connections,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    /// Trip 0: 0 -> 1 -> 2, trip 1: 2 -> 3, pseudo 3 -> 4.
    fn store() -> ConnectionStore {
        let mut store = ConnectionStore::new();
        store.add(StopId(0), StopId(1), TripId(0), 1_000, 1_100).unwrap(); // 0
        store.add(StopId(1), StopId(2), TripId(0), 1_120, 1_200).unwrap(); // 1
        store.add(StopId(2), StopId(3), TripId(1), 1_500, 1_600).unwrap(); // 2
        store.add_pseudo(StopId(3), StopId(4), 1_600, 1_660).unwrap(); // 3
        store.sort(SortOrder::Departure);
        store
    }

    #[test]
    fn walks_legs_and_trips_backward() {
        let store = store();
        let mut legs = LegArena::new();
        let first = legs.push(LegRecord {
            board: ConnectionId(0),
            day: 0,
            origin: LegOrigin::Access { arrival: 900 },
        });
        let second = legs.push(LegRecord {
            board: ConnectionId(2),
            day: 0,
            origin: LegOrigin::Transfer {
                alight: ConnectionId(1),
                leg: first,
            },
        });
        let third = legs.push(LegRecord {
            board: ConnectionId(3),
            day: 0,
            origin: LegOrigin::Transfer {
                alight: ConnectionId(2),
                leg: second,
            },
        });

        let itinerary = reconstruct(
            &store,
            &legs,
            date(),
            600,
            ChainEnd {
                stop: StopId(4),
                arrival: 1_660,
                transfers: 3,
                connection: Some(ConnectionId(3)),
                leg: Some(third),
                egress_seconds: 40,
            },
        )
        .unwrap();

        assert_eq!(itinerary.departure, 600);
        assert_eq!(itinerary.arrival, 1_700);
        assert_eq!(itinerary.transfers, 3);
        assert_eq!(itinerary.trips(), vec![TripId(0), TripId(1)]);
        assert_eq!(
            itinerary.legs,
            vec![
                ItineraryLeg::Access {
                    to: StopId(0),
                    departure: 600,
                    arrival: 900
                },
                ItineraryLeg::Transit {
                    trip: TripId(0),
                    route: None,
                    day: 0,
                    from: StopId(0),
                    to: StopId(2),
                    departure: 1_000,
                    arrival: 1_200,
                    connections: vec![ConnectionId(0), ConnectionId(1)],
                },
                ItineraryLeg::Transit {
                    trip: TripId(1),
                    route: None,
                    day: 0,
                    from: StopId(2),
                    to: StopId(3),
                    departure: 1_500,
                    arrival: 1_600,
                    connections: vec![ConnectionId(2)],
                },
                ItineraryLeg::Transfer {
                    from: StopId(3),
                    to: StopId(4),
                    departure: 1_600,
                    arrival: 1_660,
                    connection: ConnectionId(3),
                },
                ItineraryLeg::Egress {
                    from: StopId(4),
                    departure: 1_660,
                    arrival: 1_700
                },
            ]
        );
    }

    #[test]
    fn walk_only_itinerary() {
        let store = store();
        let itinerary = reconstruct(
            &store,
            &LegArena::new(),
            date(),
            600,
            ChainEnd {
                stop: StopId(2),
                arrival: 700,
                transfers: 0,
                connection: None,
                leg: None,
                egress_seconds: 50,
            },
        )
        .unwrap();

        assert_eq!(itinerary.duration(), Duration::seconds(150));
        assert_eq!(itinerary.legs.len(), 2);
        assert!(matches!(itinerary.legs[0], ItineraryLeg::Access { to: StopId(2), .. }));
        assert!(matches!(itinerary.legs[1], ItineraryLeg::Egress { from: StopId(2), .. }));
    }

    #[test]
    fn later_day_shifts_times() {
        let store = store();
        let mut legs = LegArena::new();
        let leg = legs.push(LegRecord {
            board: ConnectionId(2),
            day: 1,
            origin: LegOrigin::Access { arrival: 80_000 },
        });

        let itinerary = reconstruct(
            &store,
            &legs,
            date(),
            80_000,
            ChainEnd {
                stop: StopId(3),
                arrival: 1_600 + SECONDS_PER_DAY,
                transfers: 1,
                connection: Some(ConnectionId(2)),
                leg: Some(leg),
                egress_seconds: 0,
            },
        )
        .unwrap();

        assert_eq!(itinerary.legs.len(), 1);
        assert_eq!(itinerary.legs[0].departure(), 1_500 + SECONDS_PER_DAY);
        assert_eq!(
            itinerary.arrival_time(),
            NaiveDate::from_ymd_opt(2024, 3, 16)
                .unwrap()
                .and_hms_opt(0, 26, 40)
        );
    }

    #[test]
    fn mismatched_leg_is_reported() {
        let store = store();
        let mut legs = LegArena::new();
        // Trip 1 is not reachable walking back from trip 0.
        let leg = legs.push(LegRecord {
            board: ConnectionId(2),
            day: 0,
            origin: LegOrigin::Access { arrival: 900 },
        });

        let result = reconstruct(
            &store,
            &legs,
            date(),
            600,
            ChainEnd {
                stop: StopId(2),
                arrival: 1_200,
                transfers: 1,
                connection: Some(ConnectionId(1)),
                leg: Some(leg),
                egress_seconds: 0,
            },
        );
        assert!(matches!(result, Err(ScanError::BrokenChain(ConnectionId(1)))));
    }

    #[test]
    fn display_lists_legs() {
        let itinerary = Itinerary {
            reference_date: date(),
            departure: 27_000,
            arrival: 29_400,
            transfers: 1,
            legs: vec![ItineraryLeg::Transit {
                trip: TripId(5),
                route: None,
                day: 0,
                from: StopId(0),
                to: StopId(1),
                departure: 28_800,
                arrival: 29_400,
                connections: vec![ConnectionId(0)],
            }],
        };

        let text = itinerary.to_string();
        assert!(text.starts_with("2024-03-15 07:30:00 -> 08:10:00 (40 min, 1 transfers)"));
        assert!(text.contains("08:00:00 - 08:10:00  trip 5 from stop 0 to stop 1"));
    }
}
