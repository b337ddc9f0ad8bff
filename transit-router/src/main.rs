use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{NaiveDate, NaiveDateTime};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use transit_router::access::{Direction, StopLinks};
use transit_router::domain::{StopId, TimeError, datetime_at, parse_hhmmss};
use transit_router::planner::{EarliestArrivalScan, ProfileScan, ScanConfig, ScanError, TransitScan};
use transit_router::store::{ConnectionStore, SortOrder, StoreError};

/// Environment variable holding an optional JSON scan configuration.
const CONFIG_VAR: &str = "TRANSIT_SCAN_CONFIG";

#[derive(Debug, Parser)]
#[command(name = "transit-query")]
#[command(about = "Earliest-arrival and profile queries over a persisted timetable")]
struct Query {
    /// Timetable written by `ConnectionStore::save`
    timetable: PathBuf,

    /// Origin stop id
    from: u32,

    /// Destination stop id
    to: u32,

    /// Departure as YYYY-MM-DDTHH:MM or YYYY-MM-DDTHH:MM:SS
    #[arg(value_parser = parse_departure)]
    departure: NaiveDateTime,

    /// List every arrival/transfers trade-off instead of the earliest arrival
    #[arg(long)]
    profile: bool,
}

#[derive(Debug, thiserror::Error)]
enum DepartureError {
    #[error("expected <date>T<time>")]
    MissingSeparator,

    #[error("invalid date: {0}")]
    Date(#[from] chrono::ParseError),

    #[error(transparent)]
    Time(#[from] TimeError),

    #[error("departure is out of range")]
    OutOfRange,
}

/// Schedule-style times are accepted, so `T25:00` is one o'clock the next day.
fn parse_departure(s: &str) -> Result<NaiveDateTime, DepartureError> {
    let (date, time) = s.split_once('T').ok_or(DepartureError::MissingSeparator)?;
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")?;
    let seconds = parse_hhmmss(time)?;
    datetime_at(date, i64::from(seconds)).ok_or(DepartureError::OutOfRange)
}

#[derive(Debug, thiserror::Error)]
enum QueryError {
    #[error("invalid {var}: {0}", var = CONFIG_VAR)]
    InvalidConfig(#[from] serde_json::Error),

    #[error("failed to load timetable: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Scan(#[from] ScanError),
}

fn load_config() -> Result<ScanConfig, QueryError> {
    match std::env::var(CONFIG_VAR) {
        Ok(json) => Ok(ScanConfig::from_json(&json)?),
        Err(_) => Ok(ScanConfig::default()),
    }
}

fn run(query: Query) -> Result<(), QueryError> {
    let config = load_config()?;

    let mut store = ConnectionStore::load(&query.timetable)?;
    store.sort(SortOrder::Departure);
    info!(
        connections = store.len(),
        stops = store.stop_count(),
        "loaded timetable"
    );

    let (from, to) = (StopId(query.from), StopId(query.to));
    let mut source = StopLinks::at_stop(from, Direction::Forward);
    let mut target = StopLinks::at_stop(to, Direction::Backward);

    if query.profile {
        let mut scan = ProfileScan::new(&store, query.departure, config);
        scan.run(&mut source, &mut target)?;
        let itineraries = scan.pareto_itineraries()?;
        if itineraries.is_empty() {
            println!("No itinerary from {from} to {to}");
        }
        for itinerary in itineraries {
            println!("{itinerary}");
        }
    } else {
        let mut scan = EarliestArrivalScan::new(&store, query.departure, config);
        scan.run(&mut source, &mut target)?;
        if scan.has_succeeded() {
            println!("{}", scan.itinerary()?);
        } else {
            println!("No itinerary from {from} to {to}");
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Query::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_query() {
        let query = Query::try_parse_from([
            "transit-query",
            "tt.bin",
            "3",
            "7",
            "2024-03-15T07:30:00",
            "--profile",
        ])
        .unwrap();
        assert_eq!(query.timetable, PathBuf::from("tt.bin"));
        assert_eq!((query.from, query.to), (3, 7));
        assert!(query.profile);
        assert_eq!(query.departure.to_string(), "2024-03-15 07:30:00");
    }

    #[test]
    fn missing_arguments_are_rejected() {
        assert!(Query::try_parse_from(["transit-query", "tt.bin", "3"]).is_err());
    }

    #[test]
    fn rejects_a_bad_stop() {
        assert!(
            Query::try_parse_from(["transit-query", "tt.bin", "x", "7", "2024-03-15T07:30"])
                .is_err()
        );
    }

    #[test]
    fn departure_accepts_minutes_and_schedule_hours() {
        assert_eq!(
            parse_departure("2024-03-15T07:30").unwrap().to_string(),
            "2024-03-15 07:30:00"
        );
        assert_eq!(
            parse_departure("2024-03-15T25:10:00").unwrap().to_string(),
            "2024-03-16 01:10:00"
        );
    }

    #[test]
    fn departure_errors() {
        assert!(matches!(
            parse_departure("2024-03-15 07:30"),
            Err(DepartureError::MissingSeparator)
        ));
        assert!(matches!(
            parse_departure("2024-13-15T07:30"),
            Err(DepartureError::Date(_))
        ));
        assert!(matches!(
            parse_departure("2024-03-15T7:30"),
            Err(DepartureError::Time(_))
        ));
    }
}
