//! Binary layout for persisted connection stores.
//!
//! Little-endian throughout: a `u32` record count, then one fixed-width
//! record per connection in insertion order:
//!
//! | field | width |
//! |---|---|
//! | departure stop | u32 |
//! | arrival stop | u32 |
//! | trip | u32 |
//! | route (`u32::MAX` = none) | u32 |
//! | departure time | u32 |
//! | arrival time | u32 |
//!
//! Orderings are not persisted; callers `sort` after loading.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use tracing::debug;

use crate::domain::{Connection, RouteId, StopId, TripId};

use super::connection_store::{ConnectionStore, StoreError};

/// Size in bytes of one persisted record.
pub const RECORD_SIZE: usize = 24;

const NO_ROUTE: u32 = u32::MAX;

/// Records reserved up front; the header count is not trusted beyond this.
const MAX_PREALLOCATED: u32 = 1 << 20;

impl ConnectionStore {
    /// Write every record to `writer`.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), StoreError> {
        writer.write_u32::<LittleEndian>(self.len() as u32)?;

        for connection in self.connections() {
            writer.write_u32::<LittleEndian>(connection.departure_stop().0)?;
            writer.write_u32::<LittleEndian>(connection.arrival_stop().0)?;
            writer.write_u32::<LittleEndian>(connection.trip().0)?;
            writer.write_u32::<LittleEndian>(connection.route().map_or(NO_ROUTE, |r| r.0))?;
            writer.write_u32::<LittleEndian>(connection.departure_time())?;
            writer.write_u32::<LittleEndian>(connection.arrival_time())?;
        }

        Ok(())
    }

    /// Read a store written by [`write_to`](Self::write_to).
    ///
    /// Every record is validated as if it had been added, so a corrupted
    /// file cannot smuggle in a connection that arrives before it departs.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, StoreError> {
        let expected = reader.read_u32::<LittleEndian>()?;
        let mut store = ConnectionStore::with_capacity(expected.min(MAX_PREALLOCATED) as usize);

        for found in 0..expected {
            let connection = match read_record(reader) {
                Ok(connection) => connection?,
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    return Err(StoreError::Truncated { expected, found });
                }
                Err(e) => return Err(e.into()),
            };
            store.push(connection);
        }

        debug!(connections = store.len(), "loaded connection store");
        Ok(store)
    }

    /// Write the store to a file, replacing any existing content.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Load a store from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let mut reader = BufReader::new(File::open(path)?);
        Self::read_from(&mut reader)
    }
}

/// Outer error is I/O, inner is validation.
fn read_record<R: Read>(
    reader: &mut R,
) -> io::Result<Result<Connection, crate::domain::InvalidConnection>> {
    let departure_stop = StopId(reader.read_u32::<LittleEndian>()?);
    let arrival_stop = StopId(reader.read_u32::<LittleEndian>()?);
    let trip = TripId(reader.read_u32::<LittleEndian>()?);
    let route = match reader.read_u32::<LittleEndian>()? {
        NO_ROUTE => None,
        route => Some(RouteId(route)),
    };
    let departure_time = reader.read_u32::<LittleEndian>()?;
    let arrival_time = reader.read_u32::<LittleEndian>()?;

    Ok(Connection::new(
        departure_stop,
        arrival_stop,
        trip,
        route,
        departure_time,
        arrival_time,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ConnectionId;
    use crate::store::SortOrder;

    fn store() -> ConnectionStore {
        let mut store = ConnectionStore::new();
        store
            .add_on_route(StopId(0), StopId(1), TripId(4), RouteId(2), 28800, 29400)
            .unwrap();
        store.add(StopId(1), StopId(2), TripId(5), 29500, 30000).unwrap();
        store.add_pseudo(StopId(2), StopId(3), 30000, 30120).unwrap();
        store
    }

    #[test]
    fn layout_is_count_then_fixed_records() {
        let mut bytes = Vec::new();
        store().write_to(&mut bytes).unwrap();

        assert_eq!(bytes.len(), 4 + 3 * RECORD_SIZE);
        assert_eq!(&bytes[0..4], &3u32.to_le_bytes());
        // First record: route 2
        assert_eq!(&bytes[16..20], &2u32.to_le_bytes());
        // Second record has no route
        assert_eq!(&bytes[4 + RECORD_SIZE + 12..4 + RECORD_SIZE + 16], &u32::MAX.to_le_bytes());
    }

    #[test]
    fn read_back_preserves_records() {
        let original = store();
        let mut bytes = Vec::new();
        original.write_to(&mut bytes).unwrap();

        let loaded = ConnectionStore::read_from(&mut bytes.as_slice()).unwrap();
        assert_eq!(loaded.connections(), original.connections());
        assert!(loaded.get(ConnectionId(2)).unwrap().is_pseudo());
        assert!(!loaded.is_sorted(SortOrder::Departure));
    }

    #[test]
    fn truncated_input_reports_progress() {
        let mut bytes = Vec::new();
        store().write_to(&mut bytes).unwrap();
        bytes.truncate(4 + RECORD_SIZE + 10);

        let err = ConnectionStore::read_from(&mut bytes.as_slice()).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Truncated {
                expected: 3,
                found: 1
            }
        ));
    }

    #[test]
    fn oversized_count_is_truncation() {
        let mut bytes = u32::MAX.to_le_bytes().to_vec();
        bytes.extend_from_slice(&[0; RECORD_SIZE]);

        let err = ConnectionStore::read_from(&mut bytes.as_slice()).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Truncated {
                expected: u32::MAX,
                found: 1
            }
        ));
    }

    #[test]
    fn invalid_record_rejected() {
        let mut bytes = Vec::new();
        bytes.write_u32::<LittleEndian>(1).unwrap();
        for field in [0u32, 1, 0, NO_ROUTE, 500, 400] {
            bytes.write_u32::<LittleEndian>(field).unwrap();
        }

        let err = ConnectionStore::read_from(&mut bytes.as_slice()).unwrap_err();
        assert!(matches!(err, StoreError::InvalidConnection(_)));
    }

    #[test]
    fn save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timetable.bin");

        let original = store();
        original.save(&path).unwrap();
        let loaded = ConnectionStore::load(&path).unwrap();

        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.stop_count(), 4);
        assert_eq!(loaded.connections(), original.connections());
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConnectionStore::load(dir.path().join("missing.bin")).unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
    }
}
