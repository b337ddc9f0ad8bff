//! Connection storage.
//!
//! The store is built once by the timetable importer, sorted, and then
//! shared read-only by every scan.

mod connection_store;
mod enumerator;
mod persist;

pub use connection_store::{ConnectionStore, SortOrder, StoreError};
pub use enumerator::Enumerator;
pub use persist::RECORD_SIZE;
