//! Errors from scans.

use crate::access::Direction;
use crate::domain::ConnectionId;
use crate::store::StoreError;

use super::config::ConfigError;

/// Error from querying or running a scan.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// Results were queried before `run`
    #[error("scan has not been run")]
    NotRun,

    /// The scan ran but found no itinerary within the horizon
    #[error("scan found no itinerary")]
    NotSucceeded,

    /// A scan instance runs at most once
    #[error("scan has already been run")]
    AlreadyRun,

    /// The store's departure ordering has not been built
    #[error("connection store is not sorted by departure time")]
    NotSorted,

    /// An access or egress search was passed in the wrong slot
    #[error("expected a {expected:?} search")]
    WrongDirection { expected: Direction },

    /// A time fell outside what a calendar date can represent
    #[error("time is out of the representable range")]
    TimeOutOfRange,

    /// A leg's trip could not be walked back to its boarding connection
    #[error("cannot walk back from connection {0} to its boarding connection")]
    BrokenChain(ConnectionId),

    #[error("invalid scan configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ScanError {
    /// Maps a missing departure ordering to [`ScanError::NotSorted`].
    pub(crate) fn from_store(error: StoreError) -> Self {
        match error {
            StoreError::NotSorted(_) => ScanError::NotSorted,
            other => ScanError::Store(other),
        }
    }
}
