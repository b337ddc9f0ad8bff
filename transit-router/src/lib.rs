//! Connection-scan transit router.
//!
//! Answers: "leaving this stop at this time, what is the earliest I can
//! reach that stop, and what are my options with fewer changes?"
//!
//! The timetable is a flat, sorted array of elementary connections
//! ([`store::ConnectionStore`]). The scans in [`planner`] make one pass over
//! it, consulting an [`access::AccessEgressSearch`] for the walk at either
//! end and an [`oracle::TripFeasibilityOracle`] for which trips run on the
//! day.

pub mod access;
pub mod domain;
pub mod oracle;
pub mod planner;
pub mod store;
