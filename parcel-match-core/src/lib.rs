//! Core records for the parcel matching engine.
//!
//! This crate holds the plain data exchanged with a matcher: the station
//! network, driver and parcel records, objective weights, and the report a
//! matcher produces. Constructors stay simple; [`Instance::validate`] checks
//! the whole input up front so engines can assume sound records.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod instance;
mod matcher;
mod network;
mod records;
mod report;

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;

pub use instance::{
    Instance, InstanceValidationError, ObjectiveWeights, RecordKind, TRAVEL_DISTANCE_FACTOR,
};
pub use matcher::{MatchError, Matcher};
pub use network::{Distance, Matrix, StationId, StationNetwork};
pub use records::{DriverRecord, MINUTES_PER_DAY, Minutes, ParcelRecord, Volume};
pub use report::{DriverRoute, MatchReport, ParcelAssignment, PathStop};
