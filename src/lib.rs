//! Facade crate for the parcel matching engine.
//!
//! This crate re-exports the core records and, behind the `engine` feature,
//! the greedy matcher that assigns parcels to driver offers.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use parcel_match_core::{
    DriverRecord, DriverRoute, Instance, InstanceValidationError, MatchError, MatchReport,
    Matcher, ObjectiveWeights, ParcelAssignment, ParcelRecord, PathStop, StationId,
    StationNetwork,
};

#[cfg(feature = "engine")]
#[cfg_attr(docsrs, doc(cfg(feature = "engine")))]
pub use parcel_match_engine::{GreedyMatcher, GreedyMatcherConfig, MatchingModel, ShuffleMode};
