use parcel_match_core::{InstanceValidationError, MatchError};
use thiserror::Error;

use crate::heap::HeapError;
use crate::offer::OfferId;
use crate::station_graph::StationGraphError;
use crate::time_expanded::{EdgeId, VertexId};

/// Errors raised while building or running the matching engine.
///
/// Everything except [`EngineError::InvalidInstance`] indicates a broken
/// internal invariant rather than bad input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The instance failed validation.
    #[error(transparent)]
    InvalidInstance(#[from] InstanceValidationError),
    /// A station graph query failed.
    #[error(transparent)]
    StationGraph(#[from] StationGraphError),
    /// The priority queue was misused.
    #[error("priority queue misuse: {0}")]
    Heap(#[from] HeapError),
    /// A vertex id does not exist in the time-expanded graph.
    #[error("unknown time vertex {0}")]
    UnknownVertex(VertexId),
    /// An edge id does not exist in the time-expanded graph.
    #[error("unknown time edge {0}")]
    UnknownEdge(EdgeId),
    /// An offer id was never issued.
    #[error("unknown offer {0}")]
    UnknownOffer(OfferId),
    /// A driver index is out of range.
    #[error("unknown driver index {0}")]
    UnknownDriver(usize),
}

impl From<EngineError> for MatchError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidInstance(source) => Self::InvalidInstance(source),
            EngineError::StationGraph(StationGraphError::InvalidNetwork(source)) => {
                Self::InvalidInstance(source)
            }
            other => Self::InvariantViolation {
                detail: other.to_string(),
            },
        }
    }
}
