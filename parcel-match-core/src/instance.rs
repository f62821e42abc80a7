//! Matching instances and their validation.

use std::collections::HashSet;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{DriverRecord, Matrix, Minutes, ParcelRecord, StationId, StationNetwork};

/// Weight applied to an assigned parcel's travel distance before
/// [`ObjectiveWeights::travel_distance`].
pub const TRAVEL_DISTANCE_FACTOR: f64 = 0.3;

/// Coefficients of the objective function.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct ObjectiveWeights {
    /// Cost per unit of distance an assigned parcel travels.
    pub travel_distance: f64,
    /// Cost per transfer between offers.
    pub parcel_transfer: f64,
    /// Multiplier on the fallback shipping cost of unassigned parcels.
    pub shipping_cost: f64,
    /// Cost per stop a driver makes.
    pub waiting_time: f64,
    /// Cost per minute a driver spends beyond their shortest trip.
    pub extra_time: f64,
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        Self {
            travel_distance: 1.0,
            parcel_transfer: 1.0,
            shipping_cost: 1.0,
            waiting_time: 1.0,
            extra_time: 1.0,
        }
    }
}

impl ObjectiveWeights {
    fn named(&self) -> [(&'static str, f64); 5] {
        [
            ("travel_distance", self.travel_distance),
            ("parcel_transfer", self.parcel_transfer),
            ("shipping_cost", self.shipping_cost),
            ("waiting_time", self.waiting_time),
            ("extra_time", self.extra_time),
        ]
    }
}

/// Everything a matcher needs for one run.
///
/// # Examples
/// ```
/// use parcel_match_core::{Instance, ObjectiveWeights, StationNetwork};
///
/// let instance = Instance {
///     network: StationNetwork {
///         labels: vec!["Depot".into(), "Market".into()],
///         distances: vec![vec![0, 8], vec![8, 0]],
///         direct_distances: vec![vec![0, 8], vec![8, 0]],
///     },
///     drivers: Vec::new(),
///     parcels: Vec::new(),
///     weights: ObjectiveWeights::default(),
/// };
/// assert!(instance.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Instance {
    /// Station network shared by all drivers and parcels.
    pub network: StationNetwork,
    /// Driver trips available for carrying parcels.
    #[cfg_attr(feature = "serde", serde(default))]
    pub drivers: Vec<DriverRecord>,
    /// Parcels to route.
    #[cfg_attr(feature = "serde", serde(default))]
    pub parcels: Vec<ParcelRecord>,
    /// Objective coefficients.
    #[cfg_attr(feature = "serde", serde(default))]
    pub weights: ObjectiveWeights,
}

impl Instance {
    /// Validate the network, every record and the weights.
    ///
    /// # Errors
    ///
    /// Returns the first [`InstanceValidationError`] found. Networks are
    /// checked before records so record errors can assume a sound network.
    pub fn validate(&self) -> Result<(), InstanceValidationError> {
        self.network.validate()?;
        if let Some((name, _)) = self
            .weights
            .named()
            .into_iter()
            .find(|(_, weight)| !weight.is_finite())
        {
            return Err(InstanceValidationError::NonFiniteWeight { name });
        }

        let mut driver_ids = HashSet::with_capacity(self.drivers.len());
        for driver in &self.drivers {
            if !driver_ids.insert(driver.id) {
                return Err(InstanceValidationError::DuplicateId {
                    kind: RecordKind::Driver,
                    id: driver.id,
                });
            }
            driver.validate(&self.network)?;
        }

        let mut parcel_ids = HashSet::with_capacity(self.parcels.len());
        for parcel in &self.parcels {
            if !parcel_ids.insert(parcel.id) {
                return Err(InstanceValidationError::DuplicateId {
                    kind: RecordKind::Parcel,
                    id: parcel.id,
                });
            }
            parcel.validate(&self.network)?;
        }
        Ok(())
    }
}

/// Kind of record an [`InstanceValidationError`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// A [`DriverRecord`].
    Driver,
    /// A [`ParcelRecord`].
    Parcel,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Driver => f.write_str("driver"),
            Self::Parcel => f.write_str("parcel"),
        }
    }
}

/// Reasons an [`Instance`] is rejected before matching starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstanceValidationError {
    /// The network has no stations.
    #[error("station network is empty")]
    EmptyNetwork,
    /// A matrix does not have one row and column per station.
    #[error("{matrix} matrix must be {expected}x{expected}, found a dimension of {found}")]
    MatrixShape {
        /// Matrix at fault.
        matrix: Matrix,
        /// Station count.
        expected: usize,
        /// Offending row count or row length.
        found: usize,
    },
    /// `distances[from][to] != distances[to][from]`.
    #[error("distance from station {from} to {to} differs from the reverse direction")]
    AsymmetricDistance {
        /// Row station.
        from: StationId,
        /// Column station.
        to: StationId,
    },
    /// A station has a non-zero distance to itself.
    #[error("station {station} has a non-zero distance to itself")]
    NonZeroDiagonal {
        /// Offending station.
        station: StationId,
    },
    /// A record names a station outside the network.
    #[error("{kind} {id} refers to unknown station {station}")]
    UnknownStation {
        /// Record kind.
        kind: RecordKind,
        /// Record id.
        id: u64,
        /// Unknown station.
        station: StationId,
    },
    /// Two records of the same kind share an id.
    #[error("duplicate {kind} id {id}")]
    DuplicateId {
        /// Record kind.
        kind: RecordKind,
        /// Repeated id.
        id: u64,
    },
    /// A driver's speed is zero, negative or not a number.
    #[error("driver {driver} must have a positive speed")]
    NonPositiveSpeed {
        /// Driver id.
        driver: u64,
    },
    /// A driver's detour or delay tolerance is negative or not finite.
    #[error("driver {driver} has a negative or non-finite tolerance")]
    InvalidTolerance {
        /// Driver id.
        driver: u64,
    },
    /// A time lies outside the planning day.
    #[error("{kind} {id} uses time {time}, outside the planning day")]
    TimeOutOfRange {
        /// Record kind.
        kind: RecordKind,
        /// Record id.
        id: u64,
        /// Offending time.
        time: Minutes,
    },
    /// Earliest departure is after latest arrival.
    #[error("{kind} {id} has an earliest departure after its latest arrival")]
    InvertedWindow {
        /// Record kind.
        kind: RecordKind,
        /// Record id.
        id: u64,
    },
    /// A parcel starts where it should be delivered.
    #[error("parcel {parcel} starts and ends at the same station")]
    SameStartAndEnd {
        /// Parcel id.
        parcel: u64,
    },
    /// A parcel's shipping cost is negative or not finite.
    #[error("parcel {parcel} has a negative or non-finite shipping cost")]
    InvalidShippingCost {
        /// Parcel id.
        parcel: u64,
    },
    /// A parcel takes up no space.
    #[error("parcel {parcel} has zero volume")]
    ZeroVolume {
        /// Parcel id.
        parcel: u64,
    },
    /// An objective weight is not finite.
    #[error("objective weight {name} must be finite")]
    NonFiniteWeight {
        /// Weight field name.
        name: &'static str,
    },
}
