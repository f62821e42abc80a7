//! Driver and parcel input records.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{InstanceValidationError, RecordKind, StationId, StationNetwork};

/// Minutes since the start of the day.
pub type Minutes = u32;

/// Carrying volume in abstract units.
pub type Volume = u32;

/// Number of minutes in a planning day; valid times are `0..MINUTES_PER_DAY`.
pub const MINUTES_PER_DAY: Minutes = 1440;

/// A courier trip offered between two stations.
///
/// Drivers accept detours up to `epsilon` (fractional extra distance) and
/// delays up to `gamma` (fractional extra travel time), and will hold a
/// parcel for at most `hold` minutes at a stopover.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DriverRecord {
    /// Unique driver identifier.
    pub id: u64,
    /// Station the trip starts from.
    pub source: StationId,
    /// Station the trip ends at.
    pub target: StationId,
    /// Fractional detour tolerance.
    pub epsilon: f64,
    /// Fractional delay tolerance.
    pub gamma: f64,
    /// Earliest departure from `source`.
    pub earliest_departure: Minutes,
    /// Latest arrival at `target`.
    pub latest_arrival: Minutes,
    /// Longest time a parcel may be held at a stopover.
    pub hold: Minutes,
    /// Distance units travelled per hour.
    pub speed: f64,
    /// Volume the driver can carry at once.
    pub capacity: Volume,
}

impl DriverRecord {
    /// Check the record against the network it will run on.
    ///
    /// # Errors
    ///
    /// Returns the first [`InstanceValidationError`] found.
    pub fn validate(&self, network: &StationNetwork) -> Result<(), InstanceValidationError> {
        let kind = RecordKind::Driver;
        for station in [self.source, self.target] {
            if !network.contains(station) {
                return Err(InstanceValidationError::UnknownStation {
                    kind,
                    id: self.id,
                    station,
                });
            }
        }
        if !(self.speed.is_finite() && self.speed > 0.0) {
            return Err(InstanceValidationError::NonPositiveSpeed { driver: self.id });
        }
        let tolerances_valid = [self.epsilon, self.gamma]
            .iter()
            .all(|tolerance| tolerance.is_finite() && *tolerance >= 0.0);
        if !tolerances_valid {
            return Err(InstanceValidationError::InvalidTolerance { driver: self.id });
        }
        check_window(kind, self.id, self.earliest_departure, self.latest_arrival)
    }
}

/// A parcel waiting to be shipped between two stations.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParcelRecord {
    /// Unique parcel identifier.
    pub id: u64,
    /// Pickup station.
    pub start: StationId,
    /// Delivery station.
    pub end: StationId,
    /// Earliest pickup time.
    pub earliest_departure: Minutes,
    /// Latest delivery time.
    pub latest_arrival: Minutes,
    /// Fallback price charged by a shipping company if no driver carries it.
    pub shipping_cost: f64,
    /// Space the parcel takes up.
    pub volume: Volume,
}

impl ParcelRecord {
    /// Check the record against the network it will be shipped on.
    ///
    /// # Errors
    ///
    /// Returns the first [`InstanceValidationError`] found.
    pub fn validate(&self, network: &StationNetwork) -> Result<(), InstanceValidationError> {
        let kind = RecordKind::Parcel;
        for station in [self.start, self.end] {
            if !network.contains(station) {
                return Err(InstanceValidationError::UnknownStation {
                    kind,
                    id: self.id,
                    station,
                });
            }
        }
        if self.start == self.end {
            return Err(InstanceValidationError::SameStartAndEnd { parcel: self.id });
        }
        if !(self.shipping_cost.is_finite() && self.shipping_cost >= 0.0) {
            return Err(InstanceValidationError::InvalidShippingCost { parcel: self.id });
        }
        if self.volume == 0 {
            return Err(InstanceValidationError::ZeroVolume { parcel: self.id });
        }
        check_window(kind, self.id, self.earliest_departure, self.latest_arrival)
    }
}

fn check_window(
    kind: RecordKind,
    id: u64,
    earliest: Minutes,
    latest: Minutes,
) -> Result<(), InstanceValidationError> {
    if let Some(time) = [earliest, latest]
        .into_iter()
        .find(|time| *time >= MINUTES_PER_DAY)
    {
        return Err(InstanceValidationError::TimeOutOfRange { kind, id, time });
    }
    if earliest > latest {
        return Err(InstanceValidationError::InvertedWindow { kind, id });
    }
    Ok(())
}
