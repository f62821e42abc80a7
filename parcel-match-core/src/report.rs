//! Result records produced by a matcher.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Minutes, StationId};

/// One stop of an assigned parcel's itinerary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PathStop {
    /// Station the parcel is at.
    pub station: StationId,
    /// Time the parcel is at `station`.
    pub time: Minutes,
    /// Offer the parcel travels under at this stop.
    pub offer: u64,
}

/// Outcome for a single parcel.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParcelAssignment {
    /// Parcel id.
    pub parcel_id: u64,
    /// Whether a driver itinerary was found.
    pub assigned: bool,
    /// Itinerary; empty when unassigned.
    pub path: Vec<PathStop>,
    /// Number of offer segments the itinerary uses.
    pub num_offers: usize,
    /// Drivers carrying the parcel, in travel order.
    pub driver_ids: Vec<u64>,
    /// Contribution to the objective.
    pub cost: f64,
}

/// Route a driver ends up driving.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DriverRoute {
    /// Driver id.
    pub driver_id: u64,
    /// Stations visited, from source to target.
    pub stations: Vec<StationId>,
    /// Departure time used for this run.
    pub departure_time: Minutes,
    /// Stops strictly between source and target.
    pub num_stops: usize,
    /// Travel time along `stations`.
    pub real_duration: Minutes,
    /// Travel time of the direct trip.
    pub shortest_duration: Minutes,
    /// Contribution to the objective.
    pub cost: f64,
}

/// Full result of a matching run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MatchReport {
    /// One entry per input parcel, in input order.
    pub parcels: Vec<ParcelAssignment>,
    /// One entry per input driver, in input order.
    pub drivers: Vec<DriverRoute>,
    /// Total objective value of the reported assignment.
    pub objective: f64,
    /// Objective value if no parcel were assigned.
    pub unmatched_objective: f64,
    /// Number of assignment passes run.
    pub iterations: usize,
    /// Zero-based pass that produced this assignment.
    pub best_iteration: usize,
}

impl MatchReport {
    /// Number of parcels carried by drivers.
    #[must_use]
    pub fn assigned_count(&self) -> usize {
        self.parcels.iter().filter(|parcel| parcel.assigned).count()
    }

    /// Percentage saved against shipping every parcel with the fallback
    /// company, or `None` when that baseline is zero.
    ///
    /// # Examples
    /// ```
    /// use parcel_match_core::MatchReport;
    ///
    /// let report = MatchReport {
    ///     parcels: Vec::new(),
    ///     drivers: Vec::new(),
    ///     objective: 30.0,
    ///     unmatched_objective: 120.0,
    ///     iterations: 1,
    ///     best_iteration: 0,
    /// };
    /// assert_eq!(report.saving_percent(), Some(75.0));
    /// ```
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "saving is a ratio of floating-point objective values"
    )]
    pub fn saving_percent(&self) -> Option<f64> {
        if self.unmatched_objective == 0.0 {
            return None;
        }
        Some((self.unmatched_objective - self.objective) / self.unmatched_objective * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn assignment(parcel_id: u64, assigned: bool) -> ParcelAssignment {
        ParcelAssignment {
            parcel_id,
            assigned,
            path: Vec::new(),
            num_offers: usize::from(assigned),
            driver_ids: Vec::new(),
            cost: 0.0,
        }
    }

    #[rstest]
    fn counts_assigned_parcels() {
        let report = MatchReport {
            parcels: vec![assignment(1, true), assignment(2, false), assignment(3, true)],
            drivers: Vec::new(),
            objective: 0.0,
            unmatched_objective: 0.0,
            iterations: 1,
            best_iteration: 0,
        };
        assert_eq!(report.assigned_count(), 2);
        assert_eq!(report.saving_percent(), None);
    }
}
