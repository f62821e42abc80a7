//! Station network records.
//!
//! A [`StationNetwork`] is the static input describing the physical
//! transport network: one label per station plus two square distance
//! matrices. Row and column `i` of each matrix describe station `i + 1`.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::InstanceValidationError;

/// Distance between stations in network units.
pub type Distance = u32;

/// Identifier of a station, numbered from `1` to the station count.
///
/// # Examples
/// ```
/// use parcel_match_core::StationId;
///
/// let station = StationId::new(3);
/// assert_eq!(station.get(), 3);
/// assert_eq!(station.index(), Some(2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct StationId(u32);

impl StationId {
    /// Wrap a raw station number.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Raw station number.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Zero-based matrix index, or `None` for the invalid station `0`.
    #[must_use]
    pub fn index(self) -> Option<usize> {
        let index = self.0.checked_sub(1)?;
        usize::try_from(index).ok()
    }

    /// Station for a zero-based matrix index.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        let id = u32::try_from(index).ok()?.checked_add(1)?;
        Some(Self(id))
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Static description of the station network.
///
/// `distances[u][v] == 0` means there is no direct edge between two distinct
/// stations. `direct_distances` is a looser "as the crow flies" bound used
/// only for pruning detour enumeration; it is looked up, never derived.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StationNetwork {
    /// Human-readable station names, one per station.
    pub labels: Vec<String>,
    /// Symmetric edge weights; `0` marks a missing edge.
    pub distances: Vec<Vec<Distance>>,
    /// Direct distance bounds used for pruning.
    pub direct_distances: Vec<Vec<Distance>>,
}

impl StationNetwork {
    /// Number of stations.
    #[must_use]
    pub const fn station_count(&self) -> usize {
        self.labels.len()
    }

    /// Iterate over every station id in ascending order.
    pub fn stations(&self) -> impl Iterator<Item = StationId> + '_ {
        (0..self.station_count()).filter_map(StationId::from_index)
    }

    /// Whether `station` names a station of this network.
    #[must_use]
    pub fn contains(&self, station: StationId) -> bool {
        station
            .index()
            .is_some_and(|index| index < self.station_count())
    }

    /// Label of `station`, if known.
    #[must_use]
    pub fn label(&self, station: StationId) -> Option<&str> {
        self.labels.get(station.index()?).map(String::as_str)
    }

    /// Edge weight between two stations (`0` when there is no edge).
    #[must_use]
    pub fn distance(&self, from: StationId, to: StationId) -> Option<Distance> {
        lookup(&self.distances, from, to)
    }

    /// Direct distance bound between two stations.
    #[must_use]
    pub fn direct_distance(&self, from: StationId, to: StationId) -> Option<Distance> {
        lookup(&self.direct_distances, from, to)
    }

    /// Check the matrices are well formed.
    ///
    /// # Errors
    ///
    /// Returns an [`InstanceValidationError`] describing the first defect.
    ///
    /// # Examples
    /// ```
    /// use parcel_match_core::{InstanceValidationError, StationNetwork};
    ///
    /// let network = StationNetwork {
    ///     labels: vec!["A".into(), "B".into()],
    ///     distances: vec![vec![0, 4], vec![4, 0]],
    ///     direct_distances: vec![vec![0, 3], vec![3, 0]],
    /// };
    /// assert!(network.validate().is_ok());
    ///
    /// let empty = StationNetwork::default();
    /// assert_eq!(empty.validate(), Err(InstanceValidationError::EmptyNetwork));
    /// ```
    pub fn validate(&self) -> Result<(), InstanceValidationError> {
        let count = self.station_count();
        if count == 0 {
            return Err(InstanceValidationError::EmptyNetwork);
        }
        check_square(&self.distances, count, Matrix::Distances)?;
        check_square(&self.direct_distances, count, Matrix::DirectDistances)?;
        for (from, row) in self.stations().zip(&self.distances) {
            for (to, weight) in self.stations().zip(row) {
                if from == to && *weight != 0 {
                    return Err(InstanceValidationError::NonZeroDiagonal { station: from });
                }
                if self.distance(to, from) != Some(*weight) {
                    return Err(InstanceValidationError::AsymmetricDistance { from, to });
                }
            }
        }
        Ok(())
    }
}

/// Which matrix of a [`StationNetwork`] an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matrix {
    /// The edge weight matrix.
    Distances,
    /// The direct distance bound matrix.
    DirectDistances,
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Distances => f.write_str("distances"),
            Self::DirectDistances => f.write_str("direct_distances"),
        }
    }
}

fn lookup(matrix: &[Vec<Distance>], from: StationId, to: StationId) -> Option<Distance> {
    matrix.get(from.index()?)?.get(to.index()?).copied()
}

fn check_square(
    matrix: &[Vec<Distance>],
    count: usize,
    which: Matrix,
) -> Result<(), InstanceValidationError> {
    if matrix.len() != count {
        return Err(InstanceValidationError::MatrixShape {
            matrix: which,
            expected: count,
            found: matrix.len(),
        });
    }
    match matrix.iter().find(|row| row.len() != count) {
        Some(row) => Err(InstanceValidationError::MatrixShape {
            matrix: which,
            expected: count,
            found: row.len(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn triangle() -> StationNetwork {
        StationNetwork {
            labels: vec!["A".into(), "B".into(), "C".into()],
            distances: vec![vec![0, 2, 0], vec![2, 0, 3], vec![0, 3, 0]],
            direct_distances: vec![vec![0, 2, 4], vec![2, 0, 3], vec![4, 3, 0]],
        }
    }

    #[rstest]
    fn station_ids_map_to_matrix_indices() {
        assert_eq!(StationId::new(0).index(), None);
        assert_eq!(StationId::from_index(0), Some(StationId::new(1)));
        let ids: Vec<_> = triangle().stations().collect();
        assert_eq!(ids, vec![StationId::new(1), StationId::new(2), StationId::new(3)]);
    }

    #[rstest]
    fn lookups_use_one_based_ids() {
        let network = triangle();
        assert_eq!(network.distance(StationId::new(2), StationId::new(3)), Some(3));
        assert_eq!(
            network.direct_distance(StationId::new(1), StationId::new(3)),
            Some(4)
        );
        assert_eq!(network.label(StationId::new(2)), Some("B"));
        assert!(!network.contains(StationId::new(4)));
    }

    #[rstest]
    fn well_formed_network_validates() {
        assert_eq!(triangle().validate(), Ok(()));
    }

    #[rstest]
    fn asymmetric_distances_are_rejected() {
        let mut network = triangle();
        if let Some(row) = network.distances.get_mut(0) {
            row[1] = 5;
        }
        assert_eq!(
            network.validate(),
            Err(InstanceValidationError::AsymmetricDistance {
                from: StationId::new(1),
                to: StationId::new(2),
            })
        );
    }

    #[rstest]
    fn non_zero_diagonal_is_rejected() {
        let mut network = triangle();
        if let Some(row) = network.distances.get_mut(1) {
            row[1] = 1;
        }
        assert_eq!(
            network.validate(),
            Err(InstanceValidationError::NonZeroDiagonal {
                station: StationId::new(2)
            })
        );
    }

    #[rstest]
    #[case::short_distance_row(Matrix::Distances)]
    #[case::short_direct_row(Matrix::DirectDistances)]
    fn ragged_matrices_are_rejected(#[case] which: Matrix) {
        let mut network = triangle();
        let matrix = match which {
            Matrix::Distances => &mut network.distances,
            Matrix::DirectDistances => &mut network.direct_distances,
        };
        if let Some(row) = matrix.get_mut(2) {
            row.pop();
        }
        assert_eq!(
            network.validate(),
            Err(InstanceValidationError::MatrixShape {
                matrix: which,
                expected: 3,
                found: 2,
            })
        );
    }
}
