//! Static station graph with precomputed all-pairs shortest distances.
//!
//! Distances are computed once, one Dijkstra run per source over the
//! [`FibonacciHeap`], and every later query is a table lookup. The
//! feasibility predicates used to expand offers rely on these tables only.

use parcel_match_core::{Distance, InstanceValidationError, Minutes, StationId, StationNetwork};
use thiserror::Error;

use crate::driver::Pace;
use crate::heap::{FibonacciHeap, Handle, HeapError};
use crate::offer::OfferTerms;

const UNREACHED: u64 = u64::MAX;

/// Errors returned by [`StationGraph`] queries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StationGraphError {
    /// The network failed validation.
    #[error("invalid station network: {0}")]
    InvalidNetwork(#[from] InstanceValidationError),
    /// The station id is not part of the graph.
    #[error("unknown station {0}")]
    UnknownStation(StationId),
    /// No path connects the two stations.
    #[error("station {to} is unreachable from station {from}")]
    Unreachable {
        /// Origin station.
        from: StationId,
        /// Destination station.
        to: StationId,
    },
    /// The priority queue was misused while computing distances.
    #[error("priority queue misuse: {0}")]
    Heap(#[from] HeapError),
}

/// A simple station path found by [`StationGraph::max_detour_paths`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetourPath {
    /// Stations from origin to destination.
    pub stations: Vec<StationId>,
    /// Sum of edge weights along `stations`.
    pub distance: Distance,
}

/// Undirected weighted station graph.
///
/// # Examples
/// ```
/// use parcel_match_core::{StationId, StationNetwork};
/// use parcel_match_engine::StationGraph;
///
/// # fn main() -> Result<(), parcel_match_engine::StationGraphError> {
/// let network = StationNetwork {
///     labels: vec!["A".into(), "B".into(), "C".into()],
///     distances: vec![vec![0, 4, 0], vec![4, 0, 6], vec![0, 6, 0]],
///     direct_distances: vec![vec![0, 4, 9], vec![4, 0, 6], vec![9, 6, 0]],
/// };
/// let graph = StationGraph::new(&network)?;
/// let (a, c) = (StationId::new(1), StationId::new(3));
/// assert_eq!(graph.shortest_distance(a, c)?, 10);
/// assert_eq!(graph.shortest_path(a, c)?, vec![a, StationId::new(2), c]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct StationGraph {
    labels: Vec<String>,
    adjacency: Vec<Vec<(usize, Distance)>>,
    direct: Vec<Vec<Distance>>,
    shortest: Vec<Vec<Option<Distance>>>,
    predecessors: Vec<Vec<Option<usize>>>,
}

impl StationGraph {
    /// Validate `network` and precompute shortest distances between every
    /// pair of stations.
    ///
    /// # Errors
    ///
    /// [`StationGraphError::InvalidNetwork`] for malformed matrices.
    pub fn new(network: &StationNetwork) -> Result<Self, StationGraphError> {
        network.validate()?;
        let adjacency: Vec<Vec<(usize, Distance)>> = network
            .distances
            .iter()
            .enumerate()
            .map(|(from, row)| {
                row.iter()
                    .enumerate()
                    .filter(|(to, weight)| *to != from && **weight != 0)
                    .map(|(to, weight)| (to, *weight))
                    .collect()
            })
            .collect();

        let mut shortest = Vec::with_capacity(adjacency.len());
        let mut predecessors = Vec::with_capacity(adjacency.len());
        for source in 0..adjacency.len() {
            let (distances, parents) = single_source(&adjacency, source)?;
            shortest.push(distances);
            predecessors.push(parents);
        }
        Ok(Self {
            labels: network.labels.clone(),
            adjacency,
            direct: network.direct_distances.clone(),
            shortest,
            predecessors,
        })
    }

    /// Number of stations.
    #[must_use]
    pub const fn station_count(&self) -> usize {
        self.labels.len()
    }

    /// Every station id in ascending order.
    pub fn stations(&self) -> impl Iterator<Item = StationId> + '_ {
        (0..self.station_count()).filter_map(StationId::from_index)
    }

    fn index(&self, station: StationId) -> Result<usize, StationGraphError> {
        station
            .index()
            .filter(|index| *index < self.station_count())
            .ok_or(StationGraphError::UnknownStation(station))
    }

    /// Station label.
    ///
    /// # Errors
    ///
    /// [`StationGraphError::UnknownStation`] for ids outside the graph.
    pub fn label(&self, station: StationId) -> Result<&str, StationGraphError> {
        let index = self.index(station)?;
        self.labels
            .get(index)
            .map(String::as_str)
            .ok_or(StationGraphError::UnknownStation(station))
    }

    /// Direct distance bound between two stations, as given in the input.
    ///
    /// # Errors
    ///
    /// [`StationGraphError::UnknownStation`] for ids outside the graph.
    pub fn direct_distance(&self, from: StationId, to: StationId) -> Result<Distance, StationGraphError> {
        let (row, column) = (self.index(from)?, self.index(to)?);
        self.direct
            .get(row)
            .and_then(|distances| distances.get(column))
            .copied()
            .ok_or(StationGraphError::UnknownStation(to))
    }

    /// Precomputed shortest distance, `None` when `to` is unreachable.
    ///
    /// # Errors
    ///
    /// [`StationGraphError::UnknownStation`] for ids outside the graph.
    pub fn reachable_distance(
        &self,
        from: StationId,
        to: StationId,
    ) -> Result<Option<Distance>, StationGraphError> {
        let (row, column) = (self.index(from)?, self.index(to)?);
        self.shortest
            .get(row)
            .and_then(|distances| distances.get(column))
            .copied()
            .ok_or(StationGraphError::UnknownStation(to))
    }

    /// Precomputed shortest distance.
    ///
    /// # Errors
    ///
    /// [`StationGraphError::UnknownStation`] for ids outside the graph and
    /// [`StationGraphError::Unreachable`] when no path exists.
    pub fn shortest_distance(&self, from: StationId, to: StationId) -> Result<Distance, StationGraphError> {
        self.reachable_distance(from, to)?
            .ok_or(StationGraphError::Unreachable { from, to })
    }

    /// Stations along a shortest path, both ends included.
    ///
    /// # Errors
    ///
    /// As for [`StationGraph::shortest_distance`].
    pub fn shortest_path(&self, from: StationId, to: StationId) -> Result<Vec<StationId>, StationGraphError> {
        self.shortest_distance(from, to)?;
        let (source, mut current) = (self.index(from)?, self.index(to)?);
        let parents = self
            .predecessors
            .get(source)
            .ok_or(StationGraphError::UnknownStation(from))?;
        let mut path = vec![to];
        while current != source {
            current = parents
                .get(current)
                .copied()
                .flatten()
                .ok_or(StationGraphError::Unreachable { from, to })?;
            path.push(StationId::from_index(current).ok_or(StationGraphError::UnknownStation(to))?);
        }
        path.reverse();
        Ok(path)
    }

    /// Driving time between two stations at `pace` along a shortest path.
    ///
    /// # Errors
    ///
    /// As for [`StationGraph::shortest_distance`].
    pub fn travel_time(&self, pace: Pace, from: StationId, to: StationId) -> Result<Minutes, StationGraphError> {
        Ok(pace.duration(self.shortest_distance(from, to)?))
    }

    /// Whether the offer may stop at `via` on its way to the target.
    ///
    /// The detour `source → via → target` must fit the offer's distance
    /// budget, and its driving time plus one hold must fit the duration
    /// budget. Unreachable legs are infeasible.
    ///
    /// # Errors
    ///
    /// [`StationGraphError::UnknownStation`] for ids outside the graph.
    pub fn is_feasible(&self, offer: &OfferTerms, via: StationId) -> Result<bool, StationGraphError> {
        self.legs_within_budget(offer, &[offer.source, via, offer.target])
    }

    /// Two-stopover variant of [`StationGraph::is_feasible`] for
    /// `source → first → second → target`.
    ///
    /// # Errors
    ///
    /// [`StationGraphError::UnknownStation`] for ids outside the graph.
    pub fn is_feasible_pair(
        &self,
        offer: &OfferTerms,
        first: StationId,
        second: StationId,
    ) -> Result<bool, StationGraphError> {
        self.legs_within_budget(offer, &[offer.source, first, second, offer.target])
    }

    fn legs_within_budget(&self, offer: &OfferTerms, stops: &[StationId]) -> Result<bool, StationGraphError> {
        let mut legs = Vec::with_capacity(stops.len());
        for pair in stops.windows(2) {
            let [from, to] = pair else { continue };
            match self.reachable_distance(*from, *to)? {
                Some(distance) => legs.push(distance),
                None => return Ok(false),
            }
        }
        Ok(within_budget(offer, &legs))
    }

    /// Every simple path from `source` to `destination` no longer than
    /// `(1 + tolerance)` times the shortest distance.
    ///
    /// Branches are pruned once the direct distance from the next station to
    /// the destination exceeds the remaining budget. Paths are listed in
    /// depth-first order, neighbours visited by ascending station id.
    ///
    /// This is a library query for exploring route alternatives; offer
    /// expansion works from stopover candidates instead.
    ///
    /// # Errors
    ///
    /// As for [`StationGraph::shortest_distance`].
    #[expect(
        clippy::float_arithmetic,
        reason = "the detour budget is a fractional multiple of the shortest distance"
    )]
    pub fn max_detour_paths(
        &self,
        source: StationId,
        destination: StationId,
        tolerance: f64,
    ) -> Result<Vec<DetourPath>, StationGraphError> {
        struct Frame {
            station: usize,
            remaining: f64,
            next_edge: usize,
        }

        let budget = f64::from(self.shortest_distance(source, destination)?) * (1.0 + tolerance);
        let (start, goal) = (self.index(source)?, self.index(destination)?);
        let direct_to_goal: Vec<Distance> = self
            .stations()
            .map(|station| self.direct_distance(station, destination))
            .collect::<Result<_, _>>()?;

        let mut found = Vec::new();
        let mut path = vec![(start, 0)];
        let mut stack = vec![Frame {
            station: start,
            remaining: budget,
            next_edge: 0,
        }];
        while let Some(frame) = stack.last_mut() {
            let (station, remaining) = (frame.station, frame.remaining);
            let edge = self
                .adjacency
                .get(station)
                .and_then(|edges| edges.get(frame.next_edge))
                .copied();
            frame.next_edge += 1;

            if station == goal {
                found.push(self.detour_path(&path)?);
            }
            let Some((next, weight)) = edge.filter(|_| station != goal) else {
                stack.pop();
                path.pop();
                continue;
            };
            let left = remaining - f64::from(weight);
            let bound = direct_to_goal.get(next).copied().unwrap_or(Distance::MAX);
            let visited = path.iter().any(|(stop, _)| *stop == next);
            if left >= 0.0 && f64::from(bound) <= left && !visited {
                path.push((next, weight));
                stack.push(Frame {
                    station: next,
                    remaining: left,
                    next_edge: 0,
                });
            }
        }
        Ok(found)
    }

    fn detour_path(&self, path: &[(usize, Distance)]) -> Result<DetourPath, StationGraphError> {
        let stations = path
            .iter()
            .map(|(index, _)| {
                StationId::from_index(*index).ok_or(StationGraphError::UnknownStation(StationId::new(0)))
            })
            .collect::<Result<_, _>>()?;
        let distance = path
            .iter()
            .fold(0, |total: Distance, (_, weight)| total.saturating_add(*weight));
        Ok(DetourPath { stations, distance })
    }
}

#[expect(
    clippy::float_arithmetic,
    reason = "offer budgets are fractional multiples of integer distances and durations"
)]
fn within_budget(offer: &OfferTerms, legs: &[Distance]) -> bool {
    let distance: f64 = legs.iter().map(|leg| f64::from(*leg)).sum();
    let driving: f64 = legs
        .iter()
        .map(|leg| f64::from(offer.pace.duration(*leg)))
        .sum();
    distance <= offer.max_detour && driving + f64::from(offer.pace.hold) <= offer.max_duration
}

#[expect(
    clippy::indexing_slicing,
    reason = "tables are sized to the adjacency list and indexed by its own vertices"
)]
fn single_source(
    adjacency: &[Vec<(usize, Distance)>],
    source: usize,
) -> Result<(Vec<Option<Distance>>, Vec<Option<usize>>), HeapError> {
    let count = adjacency.len();
    let mut heap = FibonacciHeap::with_capacity(count);
    let handles: Vec<Handle> = (0..count).map(|vertex| heap.push(vertex, UNREACHED)).collect();
    let mut distances = vec![UNREACHED; count];
    let mut parents = vec![None; count];
    distances[source] = 0;
    heap.decrease_key(handles[source], 0)?;

    while !heap.is_empty() {
        let (vertex, distance) = heap.extract_min()?;
        if distance == UNREACHED {
            break;
        }
        for (next, weight) in &adjacency[vertex] {
            let candidate = distance.saturating_add(u64::from(*weight));
            if candidate < distances[*next] {
                distances[*next] = candidate;
                parents[*next] = Some(vertex);
                heap.decrease_key(handles[*next], candidate)?;
            }
        }
    }
    let distances = distances
        .into_iter()
        .map(|distance| Distance::try_from(distance).ok())
        .collect();
    Ok((distances, parents))
}

#[cfg(test)]
mod tests {
    use super::*;
    use parcel_match_core::test_support::line_network;
    use proptest::prelude::*;
    use rstest::{fixture, rstest};

    fn station(id: u32) -> StationId {
        StationId::new(id)
    }

    /// Square `1-2-3-4-1` with a long chord `1-3`.
    #[fixture]
    fn square() -> StationGraph {
        let network = StationNetwork {
            labels: vec!["N".into(), "E".into(), "S".into(), "W".into()],
            distances: vec![
                vec![0, 3, 10, 4],
                vec![3, 0, 3, 0],
                vec![10, 3, 0, 5],
                vec![4, 0, 5, 0],
            ],
            direct_distances: vec![
                vec![0, 3, 6, 4],
                vec![3, 0, 3, 5],
                vec![6, 3, 0, 5],
                vec![4, 5, 5, 0],
            ],
        };
        StationGraph::new(&network).expect("square network")
    }

    fn offer_terms(source: u32, target: u32, max_detour: f64, max_duration: f64, hold: Minutes) -> OfferTerms {
        OfferTerms {
            driver: 0,
            source: station(source),
            target: station(target),
            departure_time: 0,
            capacity: 10,
            max_detour,
            max_duration,
            pace: Pace { speed: 60.0, hold },
            extendable: true,
        }
    }

    #[rstest]
    fn shortest_distances_avoid_the_long_chord(square: StationGraph) {
        assert_eq!(square.shortest_distance(station(1), station(3)), Ok(6));
        assert_eq!(
            square.shortest_path(station(1), station(3)),
            Ok(vec![station(1), station(2), station(3)])
        );
        assert_eq!(square.shortest_distance(station(4), station(4)), Ok(0));
        assert_eq!(square.shortest_path(station(4), station(4)), Ok(vec![station(4)]));
    }

    #[rstest]
    fn unknown_stations_are_errors(square: StationGraph) {
        assert_eq!(
            square.shortest_distance(station(1), station(9)),
            Err(StationGraphError::UnknownStation(station(9)))
        );
        assert_eq!(
            square.label(station(0)),
            Err(StationGraphError::UnknownStation(station(0)))
        );
    }

    #[rstest]
    fn disconnected_stations_are_unreachable() {
        let network = StationNetwork {
            labels: vec!["A".into(), "B".into(), "C".into()],
            distances: vec![vec![0, 2, 0], vec![2, 0, 0], vec![0, 0, 0]],
            direct_distances: vec![vec![0, 2, 9], vec![2, 0, 9], vec![9, 9, 0]],
        };
        let graph = StationGraph::new(&network).expect("valid network");
        assert_eq!(graph.reachable_distance(station(1), station(3)), Ok(None));
        assert_eq!(
            graph.shortest_distance(station(1), station(3)),
            Err(StationGraphError::Unreachable {
                from: station(1),
                to: station(3),
            })
        );
        let offer = offer_terms(1, 2, 100.0, 100.0, 0);
        assert_eq!(graph.is_feasible(&offer, station(3)), Ok(false));
    }

    #[rstest]
    fn invalid_networks_are_rejected() {
        let err = StationGraph::new(&StationNetwork::default()).expect_err("empty network");
        assert_eq!(
            err,
            StationGraphError::InvalidNetwork(InstanceValidationError::EmptyNetwork)
        );
    }

    #[rstest]
    #[case::within_both_budgets(15.0, 15.0, 5, true)]
    #[case::detour_too_long(9.0, 15.0, 5, false)]
    #[case::hold_breaks_delay(15.0, 14.0, 5, false)]
    #[case::exact_budgets(10.0, 15.0, 5, true)]
    fn single_stopover_feasibility(
        #[case] max_detour: f64,
        #[case] max_duration: f64,
        #[case] hold: Minutes,
        #[case] expected: bool,
    ) {
        let graph = StationGraph::new(&line_network(&[5, 5])).expect("line");
        let offer = offer_terms(1, 3, max_detour, max_duration, hold);
        assert_eq!(graph.is_feasible(&offer, station(2)), Ok(expected));
    }

    #[rstest]
    fn pair_feasibility_counts_all_three_legs(square: StationGraph) {
        // 1 -> 4 -> 3 -> 2 covers 4 + 5 + 3 = 12 against a direct 3.
        let tight = offer_terms(1, 2, 11.0, 100.0, 0);
        assert_eq!(square.is_feasible_pair(&tight, station(4), station(3)), Ok(false));
        let loose = offer_terms(1, 2, 12.0, 100.0, 0);
        assert_eq!(square.is_feasible_pair(&loose, station(4), station(3)), Ok(true));
    }

    #[rstest]
    fn detour_paths_respect_the_budget(square: StationGraph) {
        let direct_only = square
            .max_detour_paths(station(1), station(3), 0.0)
            .expect("paths");
        assert_eq!(
            direct_only,
            vec![DetourPath {
                stations: vec![station(1), station(2), station(3)],
                distance: 6,
            }]
        );

        let generous = square
            .max_detour_paths(station(1), station(3), 1.0)
            .expect("paths");
        let routes: Vec<Vec<StationId>> = generous.into_iter().map(|path| path.stations).collect();
        assert_eq!(
            routes,
            vec![
                vec![station(1), station(2), station(3)],
                vec![station(1), station(3)],
                vec![station(1), station(4), station(3)],
            ]
        );
    }

    #[rstest]
    fn travel_time_uses_shortest_distance(square: StationGraph) {
        let pace = Pace { speed: 30.0, hold: 0 };
        assert_eq!(square.travel_time(pace, station(1), station(3)), Ok(12));
    }

    fn connected_network() -> impl Strategy<Value = StationNetwork> {
        (2_usize..7).prop_flat_map(|count| {
            proptest::collection::vec(0_u32..20, count * count).prop_map(move |cells| {
                let mut distances = vec![vec![0; count]; count];
                for from in 0..count {
                    for to in (from + 1)..count {
                        let raw = cells[from * count + to];
                        // Keep a spanning chain so every station is reachable.
                        let weight = if to == from + 1 { raw + 1 } else { raw };
                        distances[from][to] = weight;
                        distances[to][from] = weight;
                    }
                }
                StationNetwork {
                    labels: (0..count).map(|i| format!("S{i}")).collect(),
                    direct_distances: vec![vec![0; count]; count],
                    distances,
                }
            })
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Shortest distances are symmetric, zero on the diagonal and obey
        /// the triangle inequality.
        #[test]
        fn distances_form_a_metric(network in connected_network()) {
            let graph = StationGraph::new(&network).expect("generated network is valid");
            let stations: Vec<StationId> = graph.stations().collect();
            for u in &stations {
                prop_assert_eq!(graph.shortest_distance(*u, *u), Ok(0));
                for v in &stations {
                    let uv = graph.shortest_distance(*u, *v).expect("connected");
                    prop_assert_eq!(Ok(uv), graph.shortest_distance(*v, *u));
                    for w in &stations {
                        let uw = graph.shortest_distance(*u, *w).expect("connected");
                        let vw = graph.shortest_distance(*v, *w).expect("connected");
                        prop_assert!(uw <= uv + vw);
                    }
                }
            }
        }
    }
}
