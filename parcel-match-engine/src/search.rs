//! Capacity- and removal-aware shortest paths over the time-expanded graph.

use parcel_match_core::{Minutes, StationId, Volume};

use crate::error::EngineError;
use crate::heap::{FibonacciHeap, Handle};
use crate::offer::OfferBook;
use crate::time_expanded::{TimeExpandedGraph, VertexId};

const UNREACHED: u64 = u64::MAX;

/// A path found by [`TimeExpandedDijkstra::compute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimePath {
    /// Vertices from the start vertex to the first vertex reached at the
    /// destination station.
    pub vertices: Vec<VertexId>,
    /// Minutes from the first to the last vertex.
    pub elapsed: Minutes,
}

/// Single-source Dijkstra over live offers with enough capacity.
///
/// Vertices whose offer was tombstoned are removed from the graph the first
/// time the search reaches them. Vertices whose offer cannot take the volume
/// stay in place for smaller parcels.
#[derive(Debug)]
pub struct TimeExpandedDijkstra<'a> {
    graph: &'a mut TimeExpandedGraph,
    offers: &'a OfferBook,
}

impl<'a> TimeExpandedDijkstra<'a> {
    /// Search over `graph` with offers looked up in `offers`.
    pub const fn new(graph: &'a mut TimeExpandedGraph, offers: &'a OfferBook) -> Self {
        Self { graph, offers }
    }

    /// Earliest path from `source` to any vertex at `destination` that
    /// carries `volume` and, when given, arrives no later than `deadline`.
    ///
    /// Out-edges are relaxed in insertion order with a strict comparison, so
    /// the first of several equally short edges wins.
    ///
    /// # Errors
    ///
    /// Fails for an unknown or removed `source` and on priority-queue
    /// misuse; both are invariant violations.
    #[expect(
        clippy::indexing_slicing,
        reason = "search tables are sized to the vertex arena and indexed by its ids"
    )]
    pub fn compute(
        &mut self,
        source: VertexId,
        destination: StationId,
        volume: Volume,
        deadline: Option<Minutes>,
    ) -> Result<Option<TimePath>, EngineError> {
        if !self.graph.is_live(source) {
            return Err(EngineError::UnknownVertex(source));
        }
        let count = self.graph.vertex_count();
        let mut heap = FibonacciHeap::with_capacity(count);
        let mut handles: Vec<Option<Handle>> = vec![None; count];
        for vertex in self.graph.live_vertices() {
            handles[vertex.index()] = Some(heap.push(vertex, UNREACHED));
        }
        let mut distances = vec![UNREACHED; count];
        let mut parents: Vec<Option<VertexId>> = vec![None; count];
        distances[source.index()] = 0;
        if let Some(handle) = handles[source.index()] {
            heap.decrease_key(handle, 0)?;
        }

        while !heap.is_empty() {
            let (current, distance) = heap.extract_min()?;
            if distance == UNREACHED {
                break;
            }
            if self.graph.vertex(current)?.station == destination {
                return Ok(Some(rebuild(&parents, current, distance)));
            }
            for (next, weight) in self.graph.out_edges(current)? {
                if !self.graph.is_live(next) {
                    continue;
                }
                let vertex = self.graph.vertex(next)?;
                let (offer, time) = (vertex.offer, vertex.time);
                if self.offers.is_removed(offer) {
                    self.graph.remove_vertex(next)?;
                    continue;
                }
                if !self.offers.has_capacity(offer, volume) {
                    continue;
                }
                if deadline.is_some_and(|limit| time > limit) {
                    continue;
                }
                let candidate = distance.saturating_add(u64::from(weight));
                if candidate < distances[next.index()] {
                    distances[next.index()] = candidate;
                    parents[next.index()] = Some(current);
                    if let Some(handle) = handles[next.index()] {
                        heap.decrease_key(handle, candidate)?;
                    }
                }
            }
        }
        Ok(None)
    }
}

fn rebuild(parents: &[Option<VertexId>], end: VertexId, distance: u64) -> TimePath {
    let mut vertices = vec![end];
    let mut current = end;
    while let Some(parent) = parents.get(current.index()).copied().flatten() {
        vertices.push(parent);
        current = parent;
    }
    vertices.reverse();
    TimePath {
        vertices,
        elapsed: Minutes::try_from(distance).unwrap_or(Minutes::MAX),
    }
}
