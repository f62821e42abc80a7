//! Time-expanded graph over driver offers.
//!
//! A vertex means "available at station X at time T under offer O". Offer-hop
//! edges follow a single offer's trip; waiting edges join vertices of one
//! station that lie within a hold duration of each other. Vertices and edges
//! live in arenas and refer to each other by index. Removal only flips a
//! liveness flag, so ids handed out earlier stay valid.

use std::fmt;

use parcel_match_core::{Minutes, StationId};

use crate::error::EngineError;
use crate::offer::{Offer, OfferBook, OfferId};
use crate::station_graph::{StationGraph, StationGraphError};
use crate::time_table::TimeTable;

/// Index of a vertex in a [`TimeExpandedGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VertexId(usize);

impl VertexId {
    pub(crate) const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Arena position of the vertex.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index of an edge in a [`TimeExpandedGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeId(usize);

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Edge families of the time-expanded graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// Travel within one offer's trip.
    OfferHop,
    /// Waiting at a station for a later vertex.
    Waiting,
}

/// A `(time, station, offer)` vertex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeVertex {
    /// Minutes since day start.
    pub time: Minutes,
    /// Station the vertex belongs to.
    pub station: StationId,
    /// Offer the vertex is labelled with.
    pub offer: OfferId,
    live: bool,
    outgoing: Vec<EdgeId>,
    incoming: Vec<EdgeId>,
}

impl TimeVertex {
    /// Whether the vertex has not been removed.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        self.live
    }
}

/// A directed edge weighted by elapsed minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeEdge {
    /// Tail vertex.
    pub from: VertexId,
    /// Head vertex.
    pub to: VertexId,
    /// Elapsed minutes.
    pub weight: Minutes,
    /// Edge family.
    pub kind: EdgeKind,
    live: bool,
}

impl TimeEdge {
    /// Whether the edge has not been removed.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        self.live
    }
}

/// Arena-backed time-expanded graph with one [`TimeTable`] per station.
#[derive(Debug, Clone, Default)]
pub struct TimeExpandedGraph {
    vertices: Vec<TimeVertex>,
    edges: Vec<TimeEdge>,
    tables: Vec<TimeTable>,
}

impl TimeExpandedGraph {
    /// Empty graph over `station_count` stations.
    #[must_use]
    pub fn new(station_count: usize) -> Self {
        Self {
            vertices: Vec::new(),
            edges: Vec::new(),
            tables: vec![TimeTable::new(); station_count],
        }
    }

    /// Look up a vertex, live or removed.
    ///
    /// # Errors
    ///
    /// [`EngineError::UnknownVertex`] for ids never created.
    pub fn vertex(&self, id: VertexId) -> Result<&TimeVertex, EngineError> {
        self.vertices.get(id.0).ok_or(EngineError::UnknownVertex(id))
    }

    fn vertex_mut(&mut self, id: VertexId) -> Result<&mut TimeVertex, EngineError> {
        self.vertices
            .get_mut(id.0)
            .ok_or(EngineError::UnknownVertex(id))
    }

    /// Look up an edge, live or removed.
    ///
    /// # Errors
    ///
    /// [`EngineError::UnknownEdge`] for ids never created.
    pub fn edge(&self, id: EdgeId) -> Result<&TimeEdge, EngineError> {
        self.edges.get(id.0).ok_or(EngineError::UnknownEdge(id))
    }

    /// Number of vertices ever created.
    #[must_use]
    pub const fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Whether `id` names a live vertex.
    #[must_use]
    pub fn is_live(&self, id: VertexId) -> bool {
        self.vertices.get(id.0).is_some_and(TimeVertex::is_live)
    }

    /// Ids of every live vertex, ascending.
    #[must_use]
    pub fn live_vertices(&self) -> Vec<VertexId> {
        self.vertices
            .iter()
            .enumerate()
            .filter(|(_, vertex)| vertex.live)
            .map(|(index, _)| VertexId::new(index))
            .collect()
    }

    /// Live out-edges of `id` as `(head, weight)`, in insertion order.
    ///
    /// # Errors
    ///
    /// [`EngineError::UnknownVertex`] for ids never created.
    pub fn out_edges(&self, id: VertexId) -> Result<Vec<(VertexId, Minutes)>, EngineError> {
        self.vertex(id)?
            .outgoing
            .iter()
            .map(|edge| self.edge(*edge).map(|found| (found.to, found.weight)))
            .collect()
    }

    /// Time table of `station`.
    ///
    /// # Errors
    ///
    /// [`EngineError::StationGraph`] when the station is outside the graph.
    pub fn table(&self, station: StationId) -> Result<&TimeTable, EngineError> {
        station
            .index()
            .and_then(|index| self.tables.get(index))
            .ok_or_else(|| StationGraphError::UnknownStation(station).into())
    }

    fn table_mut(&mut self, station: StationId) -> Result<&mut TimeTable, EngineError> {
        station
            .index()
            .and_then(|index| self.tables.get_mut(index))
            .ok_or_else(|| StationGraphError::UnknownStation(station).into())
    }

    /// The vertex for `offer` at `station` and `time`, if any.
    ///
    /// # Errors
    ///
    /// [`EngineError::StationGraph`] when the station is outside the graph.
    pub fn find_vertex(
        &self,
        time: Minutes,
        station: StationId,
        offer: OfferId,
    ) -> Result<Option<VertexId>, EngineError> {
        for candidate in self.table(station)?.slot(time) {
            if self.vertex(*candidate)?.offer == offer {
                return Ok(Some(*candidate));
            }
        }
        Ok(None)
    }

    /// First live vertex at `station` at or after `time`.
    ///
    /// # Errors
    ///
    /// [`EngineError::StationGraph`] when the station is outside the graph.
    pub fn first_at_or_after(&self, station: StationId, time: Minutes) -> Result<Option<VertexId>, EngineError> {
        Ok(self.table(station)?.first_at_or_after(time))
    }

    /// The vertex after `id` in its station's time order.
    ///
    /// # Errors
    ///
    /// [`EngineError::UnknownVertex`] for ids never created.
    pub fn next_after(&self, id: VertexId) -> Result<Option<VertexId>, EngineError> {
        let vertex = self.vertex(id)?;
        Ok(self.table(vertex.station)?.next_after(vertex.time, id))
    }

    /// Create the vertex `(time, station, offer)` or return the existing one.
    ///
    /// A new vertex is linked by waiting edges to the last vertex of the
    /// nearest earlier slot and the first vertex of the nearest later slot,
    /// each only when the gap fits the offer's hold. When both links are
    /// made, the waiting edges that jumped from that floor to that ceiling
    /// are dropped.
    ///
    /// # Errors
    ///
    /// [`EngineError::StationGraph`] when the station is outside the graph.
    pub fn add_time_vertex(
        &mut self,
        time: Minutes,
        station: StationId,
        offer: &Offer,
    ) -> Result<VertexId, EngineError> {
        if let Some(existing) = self.find_vertex(time, station, offer.id)? {
            return Ok(existing);
        }
        let hold = offer.terms.pace.hold;
        let (floor, ceiling) = {
            let table = self.table(station)?;
            (
                table.last_before(time),
                table.first_at_or_after(time.saturating_add(1)),
            )
        };

        let id = VertexId::new(self.vertices.len());
        self.vertices.push(TimeVertex {
            time,
            station,
            offer: offer.id,
            live: true,
            outgoing: Vec::new(),
            incoming: Vec::new(),
        });

        let mut linked_floor = None;
        if let Some(before) = floor {
            let gap = time.saturating_sub(self.vertex(before)?.time);
            if gap <= hold {
                self.add_edge(before, id, gap, EdgeKind::Waiting)?;
                linked_floor = Some(before);
            }
        }
        let mut linked_ceiling = None;
        if let Some(after) = ceiling {
            let gap = self.vertex(after)?.time.saturating_sub(time);
            if gap <= hold {
                self.add_edge(id, after, gap, EdgeKind::Waiting)?;
                linked_ceiling = Some(after);
            }
        }
        if let (Some(before), Some(after)) = (linked_floor, linked_ceiling) {
            let jumps: Vec<EdgeId> = self
                .vertex(before)?
                .outgoing
                .iter()
                .copied()
                .filter(|edge| {
                    self.edges
                        .get(edge.0)
                        .is_some_and(|found| found.to == after && found.kind == EdgeKind::Waiting)
                })
                .collect();
            for edge in jumps {
                self.remove_edge(edge)?;
            }
        }

        self.table_mut(station)?.insert(time, id);
        Ok(id)
    }

    /// Add a directed edge.
    ///
    /// # Errors
    ///
    /// [`EngineError::UnknownVertex`] when either end does not exist.
    pub fn add_edge(
        &mut self,
        from: VertexId,
        to: VertexId,
        weight: Minutes,
        kind: EdgeKind,
    ) -> Result<EdgeId, EngineError> {
        self.vertex(to)?;
        let id = EdgeId(self.edges.len());
        self.vertex_mut(from)?.outgoing.push(id);
        self.vertex_mut(to)?.incoming.push(id);
        self.edges.push(TimeEdge {
            from,
            to,
            weight,
            kind,
            live: true,
        });
        Ok(id)
    }

    /// Whether a live edge runs from `from` to `to`.
    #[must_use]
    pub fn has_edge(&self, from: VertexId, to: VertexId) -> bool {
        self.vertices.get(from.0).is_some_and(|vertex| {
            vertex
                .outgoing
                .iter()
                .any(|edge| self.edges.get(edge.0).is_some_and(|found| found.to == to))
        })
    }

    fn add_hop_once(&mut self, from: VertexId, to: VertexId, weight: Minutes) -> Result<(), EngineError> {
        if from != to && !self.has_edge(from, to) {
            self.add_edge(from, to, weight, EdgeKind::OfferHop)?;
        }
        Ok(())
    }

    /// Remove an edge, keeping the order of the remaining ones.
    ///
    /// # Errors
    ///
    /// [`EngineError::UnknownEdge`] for ids never created.
    pub fn remove_edge(&mut self, id: EdgeId) -> Result<(), EngineError> {
        let edge = self
            .edges
            .get_mut(id.0)
            .ok_or(EngineError::UnknownEdge(id))?;
        if !edge.live {
            return Ok(());
        }
        edge.live = false;
        let (from, to) = (edge.from, edge.to);
        self.vertex_mut(from)?.outgoing.retain(|entry| *entry != id);
        self.vertex_mut(to)?.incoming.retain(|entry| *entry != id);
        Ok(())
    }

    /// Remove a vertex with its incident edges and drop it from its table.
    ///
    /// # Errors
    ///
    /// [`EngineError::UnknownVertex`] for ids never created.
    pub fn remove_vertex(&mut self, id: VertexId) -> Result<(), EngineError> {
        let vertex = self.vertex(id)?;
        if !vertex.live {
            return Ok(());
        }
        let (time, station) = (vertex.time, vertex.station);
        let incident: Vec<EdgeId> = vertex
            .outgoing
            .iter()
            .chain(&vertex.incoming)
            .copied()
            .collect();
        for edge in incident {
            self.remove_edge(edge)?;
        }
        self.vertex_mut(id)?.live = false;
        self.table_mut(station)?.remove(time, id);
        log::trace!("removed time vertex {id} at station {station}, time {time}");
        Ok(())
    }

    /// Label a vertex with another offer.
    ///
    /// # Errors
    ///
    /// [`EngineError::UnknownVertex`] for ids never created.
    pub fn relabel(&mut self, id: VertexId, offer: OfferId) -> Result<(), EngineError> {
        self.vertex_mut(id)?.offer = offer;
        Ok(())
    }

    /// Display label `"{time}@{vertex}_{station label}"`.
    ///
    /// # Errors
    ///
    /// Fails for unknown vertices or stations.
    pub fn label(&self, id: VertexId, stations: &StationGraph) -> Result<String, EngineError> {
        let vertex = self.vertex(id)?;
        let station = stations.label(vertex.station)?;
        Ok(format!("{}@{id}_{station}", vertex.time))
    }

    /// Expand an offer into time vertices and offer-hop edges.
    ///
    /// Every station other than the offer's ends that passes the
    /// single-stopover test is a candidate. The direct trip is always
    /// added; then every ordered candidate pair `(s, t)` with `s == t` or a
    /// feasible two-stopover detour contributes `source → s → t → target`.
    /// Existing edges are never duplicated.
    ///
    /// # Errors
    ///
    /// Fails for unknown offers or when the station graph disagrees with the
    /// offer, both of which are invariant violations.
    pub fn add_offer(
        &mut self,
        stations: &StationGraph,
        offers: &mut OfferBook,
        id: OfferId,
    ) -> Result<(), EngineError> {
        let offer = offers.get(id)?.clone();
        let terms = offer.terms;
        let (source, target, pace) = (terms.source, terms.target, terms.pace);

        let mut candidates = Vec::new();
        for station in stations.stations() {
            if station != source && station != target && stations.is_feasible(&terms, station)? {
                candidates.push(station);
            }
        }

        let departure = terms.departure_time;
        let source_vertex = self.add_time_vertex(departure, source, &offer)?;
        let direct = stations.travel_time(pace, source, target)?;
        let target_time = departure.saturating_add(direct);
        let target_vertex = self.add_time_vertex(target_time, target, &offer)?;
        self.add_hop_once(source_vertex, target_vertex, direct)?;

        for first in &candidates {
            for second in &candidates {
                if first != second && !stations.is_feasible_pair(&terms, *first, *second)? {
                    continue;
                }
                let to_first = stations.travel_time(pace, source, *first)?;
                let first_time = departure.saturating_add(to_first);
                let first_vertex = self.add_time_vertex(first_time, *first, &offer)?;
                self.add_hop_once(source_vertex, first_vertex, to_first)?;

                let between = stations.travel_time(pace, *first, *second)?;
                let second_time = first_time.saturating_add(between);
                let second_vertex = self.add_time_vertex(second_time, *second, &offer)?;
                self.add_hop_once(first_vertex, second_vertex, between)?;

                let to_target = stations.travel_time(pace, *second, target)?;
                let arrival = second_time.saturating_add(to_target);
                let arrival_vertex = if arrival == target_time {
                    target_vertex
                } else {
                    self.add_time_vertex(arrival, target, &offer)?
                };
                self.add_hop_once(second_vertex, arrival_vertex, to_target)?;
            }
        }

        let registered = offers.get_mut(id)?;
        registered.source_vertex = Some(source_vertex);
        registered.target_vertex = Some(target_vertex);
        log::debug!(
            "expanded offer {id} ({source} -> {target} at {departure}) over {} stopover candidates",
            candidates.len()
        );
        Ok(())
    }
}
