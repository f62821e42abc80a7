//! Offer splitting and extension after a parcel is routed.
//!
//! Each offer segment a parcel rides is narrowed: an unsplit offer is
//! tombstoned and replaced by a non-extendable offer with less capacity,
//! while an already-split offer loses capacity in place. Unsplit offers also
//! spawn a continuation offer from the segment's exit so the driver can pick
//! up more parcels once this one is dropped.

use parcel_match_core::{Distance, Minutes, StationId, Volume};

use crate::error::EngineError;
use crate::offer::{Offer, OfferBook, OfferId, OfferTerms};
use crate::station_graph::StationGraph;
use crate::time_expanded::{TimeExpandedGraph, VertexId};

/// A run of at least two consecutive path vertices under one offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Offer the run travels under.
    pub offer: OfferId,
    /// Vertices of the run, in path order.
    pub vertices: Vec<VertexId>,
    /// First vertex of the run.
    pub entry: VertexId,
    /// Last vertex of the run.
    pub exit: VertexId,
}

/// Split a path into its offer segments.
///
/// Single-vertex runs are transfers waiting at a station and are dropped.
///
/// # Errors
///
/// [`EngineError::UnknownVertex`] for vertices not in `graph`.
pub fn segments(graph: &TimeExpandedGraph, path: &[VertexId]) -> Result<Vec<Segment>, EngineError> {
    let mut found = Vec::new();
    let mut run: Vec<VertexId> = Vec::new();
    let mut run_offer = None;
    for vertex in path {
        let offer = graph.vertex(*vertex)?.offer;
        if run_offer != Some(offer) {
            close_run(&mut found, run_offer, std::mem::take(&mut run));
            run_offer = Some(offer);
        }
        run.push(*vertex);
    }
    close_run(&mut found, run_offer, run);
    Ok(found)
}

fn close_run(found: &mut Vec<Segment>, offer: Option<OfferId>, vertices: Vec<VertexId>) {
    let (Some(offer), [first, .., last]) = (offer, vertices.as_slice()) else {
        return;
    };
    let (entry, exit) = (*first, *last);
    found.push(Segment {
        offer,
        vertices,
        entry,
        exit,
    });
}

/// Sum of shortest distances between consecutive distinct stations.
///
/// # Errors
///
/// Fails when two consecutive stations are not connected.
pub fn route_distance(
    stations: &StationGraph,
    route: impl IntoIterator<Item = StationId>,
) -> Result<Distance, EngineError> {
    let mut total: Distance = 0;
    let mut previous: Option<StationId> = None;
    for station in route {
        if let Some(from) = previous.filter(|from| *from != station) {
            total = total.saturating_add(stations.shortest_distance(from, station)?);
        }
        previous = Some(station);
    }
    Ok(total)
}

/// Mutable view over the offer registry and the graph it labels.
#[derive(Debug)]
pub struct OfferLifecycle<'a> {
    stations: &'a StationGraph,
    offers: &'a mut OfferBook,
    graph: &'a mut TimeExpandedGraph,
}

impl<'a> OfferLifecycle<'a> {
    /// Borrow the pieces a split touches.
    pub const fn new(
        stations: &'a StationGraph,
        offers: &'a mut OfferBook,
        graph: &'a mut TimeExpandedGraph,
    ) -> Self {
        Self {
            stations,
            offers,
            graph,
        }
    }

    /// Take `volume` out of the offer `prior` for the span of `segment`.
    ///
    /// `prior` is the offer as it stood before the parcel. An unsplit offer
    /// is tombstoned and replaced by a non-extendable offer with the same
    /// span and budgets, whose id is returned when it is still feasible. The
    /// replacement takes over the old offer's vertices along the driver's
    /// committed route: the shortest path from the source to the segment
    /// entry, the segment itself, and the shortest path on to the target. An
    /// offer that was split before is reduced in place and tombstoned once
    /// empty.
    ///
    /// # Errors
    ///
    /// Fails for unknown offers or vertices, which are invariant violations.
    pub fn update_prev_offer(
        &mut self,
        prior: &Offer,
        segment: &Segment,
        volume: Volume,
    ) -> Result<Option<OfferId>, EngineError> {
        if !prior.terms.extendable {
            let offer = self.offers.get_mut(prior.id)?;
            offer.terms.capacity = offer.terms.capacity.saturating_sub(volume);
            if offer.terms.capacity == 0 {
                self.offers.remove(prior.id)?;
                log::debug!("offer {} is fully consumed", prior.id);
            }
            return Ok(None);
        }

        self.offers.remove(prior.id)?;
        let terms = OfferTerms {
            capacity: prior.terms.capacity.saturating_sub(volume),
            extendable: false,
            ..prior.terms
        };
        let Some(updated) = self.offers.issue(terms) else {
            return Ok(None);
        };

        let exit = self.graph.vertex(segment.exit)?;
        let arrival = exit.time.saturating_add(self.stations.travel_time(
            terms.pace,
            exit.station,
            terms.target,
        )?);
        let target_vertex = self
            .graph
            .find_vertex(arrival, terms.target, prior.id)?
            .or(prior.target_vertex);

        let entry = self.graph.vertex(segment.entry)?;
        let (entry_station, entry_time) = (entry.station, entry.time);
        let (exit_station, exit_time) = (exit.station, exit.time);
        let mut claimed: Vec<VertexId> = prior.source_vertex.into_iter().collect();
        claimed.extend(self.route_vertices(prior, terms.source, terms.departure_time, entry_station)?);
        claimed.extend(self.route_vertices(prior, entry_station, entry_time, terms.target)?);
        claimed.extend(segment.vertices.iter().copied());
        claimed.extend(self.route_vertices(prior, exit_station, exit_time, terms.target)?);
        claimed.extend(target_vertex);
        for vertex in claimed {
            if self.graph.is_live(vertex) && self.graph.vertex(vertex)?.offer == prior.id {
                self.graph.relabel(vertex, updated)?;
            }
        }
        let offer = self.offers.get_mut(updated)?;
        offer.source_vertex = prior.source_vertex;
        offer.target_vertex = target_vertex;
        log::debug!(
            "offer {} replaced by {updated} with capacity {}",
            prior.id,
            terms.capacity
        );
        Ok(Some(updated))
    }

    /// Vertices of `prior` on a shortest path from `from`, left at `start`,
    /// to `to`.
    ///
    /// Each station is timed by the driving time from `from`, the same way
    /// expansion times an offer's stops.
    fn route_vertices(
        &self,
        prior: &Offer,
        from: StationId,
        start: Minutes,
        to: StationId,
    ) -> Result<Vec<VertexId>, EngineError> {
        let mut found = Vec::new();
        for station in self.stations.shortest_path(from, to)? {
            let time = start.saturating_add(self.stations.travel_time(prior.terms.pace, from, station)?);
            found.extend(self.graph.find_vertex(time, station, prior.id)?);
        }
        Ok(found)
    }

    /// Issue and expand the continuation of `prior` from the segment exit.
    ///
    /// Only unsplit offers continue. The continuation keeps the capacity
    /// `prior` had before the parcel, and its budgets shrink by the distance
    /// driven to the exit and the minutes elapsed since departure.
    ///
    /// # Errors
    ///
    /// Fails for unknown vertices or when expansion hits an invariant
    /// violation.
    #[expect(
        clippy::float_arithmetic,
        reason = "remaining budgets are fractional"
    )]
    pub fn add_new_offer(&mut self, prior: &Offer, segment: &Segment) -> Result<Option<OfferId>, EngineError> {
        if !prior.terms.extendable {
            return Ok(None);
        }
        let entry = self.graph.vertex(segment.entry)?.station;
        let exit = self.graph.vertex(segment.exit)?;
        let (exit_station, exit_time) = (exit.station, exit.time);

        let mut route = vec![prior.terms.source, entry];
        for vertex in &segment.vertices {
            route.push(self.graph.vertex(*vertex)?.station);
        }
        let driven = route_distance(self.stations, route)?;
        let elapsed = exit_time.saturating_sub(prior.terms.departure_time);

        let terms = OfferTerms {
            source: exit_station,
            departure_time: exit_time,
            max_detour: prior.terms.max_detour - f64::from(driven),
            max_duration: prior.terms.max_duration - f64::from(elapsed),
            extendable: true,
            ..prior.terms
        };
        let Some(continuation) = self.offers.issue(terms) else {
            return Ok(None);
        };
        self.graph.add_offer(self.stations, self.offers, continuation)?;
        log::debug!(
            "offer {} continues as {continuation} from {exit_station} at {exit_time}",
            prior.id
        );
        Ok(Some(continuation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::Pace;
    use crate::search::TimeExpandedDijkstra;
    use parcel_match_core::test_support::line_network;
    use rstest::{fixture, rstest};

    fn station(id: u32) -> StationId {
        StationId::new(id)
    }

    struct World {
        stations: StationGraph,
        offers: OfferBook,
        graph: TimeExpandedGraph,
        offer: OfferId,
    }

    impl World {
        fn vertex(&self, time: u32, at: u32, offer: OfferId) -> VertexId {
            self.graph
                .find_vertex(time, station(at), offer)
                .expect("known station")
                .expect("vertex exists")
        }

        fn segment(&self, vertices: &[VertexId]) -> Segment {
            let found = segments(&self.graph, vertices).expect("segments");
            assert_eq!(found.len(), 1);
            found.into_iter().next().expect("one segment")
        }

        fn prior(&self) -> Offer {
            self.offers.get(self.offer).expect("offer").clone()
        }
    }

    /// An expanded 15-unit offer from station 1 to `target` on a line with
    /// the given gaps and both budgets set to `budget`.
    fn expanded(gaps: &[u32], target: u32, budget: f64) -> World {
        let stations = StationGraph::new(&line_network(gaps)).expect("line");
        let mut offers = OfferBook::new();
        let offer = offers
            .issue(OfferTerms {
                driver: 0,
                source: station(1),
                target: station(target),
                departure_time: 0,
                capacity: 15,
                max_duration: budget,
                max_detour: budget,
                pace: Pace { speed: 60.0, hold: 5 },
                extendable: true,
            })
            .expect("feasible");
        let mut graph = TimeExpandedGraph::new(stations.station_count());
        graph
            .add_offer(&stations, &mut offers, offer)
            .expect("expansion");
        World {
            stations,
            offers,
            graph,
            offer,
        }
    }

    /// The offer from station 1 to 3 on the `5-5` line.
    #[fixture]
    fn world() -> World {
        expanded(&[5, 5], 3, 15.0)
    }

    #[rstest]
    fn segments_ignore_single_vertex_runs(world: World) {
        let source = world.vertex(0, 1, world.offer);
        let middle = world.vertex(5, 2, world.offer);
        assert!(segments(&world.graph, &[source]).expect("segments").is_empty());
        let found = segments(&world.graph, &[source, middle]).expect("segments");
        assert_eq!(
            found,
            vec![Segment {
                offer: world.offer,
                vertices: vec![source, middle],
                entry: source,
                exit: middle,
            }]
        );
    }

    #[rstest]
    fn route_distance_skips_repeated_stations(world: World) {
        let route = [station(1), station(1), station(2), station(3), station(3)];
        assert_eq!(route_distance(&world.stations, route), Ok(10));
        assert_eq!(route_distance(&world.stations, []), Ok(0));
    }

    #[rstest]
    fn split_reduces_capacity_and_takes_over_the_span(mut world: World) {
        let source = world.vertex(0, 1, world.offer);
        let middle = world.vertex(5, 2, world.offer);
        let target = world.vertex(10, 3, world.offer);
        let segment = world.segment(&[source, middle]);
        let prior = world.prior();

        let mut lifecycle = OfferLifecycle::new(&world.stations, &mut world.offers, &mut world.graph);
        let updated = lifecycle
            .update_prev_offer(&prior, &segment, 10)
            .expect("update")
            .expect("capacity left");

        assert!(world.offers.is_removed(world.offer));
        let terms = world.offers.get(updated).expect("offer").terms;
        assert_eq!(terms.capacity, 5);
        assert!(!terms.extendable);
        assert!(terms.max_detour <= prior.terms.max_detour);
        assert!(terms.max_duration <= prior.terms.max_duration);
        for vertex in [source, middle, target] {
            assert_eq!(world.graph.vertex(vertex).expect("vertex").offer, updated);
        }
    }

    #[rstest]
    fn filling_an_offer_registers_no_replacement(mut world: World) {
        let source = world.vertex(0, 1, world.offer);
        let target = world.vertex(10, 3, world.offer);
        let segment = world.segment(&[source, target]);
        let prior = world.prior();

        let mut lifecycle = OfferLifecycle::new(&world.stations, &mut world.offers, &mut world.graph);
        let updated = lifecycle.update_prev_offer(&prior, &segment, 15).expect("update");
        assert_eq!(updated, None);
        assert!(world.offers.is_removed(world.offer));
        assert_eq!(world.offers.live().count(), 0);
    }

    #[rstest]
    fn split_offers_shrink_in_place(mut world: World) {
        let source = world.vertex(0, 1, world.offer);
        let target = world.vertex(10, 3, world.offer);
        let segment = world.segment(&[source, target]);
        let mut prior = world.prior();
        prior.terms.extendable = false;
        world.offers.get_mut(world.offer).expect("offer").terms.extendable = false;

        let mut lifecycle = OfferLifecycle::new(&world.stations, &mut world.offers, &mut world.graph);
        assert_eq!(lifecycle.update_prev_offer(&prior, &segment, 6).expect("update"), None);
        assert_eq!(lifecycle.add_new_offer(&prior, &segment).expect("extend"), None);
        assert_eq!(world.offers.get(world.offer).expect("offer").terms.capacity, 9);
        assert!(!world.offers.is_removed(world.offer));

        OfferLifecycle::new(&world.stations, &mut world.offers, &mut world.graph)
            .update_prev_offer(&prior, &segment, 9)
            .expect("update");
        assert!(world.offers.is_removed(world.offer));
    }

    #[rstest]
    fn continuation_starts_at_the_exit_with_reduced_budgets(mut world: World) {
        let source = world.vertex(0, 1, world.offer);
        let middle = world.vertex(5, 2, world.offer);
        let segment = world.segment(&[source, middle]);
        let prior = world.prior();

        let mut lifecycle = OfferLifecycle::new(&world.stations, &mut world.offers, &mut world.graph);
        lifecycle.update_prev_offer(&prior, &segment, 10).expect("update");
        let continuation = lifecycle
            .add_new_offer(&prior, &segment)
            .expect("extend")
            .expect("feasible continuation");

        let offer = world.offers.get(continuation).expect("offer");
        assert_eq!(offer.terms.source, station(2));
        assert_eq!(offer.terms.departure_time, 5);
        assert_eq!(offer.terms.capacity, 15);
        assert!(offer.terms.extendable);
        assert!((offer.terms.max_detour - 10.0).abs() < 1e-9);
        assert!((offer.terms.max_duration - 10.0).abs() < 1e-9);
        let start = offer.source_vertex.expect("expanded");
        let end = offer.target_vertex.expect("expanded");
        assert_eq!(world.graph.out_edges(start).expect("edges").first(), Some(&(end, 5)));
    }

    #[rstest]
    fn no_continuation_from_the_target(mut world: World) {
        let source = world.vertex(0, 1, world.offer);
        let target = world.vertex(10, 3, world.offer);
        let segment = world.segment(&[source, target]);
        let prior = world.prior();

        let mut lifecycle = OfferLifecycle::new(&world.stations, &mut world.offers, &mut world.graph);
        assert_eq!(lifecycle.add_new_offer(&prior, &segment).expect("extend"), None);
    }

    #[rstest]
    fn split_keeps_the_route_before_a_later_pickup() {
        let mut world = expanded(&[5, 5, 5], 4, 22.5);
        let pickup = world.vertex(10, 3, world.offer);
        let target = world.vertex(15, 4, world.offer);
        let segment = world.segment(&[pickup, target]);
        let prior = world.prior();

        let updated = OfferLifecycle::new(&world.stations, &mut world.offers, &mut world.graph)
            .update_prev_offer(&prior, &segment, 10)
            .expect("update")
            .expect("capacity left");

        let route: Vec<VertexId> = [(0, 1), (5, 2), (10, 3), (15, 4)]
            .into_iter()
            .map(|(time, at)| world.vertex(time, at, updated))
            .collect();
        assert_eq!(route[0], world.offers.get(updated).expect("offer").source_vertex.expect("source"));

        let mut search = TimeExpandedDijkstra::new(&mut world.graph, &world.offers);
        let found = search
            .compute(route[0], station(2), 5, None)
            .expect("search")
            .expect("the narrowed offer reaches station 2");
        assert_eq!(found.vertices, vec![route[0], route[1]]);
        assert_eq!(found.elapsed, 5);
        assert_eq!(search.compute(route[0], station(2), 6, None).expect("search"), None);
    }
}
