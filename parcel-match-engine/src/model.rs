//! Greedy parcel assignment over a live time-expanded graph.

use parcel_match_core::{
    Distance, DriverRoute, Instance, MatchReport, Minutes, ObjectiveWeights, ParcelAssignment,
    ParcelRecord, PathStop, StationId, TRAVEL_DISTANCE_FACTOR,
};
use rand::Rng;

use crate::driver::Driver;
use crate::error::EngineError;
use crate::lifecycle::{OfferLifecycle, route_distance, segments};
use crate::offer::{OfferBook, OfferId, OfferTerms};
use crate::search::{TimeExpandedDijkstra, TimePath};
use crate::station_graph::StationGraph;
use crate::time_expanded::TimeExpandedGraph;

/// Which drivers get a new departure time on [`MatchingModel::shuffle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShuffleMode {
    /// Keep the departure of drivers that carried a parcel in the last pass.
    Constrained,
    /// Redraw every driver.
    Full,
}

#[derive(Debug, Clone, PartialEq)]
struct Itinerary {
    stops: Vec<PathStop>,
    num_offers: usize,
    driver_ids: Vec<u64>,
    distance: Distance,
}

#[derive(Debug, Clone, PartialEq)]
struct ParcelState {
    record: ParcelRecord,
    itinerary: Option<Itinerary>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Carried {
    stops: Vec<(Minutes, StationId)>,
}

impl Carried {
    const fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }
}

/// One matching instance: stations, drivers, parcels and the offer graph.
///
/// # Examples
/// ```
/// use parcel_match_core::test_support::{line_instance, parcel_record};
/// use parcel_match_engine::MatchingModel;
///
/// # fn main() -> Result<(), parcel_match_engine::EngineError> {
/// let mut instance = line_instance();
/// instance.parcels.push(parcel_record(1, 1, 3, 40.0, 5));
/// let mut model = MatchingModel::new(&instance)?;
/// assert_eq!(model.assign_parcels()?, 1);
/// let report = model.report(1, 0)?;
/// assert_eq!(report.parcels[0].num_offers, 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MatchingModel {
    weights: ObjectiveWeights,
    stations: StationGraph,
    drivers: Vec<Driver>,
    carried: Vec<Carried>,
    parcels: Vec<ParcelState>,
    order: Vec<usize>,
    offers: OfferBook,
    graph: TimeExpandedGraph,
}

impl MatchingModel {
    /// Validate `instance`, build the station graph and expand one offer per
    /// driver.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidInstance`] for malformed input; anything else
    /// is an invariant violation.
    pub fn new(instance: &Instance) -> Result<Self, EngineError> {
        instance.validate()?;
        let stations = StationGraph::new(&instance.network)?;
        let drivers = instance
            .drivers
            .iter()
            .map(|record| Driver::new(record, &stations))
            .collect::<Result<Vec<_>, _>>()?;
        let parcels: Vec<ParcelState> = instance
            .parcels
            .iter()
            .map(|record| ParcelState {
                record: record.clone(),
                itinerary: None,
            })
            .collect();
        let mut order: Vec<usize> = (0..parcels.len()).collect();
        order.sort_by(|left, right| {
            let cost = |index: &usize| parcels.get(*index).map_or(0.0, |state| state.record.shipping_cost);
            cost(right).total_cmp(&cost(left))
        });

        let mut model = Self {
            weights: instance.weights,
            graph: TimeExpandedGraph::new(stations.station_count()),
            stations,
            carried: vec![Carried::default(); drivers.len()],
            drivers,
            parcels,
            order,
            offers: OfferBook::new(),
        };
        model.build_offers()?;
        Ok(model)
    }

    /// Issue and expand the first offer of every driver on a fresh graph.
    fn build_offers(&mut self) -> Result<(), EngineError> {
        self.offers = OfferBook::new();
        self.graph = TimeExpandedGraph::new(self.stations.station_count());
        for (index, driver) in self.drivers.iter().enumerate() {
            let Some(terms) = OfferTerms::initial(index, driver) else {
                log::warn!(
                    "driver {} cannot reach station {} from {}; no offer issued",
                    driver.id,
                    driver.target,
                    driver.source
                );
                continue;
            };
            if let Some(id) = self.offers.issue(terms) {
                self.graph.add_offer(&self.stations, &mut self.offers, id)?;
            }
        }
        log::debug!(
            "built {} offers over {} time vertices",
            self.offers.len(),
            self.graph.vertex_count()
        );
        Ok(())
    }

    /// Static station graph.
    #[must_use]
    pub const fn stations(&self) -> &StationGraph {
        &self.stations
    }

    /// Current time-expanded graph.
    #[must_use]
    pub const fn graph(&self) -> &TimeExpandedGraph {
        &self.graph
    }

    /// Every offer issued since the graph was last built.
    #[must_use]
    pub const fn offers(&self) -> &OfferBook {
        &self.offers
    }

    /// Drivers in input order.
    #[must_use]
    pub fn drivers(&self) -> &[Driver] {
        &self.drivers
    }

    /// Input indices of the parcels in processing order: decreasing shipping
    /// cost, ties in input order.
    #[must_use]
    pub fn parcel_order(&self) -> &[usize] {
        &self.order
    }

    /// Route every parcel in processing order and return how many were
    /// assigned.
    ///
    /// # Errors
    ///
    /// Only on invariant violations.
    pub fn assign_parcels(&mut self) -> Result<usize, EngineError> {
        let mut assigned = 0;
        for index in self.order.clone() {
            if self.assign_parcel(index)? {
                assigned += 1;
            }
        }
        log::info!("assigned {assigned} of {} parcels", self.parcels.len());
        Ok(assigned)
    }

    /// Try the start vertices of one parcel in time order until a search
    /// reaches its destination in time.
    fn assign_parcel(&mut self, index: usize) -> Result<bool, EngineError> {
        let Some(record) = self.parcels.get(index).map(|state| state.record.clone()) else {
            return Ok(false);
        };
        let mut candidate = self
            .graph
            .first_at_or_after(record.start, record.earliest_departure)?;
        while let Some(start) = candidate {
            let vertex = self.graph.vertex(start)?;
            let (time, offer) = (vertex.time, vertex.offer);
            if time > record.latest_arrival {
                break;
            }
            if self.offers.is_removed(offer) {
                candidate = self.graph.next_after(start)?;
                self.graph.remove_vertex(start)?;
                continue;
            }
            if self.offers.has_capacity(offer, record.volume) {
                let path = TimeExpandedDijkstra::new(&mut self.graph, &self.offers).compute(
                    start,
                    record.end,
                    record.volume,
                    Some(record.latest_arrival),
                )?;
                if let Some(found) = path {
                    self.commit(index, &record, &found)?;
                    return Ok(true);
                }
            }
            candidate = self.graph.next_after(start)?;
        }
        log::debug!("parcel {} left for the shipping company", record.id);
        Ok(false)
    }

    fn commit(&mut self, index: usize, record: &ParcelRecord, path: &TimePath) -> Result<(), EngineError> {
        let mut stops = Vec::with_capacity(path.vertices.len());
        for id in &path.vertices {
            let vertex = self.graph.vertex(*id)?;
            stops.push(PathStop {
                station: vertex.station,
                time: vertex.time,
                offer: vertex.offer.as_u64(),
            });
        }
        let distance = route_distance(&self.stations, stops.iter().map(|stop| stop.station))?;
        let runs = segments(&self.graph, &path.vertices)?;

        let mut driver_ids = Vec::new();
        let mut touched: Vec<OfferId> = Vec::new();
        for segment in &runs {
            if touched.contains(&segment.offer) {
                log::warn!(
                    "parcel {} rides offer {} twice; capacity taken once",
                    record.id,
                    segment.offer
                );
                continue;
            }
            touched.push(segment.offer);
            let prior = self.offers.get(segment.offer)?.clone();
            let driver_index = prior.terms.driver;
            let driver = self
                .drivers
                .get(driver_index)
                .ok_or(EngineError::UnknownDriver(driver_index))?;
            if !driver_ids.contains(&driver.id) {
                driver_ids.push(driver.id);
            }
            let (entry, exit) = (self.graph.vertex(segment.entry)?, self.graph.vertex(segment.exit)?);
            let carried = self
                .carried
                .get_mut(driver_index)
                .ok_or(EngineError::UnknownDriver(driver_index))?;
            carried.stops.push((entry.time, entry.station));
            carried.stops.push((exit.time, exit.station));

            let mut lifecycle = OfferLifecycle::new(&self.stations, &mut self.offers, &mut self.graph);
            lifecycle.update_prev_offer(&prior, segment, record.volume)?;
            lifecycle.add_new_offer(&prior, segment)?;
        }

        log::debug!(
            "parcel {} assigned over {} offer segments",
            record.id,
            runs.len()
        );
        if let Some(state) = self.parcels.get_mut(index) {
            state.itinerary = Some(Itinerary {
                stops,
                num_offers: runs.len(),
                driver_ids,
                distance,
            });
        }
        Ok(())
    }

    /// Objective contribution of one parcel.
    #[expect(
        clippy::float_arithmetic,
        reason = "objective terms are weighted real-valued costs"
    )]
    fn parcel_cost(&self, state: &ParcelState) -> f64 {
        state.itinerary.as_ref().map_or_else(
            || self.weights.shipping_cost * state.record.shipping_cost,
            |itinerary| {
                TRAVEL_DISTANCE_FACTOR * self.weights.travel_distance * f64::from(itinerary.distance)
                    + self.weights.parcel_transfer * count(itinerary.num_offers.saturating_sub(1))
            },
        )
    }

    /// Realised route and objective contribution of one driver.
    #[expect(
        clippy::float_arithmetic,
        reason = "objective terms are weighted real-valued costs"
    )]
    fn driver_route(&self, index: usize) -> Result<DriverRoute, EngineError> {
        let driver = self
            .drivers
            .get(index)
            .ok_or(EngineError::UnknownDriver(index))?;
        let mut stops = self
            .carried
            .get(index)
            .map(|carried| carried.stops.clone())
            .unwrap_or_default();
        stops.sort_by_key(|(time, _)| *time);

        let mut stations = vec![driver.source];
        stations.extend(stops.iter().map(|(_, station)| *station));
        stations.push(driver.target);
        stations.dedup();

        let shortest_duration = driver.shortest_duration();
        let real_duration = if stops.is_empty() {
            shortest_duration
        } else {
            let mut total: Minutes = 0;
            for leg in stations.windows(2) {
                if let [from, to] = leg {
                    total = total.saturating_add(self.stations.travel_time(driver.pace, *from, *to)?);
                }
            }
            total
        };
        let num_stops = stations.len().saturating_sub(2);
        let extra = real_duration.saturating_sub(shortest_duration);
        Ok(DriverRoute {
            driver_id: driver.id,
            stations,
            departure_time: driver.departure_time(),
            num_stops,
            real_duration,
            shortest_duration,
            cost: self.weights.waiting_time * count(num_stops)
                + self.weights.extra_time * f64::from(extra),
        })
    }

    /// Total objective: the sum of every driver and parcel cost.
    ///
    /// # Errors
    ///
    /// Only on invariant violations.
    #[expect(clippy::float_arithmetic, reason = "the objective is a sum of costs")]
    pub fn compute_objective(&self) -> Result<f64, EngineError> {
        let mut total = 0.0;
        for index in 0..self.drivers.len() {
            total += self.driver_route(index)?.cost;
        }
        for state in &self.parcels {
            total += self.parcel_cost(state);
        }
        Ok(total)
    }

    /// Objective if every parcel went to the shipping company.
    #[must_use]
    #[expect(clippy::float_arithmetic, reason = "the objective is a sum of costs")]
    pub fn unmatched_objective(&self) -> f64 {
        self.parcels
            .iter()
            .map(|state| self.weights.shipping_cost * state.record.shipping_cost)
            .sum()
    }

    /// Snapshot of the current assignment.
    ///
    /// # Errors
    ///
    /// Only on invariant violations.
    #[expect(clippy::float_arithmetic, reason = "the objective is a sum of costs")]
    pub fn report(&self, iterations: usize, best_iteration: usize) -> Result<MatchReport, EngineError> {
        let drivers = (0..self.drivers.len())
            .map(|index| self.driver_route(index))
            .collect::<Result<Vec<_>, _>>()?;
        let parcels: Vec<ParcelAssignment> = self
            .parcels
            .iter()
            .map(|state| {
                let cost = self.parcel_cost(state);
                state.itinerary.as_ref().map_or_else(
                    || ParcelAssignment {
                        parcel_id: state.record.id,
                        assigned: false,
                        path: Vec::new(),
                        num_offers: 0,
                        driver_ids: Vec::new(),
                        cost,
                    },
                    |itinerary| ParcelAssignment {
                        parcel_id: state.record.id,
                        assigned: true,
                        path: itinerary.stops.clone(),
                        num_offers: itinerary.num_offers,
                        driver_ids: itinerary.driver_ids.clone(),
                        cost,
                    },
                )
            })
            .collect();
        let objective = drivers.iter().map(|route| route.cost).sum::<f64>()
            + parcels.iter().map(|parcel| parcel.cost).sum::<f64>();
        Ok(MatchReport {
            parcels,
            drivers,
            objective,
            unmatched_objective: self.unmatched_objective(),
            iterations,
            best_iteration,
        })
    }

    /// Forget every assignment, redraw departures per `mode` and rebuild
    /// the offers and the time-expanded graph from scratch.
    ///
    /// # Errors
    ///
    /// Only on invariant violations.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, mode: ShuffleMode, rng: &mut R) -> Result<(), EngineError> {
        for (driver, carried) in self.drivers.iter_mut().zip(&self.carried) {
            if mode == ShuffleMode::Full || carried.is_empty() {
                driver.redraw_departure(rng);
            }
        }
        self.reset_assignments();
        self.build_offers()
    }

    /// Restore earliest departures and rebuild, undoing every pass.
    ///
    /// # Errors
    ///
    /// Only on invariant violations.
    pub fn reset(&mut self) -> Result<(), EngineError> {
        for driver in &mut self.drivers {
            driver.reset();
        }
        self.reset_assignments();
        self.build_offers()
    }

    fn reset_assignments(&mut self) {
        for state in &mut self.parcels {
            state.itinerary = None;
        }
        for carried in &mut self.carried {
            carried.stops.clear();
        }
    }
}

fn count(value: usize) -> f64 {
    u32::try_from(value).map_or(f64::from(u32::MAX), f64::from)
}
