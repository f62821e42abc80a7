//! Drivers and their travel pace.

use parcel_match_core::{Distance, DriverRecord, Minutes, StationId, Volume};
use rand::Rng;

use crate::station_graph::{StationGraph, StationGraphError};

/// How fast a driver travels and how long they hold parcels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pace {
    /// Distance units per hour.
    pub speed: f64,
    /// Longest hold at a stopover, in minutes.
    pub hold: Minutes,
}

impl Pace {
    /// Minutes needed to cover `distance`, rounded down.
    ///
    /// # Examples
    /// ```
    /// use parcel_match_engine::Pace;
    ///
    /// let pace = Pace { speed: 40.0, hold: 5 };
    /// assert_eq!(pace.duration(10), 15);
    /// assert_eq!(pace.duration(3), 4);
    /// ```
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "travel time is distance over a fractional speed, floored to whole minutes"
    )]
    pub fn duration(self, distance: Distance) -> Minutes {
        (f64::from(distance) * 60.0 / self.speed).floor() as Minutes
    }
}

/// A validated driver trip plus the departure time used in the current run.
#[derive(Debug, Clone, PartialEq)]
pub struct Driver {
    /// Driver id from the input record.
    pub id: u64,
    /// Trip origin.
    pub source: StationId,
    /// Trip destination.
    pub target: StationId,
    /// Fractional detour tolerance.
    pub epsilon: f64,
    /// Fractional delay tolerance.
    pub gamma: f64,
    /// Earliest departure.
    pub earliest_departure: Minutes,
    /// Latest arrival.
    pub latest_arrival: Minutes,
    /// Travel pace.
    pub pace: Pace,
    /// Carrying capacity.
    pub capacity: Volume,
    shortest_distance: Option<Distance>,
    latest_departure: Minutes,
    departure_time: Minutes,
}

impl Driver {
    /// Build a driver from its record.
    ///
    /// A trip whose target cannot be reached keeps `shortest_distance` empty
    /// and never produces an offer.
    ///
    /// # Errors
    ///
    /// Fails when the record names a station unknown to `stations`.
    pub fn new(record: &DriverRecord, stations: &StationGraph) -> Result<Self, StationGraphError> {
        let pace = Pace {
            speed: record.speed,
            hold: record.hold,
        };
        let shortest_distance = stations.reachable_distance(record.source, record.target)?;
        let shortest_duration = shortest_distance.map_or(0, |distance| pace.duration(distance));
        let latest_departure = record
            .latest_arrival
            .saturating_sub(shortest_duration)
            .max(record.earliest_departure);
        Ok(Self {
            id: record.id,
            source: record.source,
            target: record.target,
            epsilon: record.epsilon,
            gamma: record.gamma,
            earliest_departure: record.earliest_departure,
            latest_arrival: record.latest_arrival,
            pace,
            capacity: record.capacity,
            shortest_distance,
            latest_departure,
            departure_time: record.earliest_departure,
        })
    }

    /// Departure time used for the current run.
    #[must_use]
    pub const fn departure_time(&self) -> Minutes {
        self.departure_time
    }

    /// Latest departure that still reaches the target on time by the
    /// shortest route.
    #[must_use]
    pub const fn latest_departure(&self) -> Minutes {
        self.latest_departure
    }

    /// Shortest distance from source to target, if reachable.
    #[must_use]
    pub const fn shortest_distance(&self) -> Option<Distance> {
        self.shortest_distance
    }

    /// Duration of the direct trip, or zero when it is unreachable.
    #[must_use]
    pub fn shortest_duration(&self) -> Minutes {
        self.shortest_distance
            .map_or(0, |distance| self.pace.duration(distance))
    }

    /// Restore the earliest departure.
    pub const fn reset(&mut self) {
        self.departure_time = self.earliest_departure;
    }

    /// Draw a departure uniformly from `[earliest_departure, latest_departure]`.
    pub fn redraw_departure<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.departure_time = rng.gen_range(self.earliest_departure..=self.latest_departure);
    }
}
