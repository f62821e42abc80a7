//! Builders for small instances shared by unit, behaviour and property tests.

use crate::{
    Distance, DriverRecord, Instance, ObjectiveWeights, ParcelRecord, StationId, StationNetwork,
};

/// Network of stations laid out on a line with the given gaps.
///
/// `line_network(&[5, 5])` yields stations `1 - 2 - 3` with edges of length
/// five. Direct distances equal the along-the-line distances.
#[must_use]
pub fn line_network(gaps: &[Distance]) -> StationNetwork {
    let positions: Vec<Distance> = std::iter::once(0)
        .chain(gaps.iter().scan(0, |position: &mut Distance, gap| {
            *position = position.saturating_add(*gap);
            Some(*position)
        }))
        .collect();
    let count = positions.len();
    let labels = (1..=count).map(|station| format!("S{station}")).collect();
    let mut distances = vec![vec![0; count]; count];
    for (index, gap) in gaps.iter().enumerate() {
        if let Some(cell) = distances.get_mut(index).and_then(|row| row.get_mut(index + 1)) {
            *cell = *gap;
        }
        if let Some(cell) = distances.get_mut(index + 1).and_then(|row| row.get_mut(index)) {
            *cell = *gap;
        }
    }
    let direct_distances = positions
        .iter()
        .map(|from| positions.iter().map(|to| from.abs_diff(*to)).collect())
        .collect();
    StationNetwork {
        labels,
        distances,
        direct_distances,
    }
}

/// Driver with generous defaults: tolerances of 0.5, a whole-day window,
/// a five-minute hold, speed 60 (one distance unit per minute) and
/// capacity 10.
#[must_use]
pub const fn driver_record(id: u64, source: u32, target: u32) -> DriverRecord {
    DriverRecord {
        id,
        source: StationId::new(source),
        target: StationId::new(target),
        epsilon: 0.5,
        gamma: 0.5,
        earliest_departure: 0,
        latest_arrival: 1439,
        hold: 5,
        speed: 60.0,
        capacity: 10,
    }
}

/// Parcel with a whole-day window.
#[must_use]
pub const fn parcel_record(
    id: u64,
    start: u32,
    end: u32,
    shipping_cost: f64,
    volume: u32,
) -> ParcelRecord {
    ParcelRecord {
        id,
        start: StationId::new(start),
        end: StationId::new(end),
        earliest_departure: 0,
        latest_arrival: 1439,
        shipping_cost,
        volume,
    }
}

/// Three stations on a line (`1 - 2 - 3`, gaps of five) with one driver
/// from 1 to 3 and no parcels.
#[must_use]
pub fn line_instance() -> Instance {
    Instance {
        network: line_network(&[5, 5]),
        drivers: vec![driver_record(1, 1, 3)],
        parcels: Vec::new(),
        weights: ObjectiveWeights::default(),
    }
}
