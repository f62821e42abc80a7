//! Behavioural tests for `Instance::validate` using rstest-bdd.

use std::cell::RefCell;

use parcel_match_core::{
    DriverRecord, Instance, InstanceValidationError, ObjectiveWeights, ParcelRecord, RecordKind,
    StationId, StationNetwork,
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

#[derive(Debug, Default)]
struct ValidationWorld {
    instance: RefCell<Instance>,
    outcome: RefCell<Option<Result<(), InstanceValidationError>>>,
}

impl ValidationWorld {
    #[expect(
        clippy::expect_used,
        reason = "behaviour tests use expect for readable failures"
    )]
    fn outcome(&self) -> Result<(), InstanceValidationError> {
        self.outcome
            .borrow()
            .clone()
            .expect("validation should run before assertions")
    }
}

#[fixture]
fn world() -> ValidationWorld {
    ValidationWorld::default()
}

#[given("an instance with stations {first} and {second} six apart")]
fn given_instance(world: &ValidationWorld, first: String, second: String) {
    let labels = vec![
        first.trim_matches('"').to_owned(),
        second.trim_matches('"').to_owned(),
    ];
    let matrix = vec![vec![0, 6], vec![6, 0]];
    world.instance.replace(Instance {
        network: StationNetwork {
            labels,
            distances: matrix.clone(),
            direct_distances: matrix,
        },
        drivers: vec![DriverRecord {
            id: 1,
            source: StationId::new(1),
            target: StationId::new(2),
            epsilon: 0.2,
            gamma: 0.3,
            earliest_departure: 480,
            latest_arrival: 600,
            hold: 5,
            speed: 40.0,
            capacity: 12,
        }],
        parcels: vec![ParcelRecord {
            id: 7,
            start: StationId::new(1),
            end: StationId::new(2),
            earliest_departure: 420,
            latest_arrival: 720,
            shipping_cost: 18.5,
            volume: 3,
        }],
        weights: ObjectiveWeights::default(),
    });
}

#[given("parcel {id} is listed twice")]
fn given_duplicate_parcel(world: &ValidationWorld, id: u64) {
    let mut instance = world.instance.borrow_mut();
    let mut copy = instance.parcels.first().cloned().unwrap_or_else(|| ParcelRecord {
        id,
        start: StationId::new(1),
        end: StationId::new(2),
        earliest_departure: 0,
        latest_arrival: 60,
        shipping_cost: 1.0,
        volume: 1,
    });
    copy.id = id;
    instance.parcels.push(copy);
}

#[given("the parcel is due at minute {minute}")]
fn given_late_parcel(world: &ValidationWorld, minute: u32) {
    for parcel in &mut world.instance.borrow_mut().parcels {
        parcel.latest_arrival = minute;
    }
}

#[given("the driver ends at station {station}")]
fn given_unknown_target(world: &ValidationWorld, station: u32) {
    for driver in &mut world.instance.borrow_mut().drivers {
        driver.target = StationId::new(station);
    }
}

#[when("the instance is round-tripped through JSON")]
#[expect(
    clippy::expect_used,
    reason = "behaviour tests use expect for readable failures"
)]
fn when_round_tripped(world: &ValidationWorld) {
    let mut value = serde_json::to_value(&*world.instance.borrow()).expect("serialize instance");
    if let Some(object) = value.as_object_mut() {
        object.remove("weights");
    }
    let decoded: Instance = serde_json::from_value(value).expect("decode instance");
    world.instance.replace(decoded);
}

#[when("the instance is validated")]
fn when_validated(world: &ValidationWorld) {
    let outcome = world.instance.borrow().validate();
    world.outcome.replace(Some(outcome));
}

#[then("validation succeeds")]
fn then_valid(world: &ValidationWorld) {
    assert_eq!(world.outcome(), Ok(()));
}

#[then("the weights default to one")]
fn then_default_weights(world: &ValidationWorld) {
    assert_eq!(world.instance.borrow().weights, ObjectiveWeights::default());
}

#[then("validation fails with a duplicate parcel id {id}")]
fn then_duplicate(world: &ValidationWorld, id: u64) {
    assert_eq!(
        world.outcome(),
        Err(InstanceValidationError::DuplicateId {
            kind: RecordKind::Parcel,
            id,
        })
    );
}

#[then("validation fails because minute {minute} is outside the day")]
fn then_out_of_range(world: &ValidationWorld, minute: u32) {
    assert_eq!(
        world.outcome(),
        Err(InstanceValidationError::TimeOutOfRange {
            kind: RecordKind::Parcel,
            id: 7,
            time: minute,
        })
    );
}

#[then("validation fails because station {station} is unknown")]
fn then_unknown_station(world: &ValidationWorld, station: u32) {
    assert_eq!(
        world.outcome(),
        Err(InstanceValidationError::UnknownStation {
            kind: RecordKind::Driver,
            id: 1,
            station: StationId::new(station),
        })
    );
}

#[scenario(path = "tests/features/instance_validation.feature", index = 0)]
fn sound_instance(world: ValidationWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/instance_validation.feature", index = 1)]
fn duplicate_parcel(world: ValidationWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/instance_validation.feature", index = 2)]
fn parcel_after_midnight(world: ValidationWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/instance_validation.feature", index = 3)]
fn unknown_driver_station(world: ValidationWorld) {
    let _ = world;
}
