use thiserror::Error;

use crate::{Instance, InstanceValidationError, MatchReport};

/// Errors returned by [`Matcher::solve`].
///
/// Unassigned parcels and discarded offers are part of a successful
/// [`MatchReport`]; only malformed input and broken engine invariants end up
/// here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    /// The instance failed validation.
    #[error("invalid instance: {0}")]
    InvalidInstance(#[from] InstanceValidationError),
    /// The engine detected an internal inconsistency.
    #[error("matching invariant violated: {detail}")]
    InvariantViolation {
        /// Description of the failed invariant.
        detail: String,
    },
}

/// Assign parcels to driver trips.
///
/// Implementations must be deterministic for a given instance and
/// configuration. Matchers must be `Send + Sync` so a configured matcher can
/// be shared across threads, even though a single solve runs on one thread.
pub trait Matcher: Send + Sync {
    /// Match every parcel of `instance`, producing a report.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::InvalidInstance`] for malformed input.
    fn solve(&self, instance: &Instance) -> Result<MatchReport, MatchError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::line_instance;
    use rstest::rstest;

    struct ShipEverything;

    impl Matcher for ShipEverything {
        fn solve(&self, instance: &Instance) -> Result<MatchReport, MatchError> {
            instance.validate()?;
            Ok(MatchReport {
                parcels: Vec::new(),
                drivers: Vec::new(),
                objective: 0.0,
                unmatched_objective: 0.0,
                iterations: 1,
                best_iteration: 0,
            })
        }
    }

    #[rstest]
    fn validation_errors_convert_into_match_errors() {
        let mut instance = line_instance();
        instance.network.labels.clear();
        let err = ShipEverything.solve(&instance).expect_err("empty network");
        assert_eq!(
            err,
            MatchError::InvalidInstance(InstanceValidationError::EmptyNetwork)
        );
    }

    #[rstest]
    fn valid_instances_reach_the_matcher() {
        let report = ShipEverything.solve(&line_instance()).expect("valid instance");
        assert_eq!(report.iterations, 1);
    }
}
