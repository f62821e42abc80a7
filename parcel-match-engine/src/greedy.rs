//! `GreedyMatcher`: the greedy pass plus optional randomised restarts.

use std::time::Instant;

use parcel_match_core::{Instance, MatchError, MatchReport, Matcher};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::EngineError;
use crate::model::{MatchingModel, ShuffleMode};

/// Configuration for [`GreedyMatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GreedyMatcherConfig {
    /// Restarts that keep the departure of drivers that carried parcels.
    pub constrained_restarts: usize,
    /// Restarts that redraw every driver's departure.
    pub full_restarts: usize,
    /// Seed for departure redraws.
    pub seed: u64,
}

impl Default for GreedyMatcherConfig {
    fn default() -> Self {
        Self {
            constrained_restarts: 0,
            full_restarts: 0,
            seed: 42,
        }
    }
}

/// Matcher that routes parcels greedily by decreasing shipping cost.
///
/// The first pass uses every driver's earliest departure. Each restart
/// shuffles departures, rebuilds the offers and reruns the pass; the pass
/// with the lowest objective is reported.
///
/// # Examples
/// ```
/// use parcel_match_core::Matcher;
/// use parcel_match_core::test_support::{line_instance, parcel_record};
/// use parcel_match_engine::GreedyMatcher;
///
/// let mut instance = line_instance();
/// instance.parcels.push(parcel_record(1, 1, 3, 40.0, 5));
/// let report = GreedyMatcher::new().solve(&instance).expect("valid instance");
/// assert_eq!(report.assigned_count(), 1);
/// assert_eq!(report.iterations, 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct GreedyMatcher {
    config: GreedyMatcherConfig,
}

impl GreedyMatcher {
    /// Matcher with a single deterministic pass.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(GreedyMatcherConfig::default())
    }

    /// Matcher with explicit restart settings.
    #[must_use]
    pub const fn with_config(config: GreedyMatcherConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &GreedyMatcherConfig {
        &self.config
    }

    fn run(&self, instance: &Instance) -> Result<MatchReport, EngineError> {
        let started_at = Instant::now();
        let mut model = MatchingModel::new(instance)?;
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        let modes = std::iter::repeat_n(ShuffleMode::Constrained, self.config.constrained_restarts)
            .chain(std::iter::repeat_n(ShuffleMode::Full, self.config.full_restarts));

        model.assign_parcels()?;
        let mut best = model.report(1, 0)?;
        log::info!("pass 0: objective {:.3}", best.objective);
        let mut iterations = 1;
        for (pass, mode) in modes.enumerate().map(|(index, mode)| (index + 1, mode)) {
            model.shuffle(mode, &mut rng)?;
            model.assign_parcels()?;
            let objective = model.compute_objective()?;
            log::info!("pass {pass} ({mode:?}): objective {objective:.3}");
            iterations += 1;
            if objective < best.objective {
                best = model.report(iterations, pass)?;
            }
        }
        best.iterations = iterations;
        log::info!(
            "best objective {:.3} from pass {} of {iterations} in {:?}",
            best.objective,
            best.best_iteration,
            started_at.elapsed()
        );
        Ok(best)
    }
}

impl Matcher for GreedyMatcher {
    fn solve(&self, instance: &Instance) -> Result<MatchReport, MatchError> {
        self.run(instance).map_err(MatchError::from)
    }
}
