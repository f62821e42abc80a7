//! Offers: capacity left on a slice of a driver's trip.
//!
//! Offers are never edited into a different span. Splitting tombstones the
//! old offer and issues replacements, so paths computed earlier can still
//! name the old id.

use std::fmt;

use parcel_match_core::{Minutes, StationId, Volume};

use crate::driver::{Driver, Pace};
use crate::error::EngineError;
use crate::time_expanded::VertexId;

/// Globally unique, monotonically assigned offer id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OfferId(usize);

impl OfferId {
    pub(crate) const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Position of the offer in its [`OfferBook`].
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }

    /// Id as reported to callers.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0 as u64
    }
}

impl fmt::Display for OfferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything that defines an offer apart from its id and graph vertices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OfferTerms {
    /// Index of the owning driver.
    pub driver: usize,
    /// Station the offer starts from.
    pub source: StationId,
    /// Station the offer ends at.
    pub target: StationId,
    /// Departure from `source`.
    pub departure_time: Minutes,
    /// Remaining volume.
    pub capacity: Volume,
    /// Remaining driving-time budget in minutes.
    pub max_duration: f64,
    /// Remaining distance budget.
    pub max_detour: f64,
    /// Travel pace of the owning driver.
    pub pace: Pace,
    /// Whether the offer has never been split for a carried parcel.
    pub extendable: bool,
}

impl OfferTerms {
    /// Terms of a driver's first offer, or `None` when the trip is
    /// unreachable.
    ///
    /// Budgets are `(1 + epsilon)` times the shortest distance and
    /// `(1 + gamma)` times its driving time.
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "budgets are fractional tolerances over integer distances"
    )]
    pub fn initial(driver_index: usize, driver: &Driver) -> Option<Self> {
        let shortest = driver.shortest_distance()?;
        Some(Self {
            driver: driver_index,
            source: driver.source,
            target: driver.target,
            departure_time: driver.departure_time(),
            capacity: driver.capacity,
            max_duration: (1.0 + driver.gamma) * f64::from(driver.pace.duration(shortest)),
            max_detour: (1.0 + driver.epsilon) * f64::from(shortest),
            pace: driver.pace,
            extendable: true,
        })
    }

    /// Offers must move, carry something, and have slack left in both
    /// budgets.
    #[must_use]
    pub fn is_feasible(&self) -> bool {
        self.source != self.target
            && self.capacity > 0
            && self.max_duration > 0.0
            && self.max_detour > 0.0
    }
}

/// A registered offer.
#[derive(Debug, Clone, PartialEq)]
pub struct Offer {
    /// Offer id.
    pub id: OfferId,
    /// Defining terms.
    pub terms: OfferTerms,
    /// Time vertex at the offer's source, once expanded.
    pub source_vertex: Option<VertexId>,
    /// Time vertex at the offer's target, once expanded.
    pub target_vertex: Option<VertexId>,
}

/// Registry of every offer issued in a run, removed ones included.
#[derive(Debug, Clone, Default)]
pub struct OfferBook {
    offers: Vec<Offer>,
    removed: Vec<bool>,
}

impl OfferBook {
    /// Empty registry; the first offer gets id `0`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            offers: Vec::new(),
            removed: Vec::new(),
        }
    }

    /// Register an offer under the next id, or discard it when infeasible.
    pub fn issue(&mut self, terms: OfferTerms) -> Option<OfferId> {
        if !terms.is_feasible() {
            log::debug!(
                "discarding infeasible offer {} -> {} at {} (capacity {})",
                terms.source,
                terms.target,
                terms.departure_time,
                terms.capacity
            );
            return None;
        }
        let id = OfferId::new(self.offers.len());
        self.offers.push(Offer {
            id,
            terms,
            source_vertex: None,
            target_vertex: None,
        });
        self.removed.push(false);
        Some(id)
    }

    /// Number of offers ever issued.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.offers.len()
    }

    /// Whether no offer was ever issued.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }

    /// Look up an offer, removed or not.
    ///
    /// # Errors
    ///
    /// [`EngineError::UnknownOffer`] for ids never issued.
    pub fn get(&self, id: OfferId) -> Result<&Offer, EngineError> {
        self.offers.get(id.0).ok_or(EngineError::UnknownOffer(id))
    }

    /// Mutable lookup.
    ///
    /// # Errors
    ///
    /// [`EngineError::UnknownOffer`] for ids never issued.
    pub fn get_mut(&mut self, id: OfferId) -> Result<&mut Offer, EngineError> {
        self.offers.get_mut(id.0).ok_or(EngineError::UnknownOffer(id))
    }

    /// Tombstone an offer. Its record stays readable.
    ///
    /// # Errors
    ///
    /// [`EngineError::UnknownOffer`] for ids never issued.
    pub fn remove(&mut self, id: OfferId) -> Result<(), EngineError> {
        let flag = self
            .removed
            .get_mut(id.0)
            .ok_or(EngineError::UnknownOffer(id))?;
        *flag = true;
        Ok(())
    }

    /// Whether the offer is tombstoned. Unknown ids count as removed.
    #[must_use]
    pub fn is_removed(&self, id: OfferId) -> bool {
        self.removed.get(id.0).copied().unwrap_or(true)
    }

    /// Whether a live offer can take `volume` more.
    #[must_use]
    pub fn has_capacity(&self, id: OfferId, volume: Volume) -> bool {
        !self.is_removed(id)
            && self
                .offers
                .get(id.0)
                .is_some_and(|offer| offer.terms.capacity >= volume)
    }

    /// Offers that have not been tombstoned.
    pub fn live(&self) -> impl Iterator<Item = &Offer> + '_ {
        self.offers
            .iter()
            .zip(&self.removed)
            .filter(|(_, removed)| !**removed)
            .map(|(offer, _)| offer)
    }
}
