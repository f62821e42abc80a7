//! Per-station index of time vertices.

use std::collections::BTreeMap;
use std::ops::Bound;

use parcel_match_core::Minutes;

use crate::time_expanded::VertexId;

/// Time-sorted slots of vertex ids at one station.
///
/// Vertices sharing a time keep their insertion order inside the slot.
/// Empty slots are dropped, so every slot holds at least one vertex.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeTable {
    slots: BTreeMap<Minutes, Vec<VertexId>>,
}

impl TimeTable {
    /// Empty table.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: BTreeMap::new(),
        }
    }

    /// Vertices registered at exactly `time`.
    #[must_use]
    pub fn slot(&self, time: Minutes) -> &[VertexId] {
        self.slots.get(&time).map_or(&[], Vec::as_slice)
    }

    /// Append `vertex` to the slot at `time`.
    pub fn insert(&mut self, time: Minutes, vertex: VertexId) {
        self.slots.entry(time).or_default().push(vertex);
    }

    /// Drop `vertex` from the slot at `time`, and the slot once empty.
    ///
    /// Returns whether the vertex was present.
    pub fn remove(&mut self, time: Minutes, vertex: VertexId) -> bool {
        let Some(slot) = self.slots.get_mut(&time) else {
            return false;
        };
        let before = slot.len();
        slot.retain(|entry| *entry != vertex);
        let removed = slot.len() != before;
        if slot.is_empty() {
            self.slots.remove(&time);
        }
        removed
    }

    /// First vertex of the earliest slot at or after `time`.
    #[must_use]
    pub fn first_at_or_after(&self, time: Minutes) -> Option<VertexId> {
        self.slots
            .range(time..)
            .next()
            .and_then(|(_, slot)| slot.first().copied())
    }

    /// Last vertex of the latest slot strictly before `time`.
    #[must_use]
    pub fn last_before(&self, time: Minutes) -> Option<VertexId> {
        self.slots
            .range(..time)
            .next_back()
            .and_then(|(_, slot)| slot.last().copied())
    }

    /// Last vertex of the latest slot at or before `time`.
    ///
    /// A library query for callers inspecting a station's timeline; matching
    /// itself only walks forward.
    #[must_use]
    pub fn last_at_or_before(&self, time: Minutes) -> Option<VertexId> {
        self.slots
            .range(..=time)
            .next_back()
            .and_then(|(_, slot)| slot.last().copied())
    }

    /// The vertex following `vertex` in time order.
    ///
    /// Looks further along the slot at `time` first, then at the first vertex
    /// of the next slot. A `vertex` missing from its slot is treated as the
    /// slot's end.
    #[must_use]
    pub fn next_after(&self, time: Minutes, vertex: VertexId) -> Option<VertexId> {
        let same_slot = self.slot(time);
        let later_in_slot = same_slot
            .iter()
            .position(|entry| *entry == vertex)
            .and_then(|position| same_slot.get(position + 1))
            .copied();
        later_in_slot.or_else(|| {
            self.slots
                .range((Bound::Excluded(time), Bound::Unbounded))
                .next()
                .and_then(|(_, slot)| slot.first().copied())
        })
    }

    /// Number of registered vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.values().map(Vec::len).sum()
    }

    /// Whether no vertex is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Every `(time, vertex)` pair in time order.
    ///
    /// Used for inspection and diagnostics rather than by the matching loop.
    pub fn iter(&self) -> impl Iterator<Item = (Minutes, VertexId)> + '_ {
        self.slots
            .iter()
            .flat_map(|(time, slot)| slot.iter().map(move |vertex| (*time, *vertex)))
    }
}
