//! Pot state: what a run remembers for the next one.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::pot::PotId;
use crate::time::{Timestamp, hours_between};

/// Dry-spell and watering history of one pot.
///
/// A fresh state (both fields empty) means the pot has never been watered
/// and is not in a dry spell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PotState {
    pub last_watering_time: Option<Timestamp>,
    /// Start of the current unbroken dry streak, `None` when the soil is wet.
    pub dry_spell_start_time: Option<Timestamp>,
}

impl PotState {
    #[must_use]
    pub fn is_dry_spell_active(&self) -> bool {
        self.dry_spell_start_time.is_some()
    }

    /// Hours the current dry spell has lasted at `now`, if one is active.
    #[must_use]
    pub fn dry_spell_hours(&self, now: Timestamp) -> Option<f64> {
        self.dry_spell_start_time
            .map(|start| hours_between(start, now))
    }

    /// Start a dry spell at `now` unless one is already running.
    pub fn start_dry_spell(&mut self, now: Timestamp) {
        self.dry_spell_start_time.get_or_insert(now);
    }

    /// End the current dry spell, returning when it started.
    pub fn end_dry_spell(&mut self) -> Option<Timestamp> {
        self.dry_spell_start_time.take()
    }

    pub fn record_watering(&mut self, at: Timestamp) {
        self.last_watering_time = Some(at);
    }
}

/// Per-pot state keyed by pot id. Persisted as a whole after every run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateMap(BTreeMap<PotId, PotState>);

impl StateMap {
    /// Fresh, empty state for every given pot.
    pub fn initialize<'a>(ids: impl IntoIterator<Item = &'a PotId>) -> Self {
        Self(
            ids.into_iter()
                .map(|id| (id.clone(), PotState::default()))
                .collect(),
        )
    }

    /// Mutable state for `id`, created empty if the pot has no history yet.
    pub fn entry_for(&mut self, id: &PotId) -> &mut PotState {
        self.0.entry(id.clone()).or_default()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&PotState> {
        self.0.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PotId, &PotState)> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(PotId, PotState)> for StateMap {
    fn from_iter<I: IntoIterator<Item = (PotId, PotState)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
