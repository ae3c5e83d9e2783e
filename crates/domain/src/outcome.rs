//! Run outcomes: what a run observed and did, handed to reporting sinks.

use serde::Serialize;

use crate::error::HardwareError;
use crate::pot::{PotConfig, PotId};
use crate::time::Timestamp;

/// Observations and actions for one pot during a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PotOutcome {
    pub pot_id: PotId,
    pub description: String,
    pub sensor_reading: u32,
    /// The pot's dry level at the time of the run.
    pub cutoff: u32,
    pub watered: bool,
    /// Confirmatory reading taken after the settle delay, if watered.
    pub second_reading: Option<u32>,
    /// Length of the current dry spell, `None` when the soil was wet.
    pub dry_hours: Option<f64>,
}

impl PotOutcome {
    /// Outcome of a pot that was read but not (yet) watered.
    #[must_use]
    pub fn observed(pot: &PotConfig, sensor_reading: u32) -> Self {
        Self {
            pot_id: pot.id.clone(),
            description: pot.description.clone(),
            sensor_reading,
            cutoff: pot.sensor_dry_level,
            watered: false,
            second_reading: None,
            dry_hours: None,
        }
    }
}

/// Everything a single run reports: one entry per successfully read pot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunOutcome {
    pub timestamp: Timestamp,
    pub pots: Vec<PotOutcome>,
}

impl RunOutcome {
    #[must_use]
    pub fn new(timestamp: Timestamp) -> Self {
        Self {
            timestamp,
            pots: Vec::new(),
        }
    }

    /// Pot entries sorted by pot id, the order sinks write them in.
    #[must_use]
    pub fn sorted_by_id(&self) -> Vec<&PotOutcome> {
        let mut pots: Vec<&PotOutcome> = self.pots.iter().collect();
        pots.sort_by(|a, b| a.pot_id.cmp(&b.pot_id));
        pots
    }

    #[must_use]
    pub fn watered_count(&self) -> usize {
        self.pots.iter().filter(|p| p.watered).count()
    }
}

/// A pot whose processing was cut short by a hardware failure.
#[derive(Debug)]
pub struct PotFailure {
    pub pot_id: PotId,
    pub error: HardwareError,
}

/// Result of one engine run: the reported outcome plus per-pot failures.
#[derive(Debug)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    pub failures: Vec<PotFailure>,
}

impl RunSummary {
    #[must_use]
    pub fn new(timestamp: Timestamp) -> Self {
        Self {
            outcome: RunOutcome::new(timestamp),
            failures: Vec::new(),
        }
    }

    pub fn record_failure(&mut self, pot_id: PotId, error: HardwareError) {
        self.failures.push(PotFailure { pot_id, error });
    }

    /// Outcome entry for `id`, if the pot was read this run.
    #[must_use]
    pub fn pot(&self, id: &str) -> Option<&PotOutcome> {
        self.outcome.pots.iter().find(|p| p.pot_id.as_str() == id)
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
