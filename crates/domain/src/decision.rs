//! Watering decision: the per-pot wet/dry state machine.
//!
//! ```text
//!            reading >= dry level               reading >= dry level
//!  ┌─────┐ ────────────────────────▶ ┌─────┐ ◀──────────────────────┐
//!  │ Wet │                           │ Dry │ ───────────────────────┘
//!  └─────┘ ◀──────────────────────── └─────┘  (spell start unchanged)
//!            reading < dry level
//! ```
//!
//! Every dry observation asks for watering. The elapsed dry-spell time is
//! computed for reporting only.

use crate::pot::PotConfig;
use crate::state::PotState;
use crate::time::Timestamp;

/// Result of evaluating one sensor reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    /// Soil is wet enough; any dry spell has ended.
    Wet,
    /// Soil is dry; `dry_hours` is how long the current spell has lasted.
    Dry { dry_hours: f64 },
}

impl Decision {
    #[must_use]
    pub fn needs_watering(self) -> bool {
        matches!(self, Self::Dry { .. })
    }

    #[must_use]
    pub fn dry_hours(self) -> Option<f64> {
        match self {
            Self::Wet => None,
            Self::Dry { dry_hours } => Some(dry_hours),
        }
    }

    /// Whether the dry spell has outlasted the pot's `max_dry_hours`.
    #[must_use]
    pub fn exceeds_max_dry_period(self, pot: &PotConfig) -> bool {
        self.dry_hours()
            .is_some_and(|hours| hours > f64::from(pot.max_dry_hours))
    }
}

/// Update `state` with `reading` taken at `now` and decide whether to water.
///
/// A reading exactly at `pot.sensor_dry_level` counts as dry.
pub fn decide(reading: u32, pot: &PotConfig, state: &mut PotState, now: Timestamp) -> Decision {
    if reading < pot.sensor_dry_level {
        state.end_dry_spell();
        return Decision::Wet;
    }

    state.start_dry_spell(now);
    let dry_hours = state.dry_spell_hours(now).unwrap_or_default();
    Decision::Dry { dry_hours }
}
