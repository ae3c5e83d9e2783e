//! Roster: the ordered set of pots handled by one run.
//!
//! The roster owns the uniqueness invariants: no two pots share an id, an
//! ADC channel, or a relay pin. Pots are added in declaration order, so the
//! first duplicate encountered is the one reported.

use crate::error::ValidationError;
use crate::pot::{PotConfig, PotId};

/// Ordered collection of validated pots with unique hardware assignments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PotRoster {
    pots: Vec<PotConfig>,
}

impl PotRoster {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a roster from pots in declaration order.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] raised by [`try_push`](Self::try_push).
    pub fn try_from_pots(
        pots: impl IntoIterator<Item = PotConfig>,
    ) -> Result<Self, ValidationError> {
        let mut roster = Self::new();
        for pot in pots {
            roster.try_push(pot)?;
        }
        Ok(roster)
    }

    /// Append a pot after checking its parameters and uniqueness.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::OutOfRange`] for an invalid parameter,
    /// [`ValidationError::DuplicatePot`] for a repeated id, and
    /// [`ValidationError::DuplicateAdcChannel`] /
    /// [`ValidationError::DuplicateRelayPin`] naming the pot that already
    /// holds the resource.
    pub fn try_push(&mut self, pot: PotConfig) -> Result<(), ValidationError> {
        pot.validate()?;

        if self.get(pot.id.as_str()).is_some() {
            return Err(ValidationError::DuplicatePot(pot.id.to_string()));
        }
        if let Some(owner) = self.pots.iter().find(|p| p.adc_channel == pot.adc_channel) {
            return Err(ValidationError::DuplicateAdcChannel {
                channel: pot.adc_channel,
                owner: owner.id.to_string(),
            });
        }
        if let Some(owner) = self.pots.iter().find(|p| p.relay_pin == pot.relay_pin) {
            return Err(ValidationError::DuplicateRelayPin {
                pin: pot.relay_pin,
                owner: owner.id.to_string(),
            });
        }

        self.pots.push(pot);
        Ok(())
    }

    /// Look up a pot by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&PotConfig> {
        self.pots.iter().find(|p| p.id.as_str() == id)
    }

    /// Pot ids in declaration order.
    pub fn ids(&self) -> impl Iterator<Item = &PotId> {
        self.pots.iter().map(|p| &p.id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PotConfig> {
        self.pots.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pots.is_empty()
    }
}

impl<'a> IntoIterator for &'a PotRoster {
    type Item = &'a PotConfig;
    type IntoIter = std::slice::Iter<'a, PotConfig>;

    fn into_iter(self) -> Self::IntoIter {
        self.pots.iter()
    }
}
