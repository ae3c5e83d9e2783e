//! State store port: durable per-pot state between runs.

use std::future::Future;

use watering_domain::error::{StateLoadError, StateSaveError};
use watering_domain::state::StateMap;

/// What a store found when asked for the previous run's state.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadedState {
    /// State written by an earlier run.
    Restored(StateMap),
    /// Nothing has been saved yet (first run).
    Missing,
}

/// Loads and saves the full state map. Single writer: runs must not overlap.
pub trait StateStore: Send + Sync {
    /// Read the state saved by the previous run.
    ///
    /// A store that has never been written returns [`LoadedState::Missing`];
    /// [`StateLoadError`] is reserved for state that exists but is unusable.
    fn load(&self) -> impl Future<Output = Result<LoadedState, StateLoadError>> + Send;

    /// Replace the stored state with `states`.
    fn save(&self, states: &StateMap) -> impl Future<Output = Result<(), StateSaveError>> + Send;
}
