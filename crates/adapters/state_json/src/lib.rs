//! # watering-adapter-state-json
//!
//! JSON file persistence for per-pot state.
//!
//! ## Responsibilities
//! - Implement [`watering_app::ports::StateStore`] on top of a single file
//! - Tell a first run (no file yet) apart from a corrupt file
//! - Replace the file atomically so an interrupted save never truncates it
//!
//! ## Dependency rule
//! Depends on `watering-app` (for the port trait) and `watering-domain`.
//! The `app` and `domain` crates must never reference this adapter.

pub mod error;
pub mod store;

pub use error::JsonStoreError;
pub use store::JsonStateStore;
