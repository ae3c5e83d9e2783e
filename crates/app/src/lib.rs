//! # watering-app
//!
//! Application layer: the watering use-case and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `Hardware`: read a moisture sensor, pulse a watering relay
//!   - `Reporter`: record the outcome of a run
//!   - `StateStore`: load and save per-pot state between runs
//!   - `Clock`: current time
//! - Define the **driving** use-case, `WateringEngine`, which runs every pot
//!   through sensor → decision → relay → report and persists the result
//! - Apply the recovery policies of a run (state fallback, per-pot isolation)
//!
//! ## Dependency rule
//! Depends on `watering-domain` only (plus `tokio::time` for delays).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod ports;
pub mod watering_engine;
