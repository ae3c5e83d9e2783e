//! # watering-domain
//!
//! Pure domain model for the watering station.
//!
//! ## Responsibilities
//! - Foundational types: error taxonomy, timestamps
//! - Define **Pots** (one sensor channel + one relay pin each) and the
//!   **Roster** that keeps their hardware assignments unique
//! - Define **Pot state** (dry-spell and watering history carried across runs)
//! - Define the **watering decision** (wet/dry state machine)
//! - Define **Run outcomes** handed to reporting sinks
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod time;

pub mod decision;
pub mod outcome;
pub mod pot;
pub mod roster;
pub mod state;
