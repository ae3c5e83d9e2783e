//! # watering-adapter-reporting
//!
//! Sinks implementing [`watering_app::ports::Reporter`].
//!
//! - [`CsvReporter`] appends one line per run to a statistics file
//! - [`ConsoleReporter`] prints a short table of the run to stdout
//!
//! Combine them with the `Option` and tuple impls of the port.

pub mod console;
pub mod csv;
pub mod error;

pub use console::ConsoleReporter;
pub use csv::CsvReporter;
pub use error::CsvError;
