//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod clock;
pub mod hardware;
pub mod reporting;
pub mod state_store;

pub use clock::{Clock, SystemClock};
pub use hardware::Hardware;
pub use reporting::Reporter;
pub use state_store::{LoadedState, StateStore};
