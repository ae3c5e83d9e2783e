//! Relay safety guard.
//!
//! A watering relay must never be left open. [`RelayGuard`] opens a relay
//! when created and closes it when dropped, so every exit path of a
//! watering hold ends with the valve shut, including the hold future being
//! dropped when a termination signal interrupts the run.

use tracing::{debug, error, warn};

/// Logic level of a GPIO line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl Level {
    /// Value written to a sysfs `value` attribute.
    #[must_use]
    pub fn as_sysfs(self) -> &'static str {
        match self {
            Self::Low => "0",
            Self::High => "1",
        }
    }
}

/// Relay boards are active-low: pulling the line low energises the coil.
pub const OPEN: Level = Level::Low;
pub const CLOSED: Level = Level::High;

/// Minimal GPIO output access needed to drive a relay.
pub trait RelayDriver {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Configure `pin` as an output whose initial level is [`CLOSED`].
    fn prepare(&self, pin: u8) -> Result<(), Self::Error>;

    fn write(&self, pin: u8, level: Level) -> Result<(), Self::Error>;
}

/// How far a guarded relay got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// The open write has not succeeded yet.
    Opening,
    /// The relay is open and watering.
    Holding,
    /// An explicit close failed.
    Closing,
    Closed,
}

/// An open relay. Closes the relay on drop unless [`close`](Self::close)
/// already did.
#[must_use = "dropping the guard closes the relay immediately"]
pub struct RelayGuard<'a, D: RelayDriver> {
    driver: &'a D,
    pin: u8,
    phase: Phase,
}

impl<'a, D: RelayDriver> RelayGuard<'a, D> {
    /// Prepare `pin` and open its relay.
    ///
    /// # Errors
    ///
    /// Returns the driver error if the pin cannot be configured or driven.
    /// A relay that failed to open is still driven closed before returning.
    pub fn open(driver: &'a D, pin: u8) -> Result<Self, D::Error> {
        driver.prepare(pin)?;
        let mut guard = Self {
            driver,
            pin,
            phase: Phase::Opening,
        };
        driver.write(pin, OPEN)?;
        guard.phase = Phase::Holding;
        Ok(guard)
    }

    #[must_use]
    pub fn pin(&self) -> u8 {
        self.pin
    }

    /// Close the relay and disarm the guard.
    ///
    /// # Errors
    ///
    /// Returns the driver error; the guard then retries once on drop.
    pub fn close(mut self) -> Result<(), D::Error> {
        self.phase = Phase::Closing;
        self.driver.write(self.pin, CLOSED)?;
        self.phase = Phase::Closed;
        Ok(())
    }
}

impl<D: RelayDriver> Drop for RelayGuard<'_, D> {
    fn drop(&mut self) {
        if self.phase == Phase::Closed {
            return;
        }
        if let Err(err) = self.driver.write(self.pin, CLOSED) {
            error!(pin = self.pin, error = %err, "failed to close relay");
            return;
        }
        match self.phase {
            Phase::Opening => debug!(pin = self.pin, "relay closed after failed open"),
            Phase::Holding => warn!(pin = self.pin, "relay closed before hold completed"),
            Phase::Closing => debug!(pin = self.pin, "relay closed on retry"),
            Phase::Closed => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    use super::*;

    /// Log output written by the guard while `f` runs.
    fn logged(f: impl FnOnce()) -> String {
        #[derive(Clone, Default)]
        struct Sink(Arc<Mutex<Vec<u8>>>);

        impl Write for Sink {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let sink = Sink::default();
        let writer = sink.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = sink.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[derive(Debug, thiserror::Error)]
    #[error("line busy")]
    struct Busy;

    #[derive(Default)]
    struct Recording {
        writes: RefCell<Vec<(u8, Level)>>,
        prepared: RefCell<Vec<u8>>,
        failing_writes: Cell<usize>,
    }

    impl RelayDriver for Recording {
        type Error = Busy;

        fn prepare(&self, pin: u8) -> Result<(), Busy> {
            self.prepared.borrow_mut().push(pin);
            Ok(())
        }

        fn write(&self, pin: u8, level: Level) -> Result<(), Busy> {
            self.writes.borrow_mut().push((pin, level));
            let failing = self.failing_writes.get();
            if failing > 0 {
                self.failing_writes.set(failing - 1);
                return Err(Busy);
            }
            Ok(())
        }
    }

    #[test]
    fn should_open_low_and_close_high() {
        let driver = Recording::default();
        let guard = RelayGuard::open(&driver, 17).unwrap();
        guard.close().unwrap();

        assert_eq!(*driver.prepared.borrow(), [17]);
        assert_eq!(*driver.writes.borrow(), [(17, Level::Low), (17, Level::High)]);
    }

    #[test]
    fn should_close_relay_when_guard_dropped() {
        let driver = Recording::default();
        {
            let _guard = RelayGuard::open(&driver, 22).unwrap();
        }
        assert_eq!(*driver.writes.borrow(), [(22, OPEN), (22, CLOSED)]);
    }

    #[test]
    fn should_retry_close_on_drop_when_close_fails() {
        let driver = Recording::default();
        let guard = RelayGuard::open(&driver, 5).unwrap();
        driver.failing_writes.set(1);

        assert!(guard.close().is_err());
        assert_eq!(
            *driver.writes.borrow(),
            [(5, OPEN), (5, CLOSED), (5, CLOSED)]
        );
    }

    #[test]
    fn should_drive_closed_when_open_fails() {
        let driver = Recording::default();
        driver.failing_writes.set(1);

        let log = logged(|| assert!(RelayGuard::open(&driver, 9).is_err()));

        assert_eq!(*driver.writes.borrow(), [(9, OPEN), (9, CLOSED)]);
        assert!(log.contains("relay closed after failed open"));
        assert!(!log.contains("before hold completed"));
    }

    #[test]
    fn should_warn_when_hold_is_cut_short() {
        let driver = Recording::default();

        let log = logged(|| drop(RelayGuard::open(&driver, 22).unwrap()));

        assert!(log.contains("WARN"));
        assert!(log.contains("relay closed before hold completed"));
    }

    #[test]
    fn should_stay_quiet_when_closed_explicitly() {
        let driver = Recording::default();

        let log = logged(|| RelayGuard::open(&driver, 22).unwrap().close().unwrap());

        assert!(log.is_empty());
    }

    #[test]
    fn should_report_relay_that_cannot_be_closed() {
        let driver = Recording::default();
        let guard = RelayGuard::open(&driver, 5).unwrap();
        driver.failing_writes.set(2);

        let log = logged(|| assert!(guard.close().is_err()));

        assert!(log.contains("ERROR"));
        assert!(log.contains("failed to close relay"));
    }

    #[test]
    fn should_map_levels_to_sysfs_values() {
        assert_eq!(OPEN.as_sysfs(), "0");
        assert_eq!(CLOSED.as_sysfs(), "1");
    }
}
