//! Reporting port: sinks that record run outcomes.
//!
//! Sinks compose statically: `Option<R>` is a sink that may be switched
//! off, and a pair `(A, B)` forwards to both.

use std::future::Future;

use watering_domain::error::ReportError;
use watering_domain::outcome::RunOutcome;

/// Records the outcome of a run (CSV file, console, …).
pub trait Reporter: Send + Sync {
    fn report(&self, outcome: &RunOutcome) -> impl Future<Output = Result<(), ReportError>> + Send;
}

impl<R: Reporter> Reporter for Option<R> {
    async fn report(&self, outcome: &RunOutcome) -> Result<(), ReportError> {
        match self {
            Some(reporter) => reporter.report(outcome).await,
            None => Ok(()),
        }
    }
}

/// Both sinks are always attempted; the first error is returned.
impl<A: Reporter, B: Reporter> Reporter for (A, B) {
    async fn report(&self, outcome: &RunOutcome) -> Result<(), ReportError> {
        let first = self.0.report(outcome).await;
        let second = self.1.report(outcome).await;
        first.and(second)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::{TimeZone, Utc};

    use super::*;

    #[derive(Default)]
    struct Recording {
        seen: Mutex<usize>,
        fail: bool,
    }

    impl Reporter for Recording {
        async fn report(&self, _outcome: &RunOutcome) -> Result<(), ReportError> {
            *self.seen.lock().unwrap() += 1;
            if self.fail {
                return Err(ReportError::new(std::io::Error::other("disk full")));
            }
            Ok(())
        }
    }

    fn outcome() -> RunOutcome {
        RunOutcome::new(Utc.with_ymd_and_hms(2026, 6, 1, 8, 0, 0).unwrap())
    }

    #[tokio::test]
    async fn should_accept_outcome_when_sink_disabled() {
        let sink: Option<Recording> = None;
        assert!(sink.report(&outcome()).await.is_ok());
    }

    #[tokio::test]
    async fn should_forward_to_enabled_sink() {
        let sink = Some(Recording::default());
        sink.report(&outcome()).await.unwrap();
        assert_eq!(*sink.as_ref().unwrap().seen.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn should_try_second_sink_when_first_fails() {
        let pair = (
            Recording {
                fail: true,
                ..Recording::default()
            },
            Recording::default(),
        );

        let result = pair.report(&outcome()).await;

        assert!(result.is_err());
        assert_eq!(*pair.0.seen.lock().unwrap(), 1);
        assert_eq!(*pair.1.seen.lock().unwrap(), 1);
    }
}
