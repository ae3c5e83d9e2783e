//! Human-readable run summary on stdout.

use std::fmt::Write as _;
use std::io::Write as _;

use watering_app::ports::Reporter;
use watering_domain::error::ReportError;
use watering_domain::outcome::RunOutcome;

/// Prints an aligned table of each run.
#[derive(Debug, Clone, Default)]
pub struct ConsoleReporter;

impl ConsoleReporter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Text printed for `outcome`.
    #[must_use]
    pub fn render(&self, outcome: &RunOutcome) -> String {
        let pots = outcome.sorted_by_id();
        let width = pots
            .iter()
            .map(|pot| pot.description.len())
            .chain(std::iter::once("pot".len()))
            .max()
            .unwrap_or_default();

        let mut out = format!(
            "run at {} ({} of {} pots watered)\n",
            outcome.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            outcome.watered_count(),
            outcome.pots.len()
        );
        let _ = writeln!(
            out,
            "  {:<width$}  {:>8}  {:>8}  {:<7}  {:>8}",
            "pot", "reading", "cutoff", "watered", "after"
        );
        for pot in pots {
            let watered = if pot.watered { "yes" } else { "no" };
            let after = pot
                .second_reading
                .map_or_else(|| "-".to_string(), |value| value.to_string());
            let _ = writeln!(
                out,
                "  {:<width$}  {:>8}  {:>8}  {:<7}  {:>8}",
                pot.description, pot.sensor_reading, pot.cutoff, watered, after
            );
        }
        out
    }
}

impl Reporter for ConsoleReporter {
    async fn report(&self, outcome: &RunOutcome) -> Result<(), ReportError> {
        let text = self.render(outcome);
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(text.as_bytes())
            .and_then(|()| stdout.flush())
            .map_err(ReportError::new)
    }
}
