//! Time and timestamp helpers.

use chrono::{DateTime, Utc};

/// UTC timestamp used for dry-spell starts, watering times and run times.
pub type Timestamp = DateTime<Utc>;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Fractional hours elapsed from `since` to `until`.
///
/// Millisecond granularity. Negative spans (clock stepped backwards) are
/// reported as zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn hours_between(since: Timestamp, until: Timestamp) -> f64 {
    let millis = (until - since).num_milliseconds().max(0);
    millis as f64 / MILLIS_PER_HOUR
}
