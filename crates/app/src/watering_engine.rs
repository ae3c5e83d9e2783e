//! Watering engine: runs every configured pot through one watering cycle.
//!
//! Per pot, in roster order: read the sensor, update the pot's dry-spell
//! state, water if dry, wait for the soil to settle, and take a second
//! reading for the report. A hardware failure ends processing of that pot
//! only. After the last pot the run outcome goes to the reporter once.

use std::time::Duration;

use tracing::{debug, error, info, warn};
use watering_domain::decision::decide;
use watering_domain::error::StateSaveError;
use watering_domain::outcome::{PotOutcome, RunSummary};
use watering_domain::pot::PotConfig;
use watering_domain::roster::PotRoster;
use watering_domain::state::{PotState, StateMap};

use crate::ports::{Clock, Hardware, LoadedState, Reporter, StateStore, SystemClock};

/// Pause between watering and the confirmatory second reading.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(30);

/// Batch use-case that waters every pot of a roster once.
pub struct WateringEngine<H, R, C = SystemClock> {
    hardware: H,
    reporter: R,
    clock: C,
    settle_delay: Duration,
}

impl<H, R> WateringEngine<H, R>
where
    H: Hardware,
    R: Reporter,
{
    /// Create an engine using wall-clock time and the default settle delay.
    pub fn new(hardware: H, reporter: R) -> Self {
        Self {
            hardware,
            reporter,
            clock: SystemClock,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

impl<H, R, C> WateringEngine<H, R, C>
where
    H: Hardware,
    R: Reporter,
    C: Clock,
{
    /// Replace the time source.
    pub fn with_clock<C2: Clock>(self, clock: C2) -> WateringEngine<H, R, C2> {
        WateringEngine {
            hardware: self.hardware,
            reporter: self.reporter,
            clock,
            settle_delay: self.settle_delay,
        }
    }

    #[must_use]
    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    pub fn hardware(&self) -> &H {
        &self.hardware
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Full cycle: restore state, water every pot, persist state.
    ///
    /// Pot-level hardware failures are part of the returned summary.
    ///
    /// # Errors
    ///
    /// Returns [`StateSaveError`] when the updated state could not be
    /// persisted. Watering has already happened at that point; the next
    /// run will start without this run's dry-spell history.
    #[tracing::instrument(skip_all, fields(pots = roster.len()))]
    pub async fn execute<S: StateStore>(
        &self,
        roster: &PotRoster,
        store: &S,
    ) -> Result<RunSummary, StateSaveError> {
        let mut states = self.restore_state(store, roster).await;
        let summary = self.run(roster, &mut states).await;

        if let Err(err) = store.save(&states).await {
            error!(
                error = %err,
                source = ?std::error::Error::source(&err),
                "pot state not saved; dry-spell tracking restarts next run",
            );
            return Err(err);
        }
        debug!(pots = states.len(), "pot state saved");
        Ok(summary)
    }

    /// Load the previous run's state, falling back to fresh state for every
    /// configured pot when nothing usable is stored.
    pub async fn restore_state<S: StateStore>(&self, store: &S, roster: &PotRoster) -> StateMap {
        match store.load().await {
            Ok(LoadedState::Restored(states)) => {
                debug!(pots = states.len(), "restored pot state");
                states
            }
            Ok(LoadedState::Missing) => {
                info!("no saved pot state, starting fresh");
                StateMap::initialize(roster.ids())
            }
            Err(err) => {
                warn!(
                    error = %err,
                    source = ?std::error::Error::source(&err),
                    "discarding unreadable pot state, starting fresh",
                );
                StateMap::initialize(roster.ids())
            }
        }
    }

    /// Water every pot of `roster` once, updating `states` in place.
    #[tracing::instrument(skip_all, fields(pots = roster.len()))]
    pub async fn run(&self, roster: &PotRoster, states: &mut StateMap) -> RunSummary {
        let mut summary = RunSummary::new(self.clock.now());

        for pot in roster {
            let state = states.entry_for(&pot.id);
            self.process_pot(pot, state, &mut summary).await;
        }

        if let Err(err) = self.reporter.report(&summary.outcome).await {
            warn!(
                error = %err,
                source = ?std::error::Error::source(&err),
                "failed to report run outcome",
            );
        }

        info!(
            read = summary.outcome.pots.len(),
            watered = summary.outcome.watered_count(),
            failed = summary.failures.len(),
            "run complete",
        );
        summary
    }

    async fn process_pot(&self, pot: &PotConfig, state: &mut PotState, summary: &mut RunSummary) {
        let reading = match self.hardware.read_sensor(pot).await {
            Ok(reading) => reading,
            Err(err) => {
                warn!(pot = %pot.id, error = %err, "skipping pot, sensor read failed");
                summary.record_failure(pot.id.clone(), err);
                return;
            }
        };

        let decision = decide(reading, pot, state, summary.outcome.timestamp);
        let mut outcome = PotOutcome::observed(pot, reading);
        outcome.dry_hours = decision.dry_hours();

        debug!(
            pot = %pot.id,
            reading,
            cutoff = pot.sensor_dry_level,
            dry_hours = ?outcome.dry_hours,
            "sensor read",
        );
        if decision.exceeds_max_dry_period(pot) {
            debug!(
                pot = %pot.id,
                max_dry_hours = pot.max_dry_hours,
                "dry spell longer than configured maximum",
            );
        }

        if decision.needs_watering() {
            info!(pot = %pot.id, seconds = pot.watering_duration, "watering");
            if let Err(err) = self.hardware.water_pot(pot).await {
                warn!(pot = %pot.id, error = %err, "watering failed");
                summary.record_failure(pot.id.clone(), err);
                return;
            }
            state.record_watering(self.clock.now());
            outcome.watered = true;

            tokio::time::sleep(self.settle_delay).await;

            match self.hardware.read_sensor(pot).await {
                Ok(second) => {
                    debug!(pot = %pot.id, reading = second, "second reading");
                    outcome.second_reading = Some(second);
                }
                Err(err) => {
                    warn!(pot = %pot.id, error = %err, "second reading failed");
                    summary.record_failure(pot.id.clone(), err);
                }
            }
        }

        summary.outcome.pots.push(outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::collections::{HashMap, HashSet, VecDeque};
    use std::sync::Mutex;
    use watering_domain::error::{HardwareError, ReportError, StateLoadError};
    use watering_domain::outcome::RunOutcome;
    use watering_domain::pot::PotId;
    use watering_domain::time::Timestamp;

    // ── In-memory hardware ─────────────────────────────────────────

    #[derive(Default)]
    struct ScriptedHardware {
        readings: Mutex<HashMap<u8, VecDeque<u32>>>,
        broken_sensors: HashSet<u8>,
        broken_relays: HashSet<u8>,
        watered: Mutex<Vec<u8>>,
    }

    impl ScriptedHardware {
        fn reading(self, channel: u8, values: &[u32]) -> Self {
            self.readings
                .lock()
                .unwrap()
                .insert(channel, values.iter().copied().collect());
            self
        }

        fn watered_pins(&self) -> Vec<u8> {
            self.watered.lock().unwrap().clone()
        }
    }

    impl Hardware for ScriptedHardware {
        async fn read_sensor(&self, pot: &PotConfig) -> Result<u32, HardwareError> {
            if self.broken_sensors.contains(&pot.adc_channel) {
                return Err(HardwareError::sensor(
                    pot.adc_channel,
                    std::io::Error::other("no ack"),
                ));
            }
            let mut readings = self.readings.lock().unwrap();
            let queue = readings.entry(pot.adc_channel).or_default();
            let value = if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().copied()
            };
            Ok(value.unwrap_or(0))
        }

        async fn water_pot(&self, pot: &PotConfig) -> Result<(), HardwareError> {
            if self.broken_relays.contains(&pot.relay_pin) {
                return Err(HardwareError::actuator(
                    pot.relay_pin,
                    std::io::Error::other("EBUSY"),
                ));
            }
            self.watered.lock().unwrap().push(pot.relay_pin);
            Ok(())
        }
    }

    // ── In-memory reporter ─────────────────────────────────────────

    #[derive(Default)]
    struct RecordingReporter {
        outcomes: Mutex<Vec<RunOutcome>>,
        fail: bool,
    }

    impl Reporter for RecordingReporter {
        async fn report(&self, outcome: &RunOutcome) -> Result<(), ReportError> {
            self.outcomes.lock().unwrap().push(outcome.clone());
            if self.fail {
                return Err(ReportError::new(std::io::Error::other("disk full")));
            }
            Ok(())
        }
    }

    // ── In-memory state store ──────────────────────────────────────

    enum Stored {
        Missing,
        Corrupt,
        Present(StateMap),
    }

    struct InMemoryStore {
        stored: Mutex<Stored>,
        read_only: bool,
    }

    impl InMemoryStore {
        fn with(stored: Stored) -> Self {
            Self {
                stored: Mutex::new(stored),
                read_only: false,
            }
        }

        fn saved(&self) -> Option<StateMap> {
            match &*self.stored.lock().unwrap() {
                Stored::Present(states) => Some(states.clone()),
                _ => None,
            }
        }
    }

    impl StateStore for InMemoryStore {
        async fn load(&self) -> Result<LoadedState, StateLoadError> {
            match &*self.stored.lock().unwrap() {
                Stored::Missing => Ok(LoadedState::Missing),
                Stored::Corrupt => Err(StateLoadError::new(std::io::Error::other("garbage"))),
                Stored::Present(states) => Ok(LoadedState::Restored(states.clone())),
            }
        }

        async fn save(&self, states: &StateMap) -> Result<(), StateSaveError> {
            if self.read_only {
                return Err(StateSaveError::new(std::io::Error::other("read-only")));
            }
            *self.stored.lock().unwrap() = Stored::Present(states.clone());
            Ok(())
        }
    }

    // ── Fixed clock ────────────────────────────────────────────────

    struct FixedClock(Timestamp);

    impl Clock for FixedClock {
        fn now(&self) -> Timestamp {
            self.0
        }
    }

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 6, 1, 8, 0, 0).unwrap()
    }

    fn pot(id: &str, channel: i64, pin: i64) -> PotConfig {
        PotConfig::builder(id)
            .sensor_dry_level(500)
            .adc_channel(channel)
            .relay_pin(pin)
            .build()
            .unwrap()
    }

    fn garden() -> PotRoster {
        PotRoster::try_from_pots([pot("tomato", 0, 17), pot("basil", 1, 27)]).unwrap()
    }

    fn engine(
        hardware: ScriptedHardware,
        at: Timestamp,
    ) -> WateringEngine<ScriptedHardware, RecordingReporter, FixedClock> {
        WateringEngine::new(hardware, RecordingReporter::default())
            .with_clock(FixedClock(at))
            .with_settle_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn should_not_water_wet_pot() {
        let engine = engine(ScriptedHardware::default().reading(0, &[100]), t0());
        let roster = PotRoster::try_from_pots([pot("tomato", 0, 17)]).unwrap();
        let mut states = StateMap::initialize(roster.ids());

        let summary = engine.run(&roster, &mut states).await;

        let tomato = summary.pot("tomato").unwrap();
        assert!(!tomato.watered);
        assert_eq!(tomato.sensor_reading, 100);
        assert_eq!(tomato.cutoff, 500);
        assert!(tomato.second_reading.is_none());
        assert_eq!(states.get("tomato"), Some(&PotState::default()));
        assert!(engine.hardware().watered_pins().is_empty());
    }

    #[tokio::test]
    async fn should_water_dry_pot_and_take_second_reading() {
        let engine = engine(ScriptedHardware::default().reading(1, &[900, 350]), t0());
        let roster = PotRoster::try_from_pots([pot("basil", 1, 27)]).unwrap();
        let mut states = StateMap::initialize(roster.ids());

        let summary = engine.run(&roster, &mut states).await;

        let basil = summary.pot("basil").unwrap();
        assert!(basil.watered);
        assert_eq!(basil.sensor_reading, 900);
        assert_eq!(basil.second_reading, Some(350));
        assert_eq!(basil.dry_hours, Some(0.0));
        assert_eq!(engine.hardware().watered_pins(), [27]);

        let state = states.get("basil").unwrap();
        assert_eq!(state.dry_spell_start_time, Some(t0()));
        assert_eq!(state.last_watering_time, Some(t0()));
    }

    #[tokio::test]
    async fn should_keep_dry_spell_start_across_runs() {
        let roster = PotRoster::try_from_pots([pot("basil", 1, 27)]).unwrap();
        let mut states = StateMap::initialize(roster.ids());

        let first = engine(ScriptedHardware::default().reading(1, &[900]), t0());
        first.run(&roster, &mut states).await;

        let later = t0() + chrono::Duration::hours(2);
        let second = engine(ScriptedHardware::default().reading(1, &[900]), later);
        let summary = second.run(&roster, &mut states).await;

        let basil = summary.pot("basil").unwrap();
        assert!(basil.watered);
        assert_eq!(basil.dry_hours, Some(2.0));
        let state = states.get("basil").unwrap();
        assert_eq!(state.dry_spell_start_time, Some(t0()));
        assert_eq!(state.last_watering_time, Some(later));
    }

    #[tokio::test]
    async fn should_end_dry_spell_when_soil_recovers() {
        let roster = PotRoster::try_from_pots([pot("basil", 1, 27)]).unwrap();
        let mut states = StateMap::initialize(roster.ids());
        states
            .entry_for(&PotId::new("basil").unwrap())
            .start_dry_spell(t0());

        let engine = engine(ScriptedHardware::default().reading(1, &[120]), t0());
        engine.run(&roster, &mut states).await;

        assert!(!states.get("basil").unwrap().is_dry_spell_active());
    }

    #[tokio::test]
    async fn should_continue_with_next_pot_when_sensor_fails() {
        let hardware = ScriptedHardware {
            broken_sensors: HashSet::from([0]),
            ..ScriptedHardware::default()
        }
        .reading(1, &[900]);
        let engine = engine(hardware, t0());
        let roster = garden();
        let mut states = StateMap::initialize(roster.ids());
        let before = states.get("tomato").cloned();

        let summary = engine.run(&roster, &mut states).await;

        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].pot_id.as_str(), "tomato");
        assert!(matches!(
            summary.failures[0].error,
            HardwareError::Sensor { channel: 0, .. }
        ));
        assert!(summary.pot("tomato").is_none());
        assert_eq!(states.get("tomato").cloned(), before);
        assert!(summary.pot("basil").unwrap().watered);
    }

    #[tokio::test]
    async fn should_not_record_watering_when_relay_fails() {
        let hardware = ScriptedHardware {
            broken_relays: HashSet::from([17]),
            ..ScriptedHardware::default()
        }
        .reading(0, &[900])
        .reading(1, &[900]);
        let engine = engine(hardware, t0());
        let roster = garden();
        let mut states = StateMap::initialize(roster.ids());

        let summary = engine.run(&roster, &mut states).await;

        assert!(matches!(
            summary.failures[0].error,
            HardwareError::Actuator { pin: 17, .. }
        ));
        let tomato = states.get("tomato").unwrap();
        assert!(tomato.last_watering_time.is_none());
        assert_eq!(tomato.dry_spell_start_time, Some(t0()));
        assert!(summary.pot("tomato").is_none());
        assert_eq!(engine.hardware().watered_pins(), [27]);
    }

    #[tokio::test]
    async fn should_report_once_per_run_with_all_pots() {
        let hardware = ScriptedHardware::default()
            .reading(0, &[100])
            .reading(1, &[900, 400]);
        let engine = engine(hardware, t0());
        let roster = garden();
        let mut states = StateMap::initialize(roster.ids());

        engine.run(&roster, &mut states).await;

        let outcomes = engine.reporter().outcomes.lock().unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].timestamp, t0());
        assert_eq!(outcomes[0].pots.len(), 2);
        assert_eq!(outcomes[0].watered_count(), 1);
    }

    #[tokio::test]
    async fn should_finish_run_when_reporter_fails() {
        let reporter = RecordingReporter {
            fail: true,
            ..RecordingReporter::default()
        };
        let engine = WateringEngine::new(ScriptedHardware::default().reading(0, &[900]), reporter)
            .with_clock(FixedClock(t0()))
            .with_settle_delay(Duration::ZERO);
        let roster = PotRoster::try_from_pots([pot("tomato", 0, 17)]).unwrap();
        let mut states = StateMap::initialize(roster.ids());

        let summary = engine.run(&roster, &mut states).await;

        assert!(summary.is_clean());
        assert!(summary.pot("tomato").unwrap().watered);
    }

    #[tokio::test]
    async fn should_initialize_state_when_store_is_missing() {
        let engine = engine(ScriptedHardware::default(), t0());
        let store = InMemoryStore::with(Stored::Missing);

        let states = engine.restore_state(&store, &garden()).await;

        assert_eq!(states, StateMap::initialize(garden().ids()));
    }

    #[tokio::test]
    async fn should_initialize_state_when_store_is_corrupt() {
        let engine = engine(ScriptedHardware::default(), t0());
        let store = InMemoryStore::with(Stored::Corrupt);

        let states = engine.restore_state(&store, &garden()).await;

        assert_eq!(states.len(), 2);
        assert!(states.iter().all(|(_, s)| *s == PotState::default()));
    }

    #[tokio::test]
    async fn should_persist_state_after_run() {
        let engine = engine(ScriptedHardware::default().reading(1, &[900]), t0());
        let store = InMemoryStore::with(Stored::Missing);

        let summary = engine.execute(&garden(), &store).await.unwrap();

        assert!(summary.is_clean());
        let saved = store.saved().unwrap();
        assert_eq!(saved.get("basil").unwrap().dry_spell_start_time, Some(t0()));
        assert_eq!(saved.get("tomato"), Some(&PotState::default()));
    }

    #[tokio::test]
    async fn should_keep_state_of_pots_no_longer_configured() {
        let old = PotId::new("fern").unwrap();
        let mut previous = StateMap::default();
        previous.entry_for(&old).record_watering(t0());
        let store = InMemoryStore::with(Stored::Present(previous));
        let engine = engine(ScriptedHardware::default(), t0());

        engine.execute(&garden(), &store).await.unwrap();

        let saved = store.saved().unwrap();
        assert_eq!(saved.len(), 3);
        assert_eq!(saved.get("fern").unwrap().last_watering_time, Some(t0()));
    }

    #[tokio::test]
    async fn should_surface_save_failure_after_watering() {
        let engine = engine(ScriptedHardware::default().reading(0, &[900]), t0());
        let store = InMemoryStore {
            stored: Mutex::new(Stored::Missing),
            read_only: true,
        };

        let result = engine.execute(&garden(), &store).await;

        assert!(result.is_err());
        assert_eq!(engine.hardware().watered_pins(), [17]);
    }
}
