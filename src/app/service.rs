//! Supervisor, the hexagonal core.
//!
//! [`Supervisor`] owns the duty-cycle FSM, the safety monitor, the fill
//! tracker and the save debouncer.  All I/O flows through port traits
//! passed in at call sites, so the whole aggregate runs against mocks in
//! tests.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!                 │        Supervisor         │
//!   RelayPort ◀── │ Safety · Fill · FSM · Save│ ──▶ PersistencePort
//!                 └──────────────────────────┘
//! ```
//!
//! One tick runs, in order: sensor refresh, safety evaluation, fill
//! tracking, emergency stop, duty-cycle decision, relay output.  Commands
//! are applied between ticks by the same thread.

use log::{info, warn};

use crate::config::{AppliedFields, ConfigUpdate, LoopConfig, OperatingConfig};
use crate::error::{BlockReason, ConfigViolation, Error, Result};
use crate::fill::FillCycleTracker;
use crate::fsm::context::{FsmContext, Mode, SensorSnapshot};
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId, StopCause};
use crate::history::TemperatureTrend;
use crate::persistence::{Counters, PersistedSnapshot, SaveDebouncer, SaveOutcome};
use crate::safety::{SafetyMonitor, SafetyVerdict};

use super::commands::{AppCommand, CommandReply};
use super::events::AppEvent;
use super::ports::{EventSink, PersistencePort, RelayPort, SensorPort};
use super::status::{NextTransition, StatusView};

// ───────────────────────────────────────────────────────────────
// Supervisor
// ───────────────────────────────────────────────────────────────

pub struct Supervisor {
    fsm: Fsm,
    ctx: FsmContext,
    safety: SafetyMonitor,
    tracker: FillCycleTracker,
    partial_cycles_total: u64,
    debouncer: SaveDebouncer,
    trend: TemperatureTrend,
    /// Thermal or sensor fault reported by the last tick.
    active_fault: Option<BlockReason>,
    restored: bool,
    boot_ms: u64,
}

impl Supervisor {
    /// Build from a persisted snapshot.  The compressor starts Off, in
    /// automatic mode, with the rest timer counting from `now_ms`.
    ///
    /// Does **not** start the FSM; call [`start`](Self::start) next.
    pub fn new(snapshot: PersistedSnapshot, loop_config: &LoopConfig, now_ms: u64) -> Self {
        let PersistedSnapshot {
            config,
            counters,
            history,
        } = snapshot;

        Self {
            fsm: Fsm::new(build_state_table(), StateId::Off),
            ctx: FsmContext::new(config, now_ms),
            safety: SafetyMonitor::new(config.temp_ceiling_c),
            tracker: FillCycleTracker::restore(history, counters.completed_fills_total),
            partial_cycles_total: counters.partial_cycles_total,
            debouncer: SaveDebouncer::new(loop_config.save_interval_ms),
            trend: TemperatureTrend::new(now_ms),
            active_fault: None,
            restored: false,
            boot_ms: now_ms,
        }
    }

    /// Load the last snapshot from `store`, falling back to defaults when
    /// there is none or it cannot be read.
    pub fn restore(store: &impl PersistencePort, loop_config: &LoopConfig, now_ms: u64) -> Self {
        let (snapshot, restored) = match store.load() {
            Ok(Some(snapshot)) => {
                info!(
                    "Restored snapshot: fills={}, partials={}",
                    snapshot.counters.completed_fills_total,
                    snapshot.counters.partial_cycles_total
                );
                (snapshot.sanitized(), true)
            }
            Ok(None) => {
                info!("No stored snapshot, using defaults");
                (PersistedSnapshot::default(), false)
            }
            Err(e) => {
                warn!("Snapshot load failed ({e}), using defaults");
                (PersistedSnapshot::default(), false)
            }
        };

        let mut supervisor = Self::new(snapshot, loop_config, now_ms);
        supervisor.restored = restored;
        supervisor
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Run the initial `on_enter` and force the relay off.
    pub fn start(&mut self, hw: &mut impl RelayPort, sink: &mut impl EventSink) {
        self.fsm.start(&mut self.ctx);
        hw.set_relay(self.ctx.relay_energized);
        sink.emit(&AppEvent::Started {
            state: self.fsm.current_state(),
            restored: self.restored,
        });
        info!("Supervisor started in {:?}", self.fsm.current_state());
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one full control cycle.
    ///
    /// The `hw` parameter satisfies **both** [`SensorPort`] and
    /// [`RelayPort`], which avoids a double mutable borrow while keeping
    /// the port boundary explicit.
    pub fn tick(
        &mut self,
        now_ms: u64,
        hw: &mut (impl SensorPort + RelayPort),
        store: &mut impl PersistencePort,
        sink: &mut impl EventSink,
    ) {
        self.ctx.now_ms = now_ms;
        let mut stopped: Option<StopCause> = None;

        // 1. Read sensors via SensorPort
        let reading = hw.read_temperature();
        let tank_full = hw.read_tank_full();
        self.ctx.sensors = SensorSnapshot {
            temperature_c: reading.ok(),
            tank_full,
        };

        // 2. Safety evaluation
        let verdict = self.safety.evaluate(reading, tank_full);
        self.ctx.verdict = verdict;
        self.report_fault_change(&verdict, sink);

        // 3. Fill tracking
        if let Some(record) = self.tracker.on_level_sample(tank_full, now_ms) {
            sink.emit(&AppEvent::FillCompleted(record));
            if self.ctx.is_automatic() {
                if self.fsm.current_state() == StateId::On {
                    self.fsm.force_transition(StateId::Off, &mut self.ctx);
                    stopped = Some(StopCause::FillCompleted);
                }
                // Full rest from this moment, even if already Off.
                self.ctx.last_transition_ms = now_ms;
            }
            self.request_save(now_ms, store);
        }

        // 4. Emergency stop
        if !verdict.safe_to_run && self.fsm.current_state() == StateId::On {
            let reason = verdict.stop_reason().unwrap_or(BlockReason::SensorFault);
            warn!("Emergency stop: {reason}");
            self.fsm.force_transition(StateId::Off, &mut self.ctx);
            stopped = Some(StopCause::Interlock(reason));
        }

        // 5. Duty-cycle decision
        let before = self.fsm.current_state();
        self.ctx.stop_cause = None;
        self.fsm.tick(&mut self.ctx);
        match (before, self.fsm.current_state()) {
            (StateId::Off, StateId::On) => self.on_compressor_started(now_ms, sink),
            (StateId::On, StateId::Off) => {
                let cause = self.ctx.stop_cause.unwrap_or(StopCause::RunComplete);
                if cause == StopCause::RunComplete {
                    self.request_save(now_ms, store);
                }
                stopped = Some(cause);
            }
            _ => {}
        }
        if let Some(cause) = stopped {
            sink.emit(&AppEvent::CompressorStopped { cause });
        }

        // 6. Apply relay via RelayPort
        hw.set_relay(self.ctx.relay_energized);

        // 7. Hourly trend (last good value while the sensor is faulted)
        if let Some(temp_c) = reading.ok().or(self.safety.last_temp_c()) {
            self.trend.maybe_record(temp_c, now_ms);
        }
    }

    // ── Commands ──────────────────────────────────────────────

    /// Start the compressor by hand.  Switches to manual mode.  Refused
    /// while any interlock is active, judged on the last tick's readings.
    pub fn turn_on_manual(
        &mut self,
        now_ms: u64,
        hw: &mut impl RelayPort,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        self.ctx.now_ms = now_ms;
        if let Err(reason) = self.safety.check_manual_start(self.ctx.sensors.tank_full) {
            warn!("Manual start refused: {reason}");
            return Err(Error::Blocked(reason));
        }

        self.set_mode(Mode::Manual, sink);
        if self.fsm.current_state() == StateId::Off {
            self.fsm.force_transition(StateId::On, &mut self.ctx);
            self.on_compressor_started(now_ms, sink);
        }
        hw.set_relay(self.ctx.relay_energized);
        Ok(())
    }

    /// Stop the compressor by hand.  Switches to manual mode.  Always
    /// succeeds.
    pub fn turn_off_manual(&mut self, now_ms: u64, hw: &mut impl RelayPort, sink: &mut impl EventSink) {
        self.ctx.now_ms = now_ms;
        self.set_mode(Mode::Manual, sink);
        if self.fsm.current_state() == StateId::On {
            self.fsm.force_transition(StateId::Off, &mut self.ctx);
            sink.emit(&AppEvent::CompressorStopped {
                cause: StopCause::Manual,
            });
        }
        hw.set_relay(self.ctx.relay_energized);
    }

    /// Return to automatic mode.  The duty-cycle timers restart from
    /// `now_ms` and a latched thermal fault is dropped (a still-hot
    /// reading latches it again on the next tick).
    pub fn set_automatic(&mut self, now_ms: u64, sink: &mut impl EventSink) {
        self.ctx.now_ms = now_ms;
        self.set_mode(Mode::Automatic, sink);
        self.ctx.last_transition_ms = now_ms;
        if self.fsm.current_state() == StateId::On {
            self.ctx.cycle_start_ms = Some(now_ms);
        }
        self.safety.clear_latch();
    }

    /// Apply a partial configuration update.
    ///
    /// Valid fields are applied even if others are rejected.  Fails only
    /// when no field was accepted.  A debounced save is requested when a
    /// value actually changed.
    pub fn update_config(
        &mut self,
        update: &ConfigUpdate,
        now_ms: u64,
        store: &mut impl PersistencePort,
        sink: &mut impl EventSink,
    ) -> Result<AppliedFields> {
        if update.is_empty() {
            return Err(Error::InvalidConfig(ConfigViolation::NoFields));
        }

        let mut config = self.ctx.config;
        let report = config.apply(update);
        for violation in &report.rejected {
            warn!("Config field rejected: {violation}");
        }
        if report.accepted.is_empty() {
            let first = report.rejected.first().copied().unwrap_or(ConfigViolation::NoFields);
            return Err(Error::InvalidConfig(first));
        }

        if report.any_changed() {
            self.ctx.config = config;
            self.safety.set_ceiling(config.temp_ceiling_c);
            info!(
                "Configuration updated: on={} ms, rest={} ms, ceiling={:.1}\u{00b0}C",
                config.on_duration_ms, config.rest_duration_ms, config.temp_ceiling_c
            );
            sink.emit(&AppEvent::ConfigUpdated(config));
            self.request_save(now_ms, store);
        }
        Ok(report)
    }

    /// Zero the counters and fill history and persist immediately,
    /// bypassing the save interval.
    pub fn reset_counters(
        &mut self,
        now_ms: u64,
        store: &mut impl PersistencePort,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        self.partial_cycles_total = 0;
        self.tracker.reset();
        info!("Counters and fill history reset");
        sink.emit(&AppEvent::CountersReset);

        let snapshot = self.persisted_snapshot();
        match self.debouncer.force_save(&snapshot, now_ms, store) {
            SaveOutcome::Failed(e) => Err(Error::Storage(e)),
            SaveOutcome::Written | SaveOutcome::Skipped => Ok(()),
        }
    }

    /// Dispatch one queued command.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        now_ms: u64,
        hw: &mut impl RelayPort,
        store: &mut impl PersistencePort,
        sink: &mut impl EventSink,
    ) -> CommandReply {
        let outcome = match cmd {
            AppCommand::TurnOn => self.turn_on_manual(now_ms, hw, sink).map(|()| CommandReply::Done),
            AppCommand::TurnOff => {
                self.turn_off_manual(now_ms, hw, sink);
                Ok(CommandReply::Done)
            }
            AppCommand::SetAutomatic => {
                self.set_automatic(now_ms, sink);
                Ok(CommandReply::Done)
            }
            AppCommand::UpdateConfig(update) => self
                .update_config(&update, now_ms, store, sink)
                .map(CommandReply::ConfigApplied),
            AppCommand::ResetCounters => self
                .reset_counters(now_ms, store, sink)
                .map(|()| CommandReply::Done),
            AppCommand::GetStatus => Ok(CommandReply::Status(Box::new(self.snapshot(now_ms)))),
        };
        outcome.unwrap_or_else(CommandReply::Rejected)
    }

    // ── Queries ───────────────────────────────────────────────

    /// Read-only projection for the status page.
    pub fn snapshot(&self, now_ms: u64) -> StatusView {
        let on = self.fsm.current_state() == StateId::On;
        let config = self.ctx.config;

        let (next_transition, time_remaining_ms) = match (self.ctx.mode, on) {
            (Mode::Manual, _) => (None, 0),
            (Mode::Automatic, true) => {
                let elapsed = self
                    .ctx
                    .cycle_start_ms
                    .map_or(0, |start| now_ms.saturating_sub(start));
                (
                    Some(NextTransition::TurnOff),
                    u64::from(config.on_duration_ms).saturating_sub(elapsed),
                )
            }
            (Mode::Automatic, false) => {
                let elapsed = now_ms.saturating_sub(self.ctx.last_transition_ms);
                (
                    Some(NextTransition::TurnOn),
                    u64::from(config.rest_duration_ms).saturating_sub(elapsed),
                )
            }
        };

        let temperature_c = self.safety.last_temp_c();
        StatusView {
            uptime_ms: now_ms.saturating_sub(self.boot_ms),
            state: self.fsm.current_state(),
            compressor_on: on,
            mode: self.ctx.mode,
            tank_full: self.ctx.sensors.tank_full,
            temperature_c,
            sensor_fault: self.safety.sensor_fault().is_some(),
            fault_latched: self.safety.fault_latched(),
            temperature_alert: temperature_c.is_some_and(|t| t >= config.temp_ceiling_c),
            tank_full_alert: self.ctx.sensors.tank_full,
            next_transition,
            time_remaining_ms,
            config,
            counters: self.counters(),
            fill_history: self.tracker.history().iter_recent().copied().collect(),
            average_fill_secs: self.tracker.history().average_fill_secs(),
            partial_cycles_this_fill: self.tracker.partial_cycles_this_fill(),
            temperature_trend: self.trend.points(),
        }
    }

    /// The unit of durability, as it would be written now.
    pub fn persisted_snapshot(&self) -> PersistedSnapshot {
        PersistedSnapshot {
            config: self.ctx.config,
            counters: self.counters(),
            history: self.tracker.history().clone(),
        }
    }

    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    pub fn is_compressor_on(&self) -> bool {
        self.fsm.current_state() == StateId::On
    }

    pub fn mode(&self) -> Mode {
        self.ctx.mode
    }

    pub fn config(&self) -> OperatingConfig {
        self.ctx.config
    }

    pub fn counters(&self) -> Counters {
        Counters {
            partial_cycles_total: self.partial_cycles_total,
            completed_fills_total: self.tracker.completed_fills(),
        }
    }

    /// Verdict from the last tick.
    pub fn verdict(&self) -> SafetyVerdict {
        self.ctx.verdict
    }

    pub fn fault_latched(&self) -> bool {
        self.safety.fault_latched()
    }

    // ── Internal ──────────────────────────────────────────────

    fn on_compressor_started(&mut self, now_ms: u64, sink: &mut impl EventSink) {
        self.tracker.on_compressor_start(now_ms);
        self.partial_cycles_total += 1;
        sink.emit(&AppEvent::CompressorStarted { mode: self.ctx.mode });
    }

    fn set_mode(&mut self, mode: Mode, sink: &mut impl EventSink) {
        if self.ctx.mode != mode {
            info!("Mode: {:?} -> {:?}", self.ctx.mode, mode);
            self.ctx.mode = mode;
            sink.emit(&AppEvent::ModeChanged(mode));
        }
    }

    fn request_save(&mut self, now_ms: u64, store: &mut impl PersistencePort) -> SaveOutcome {
        let snapshot = self.persisted_snapshot();
        self.debouncer.request_save(&snapshot, now_ms, store)
    }

    /// Emit an event when the thermal/sensor fault picture changes.  Tank
    /// full is a normal operating condition and is not reported here.
    fn report_fault_change(&mut self, verdict: &SafetyVerdict, sink: &mut impl EventSink) {
        let fault = if verdict.sensor_fault {
            Some(BlockReason::SensorFault)
        } else if verdict.fault_latched {
            Some(BlockReason::OverTemperature)
        } else {
            None
        };
        if fault == self.active_fault {
            return;
        }
        match fault {
            Some(reason) => sink.emit(&AppEvent::FaultDetected(reason)),
            None => sink.emit(&AppEvent::FaultCleared),
        }
        self.active_fault = fault;
    }
}
