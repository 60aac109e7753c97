//! Integration tests for the Supervisor → FSM → relay pipeline.
//!
//! Drive the supervisor with a 250 ms tick against mock hardware and check
//! relay output, emitted events and what reaches persistence.

use crate::mock_hw::{MockHardware, MockNvs, RecordingSink};

use compressor::adapters::nvs::NvsAdapter;
use compressor::app::events::AppEvent;
use compressor::app::ports::{PersistencePort, StorageError, StoragePort};
use compressor::app::service::Supervisor;
use compressor::app::status::NextTransition;
use compressor::config::{ConfigField, ConfigUpdate, LoopConfig};
use compressor::error::{BlockReason, ConfigViolation, Error, SensorFault};
use compressor::fsm::context::Mode;
use compressor::fsm::{StateId, StopCause};
use compressor::history::FillCycleRecord;
use compressor::persistence::PersistedSnapshot;

const TICK_MS: u64 = 250;

struct Bench {
    sup: Supervisor,
    hw: MockHardware,
    nvs: MockNvs,
    sink: RecordingSink,
    now: u64,
}

impl Bench {
    fn boot() -> Self {
        let mut sup = Supervisor::new(PersistedSnapshot::default(), &LoopConfig::default(), 0);
        let mut hw = MockHardware::new();
        let mut sink = RecordingSink::new();
        sup.start(&mut hw, &mut sink);
        Self {
            sup,
            hw,
            nvs: MockNvs::new(),
            sink,
            now: 0,
        }
    }

    fn tick_at(&mut self, t: u64) {
        self.now = t;
        self.sup.tick(t, &mut self.hw, &mut self.nvs, &mut self.sink);
    }

    /// Tick every 250 ms up to and including `t`.
    fn run_until(&mut self, t: u64) {
        let mut next = self.now + TICK_MS;
        while next <= t {
            self.tick_at(next);
            next += TICK_MS;
        }
    }

    fn stops(&self, cause: StopCause) -> usize {
        self.sink
            .count(|e| matches!(e, AppEvent::CompressorStopped { cause: c } if *c == cause))
    }
}

// ── Duty cycle ────────────────────────────────────────────────

#[test]
fn boot_forces_relay_off() {
    let b = Bench::boot();
    assert_eq!(b.hw.relay_calls, vec![false]);
    assert_eq!(b.sup.state(), StateId::Off);
    assert!(matches!(
        b.sink.events[0],
        AppEvent::Started {
            state: StateId::Off,
            restored: false
        }
    ));
}

#[test]
fn duty_cycle_follows_rest_and_on_durations() {
    let mut b = Bench::boot();

    b.run_until(99_750);
    assert!(!b.sup.is_compressor_on(), "rest not over at 99.75 s");

    b.run_until(100_000);
    assert!(b.sup.is_compressor_on());
    assert!(b.hw.relay_on());

    b.run_until(699_750);
    assert!(b.sup.is_compressor_on());

    b.run_until(700_000);
    assert!(!b.sup.is_compressor_on());
    assert!(!b.hw.relay_on());
    assert_eq!(b.stops(StopCause::RunComplete), 1);
    assert_eq!(b.nvs.saves.len(), 1, "run completion persists counters");

    b.run_until(799_750);
    assert!(!b.sup.is_compressor_on());

    b.run_until(800_000);
    assert!(b.sup.is_compressor_on());
    assert_eq!(b.sup.counters().partial_cycles_total, 2);
    assert_eq!(b.hw.relay_switches(), 3);
}

// ── Interlocks ────────────────────────────────────────────────

#[test]
fn over_temperature_stops_and_latches_until_below_band() {
    let mut b = Bench::boot();
    b.run_until(100_000);
    assert!(b.sup.is_compressor_on());

    b.hw.temperature = Ok(61.0);
    b.tick_at(100_250);
    assert!(!b.sup.is_compressor_on());
    assert!(!b.hw.relay_on());
    assert!(b.sup.fault_latched());
    assert_eq!(
        b.stops(StopCause::Interlock(BlockReason::OverTemperature)),
        1
    );
    assert_eq!(
        b.sink
            .count(|e| matches!(e, AppEvent::FaultDetected(BlockReason::OverTemperature))),
        1
    );

    // Below the ceiling but inside the band: still latched.
    b.hw.temperature = Ok(58.0);
    b.run_until(300_000);
    assert!(!b.sup.is_compressor_on());
    assert!(b.sup.fault_latched());

    b.hw.temperature = Ok(54.9);
    b.tick_at(300_250);
    assert!(!b.sup.fault_latched());
    assert!(b.sup.is_compressor_on(), "rest already elapsed, restarts at once");
    assert_eq!(b.sink.count(|e| matches!(e, AppEvent::FaultCleared)), 1);
}

#[test]
fn sensor_fault_stops_and_keeps_last_good_reading() {
    let mut b = Bench::boot();
    b.run_until(100_000);

    b.hw.temperature = Err(SensorFault::Disconnected);
    b.tick_at(100_250);
    assert!(!b.sup.is_compressor_on());
    assert_eq!(b.stops(StopCause::Interlock(BlockReason::SensorFault)), 1);

    let view = b.sup.snapshot(100_250);
    assert!(view.sensor_fault);
    assert_eq!(view.temperature_c, Some(25.0));

    b.hw.temperature = Ok(30.0);
    b.tick_at(100_500);
    assert!(!b.sup.verdict().sensor_fault);
    assert_eq!(b.sink.count(|e| matches!(e, AppEvent::FaultCleared)), 1);
}

#[test]
fn manual_start_reports_the_blocking_interlock() {
    let mut b = Bench::boot();
    b.tick_at(250);

    b.hw.tank_full = true;
    b.tick_at(500);
    assert_eq!(
        b.sup.turn_on_manual(510, &mut b.hw, &mut b.sink),
        Err(Error::Blocked(BlockReason::TankFull))
    );

    b.hw.tank_full = false;
    b.hw.temperature = Err(SensorFault::OutOfRange);
    b.tick_at(750);
    assert_eq!(
        b.sup.turn_on_manual(760, &mut b.hw, &mut b.sink),
        Err(Error::Blocked(BlockReason::SensorFault))
    );

    b.hw.temperature = Ok(65.0);
    b.tick_at(1_000);
    assert_eq!(
        b.sup.turn_on_manual(1_010, &mut b.hw, &mut b.sink),
        Err(Error::Blocked(BlockReason::OverTemperature))
    );

    b.hw.temperature = Ok(57.0);
    b.tick_at(1_250);
    assert_eq!(
        b.sup.turn_on_manual(1_260, &mut b.hw, &mut b.sink),
        Err(Error::Blocked(BlockReason::Cooldown))
    );
    assert_eq!(b.sup.mode(), Mode::Automatic, "refused start leaves mode alone");

    b.hw.temperature = Ok(50.0);
    b.tick_at(1_500);
    assert_eq!(b.sup.turn_on_manual(1_510, &mut b.hw, &mut b.sink), Ok(()));
    assert_eq!(b.sup.mode(), Mode::Manual);
    assert!(b.hw.relay_on());
}

// ── Modes ─────────────────────────────────────────────────────

#[test]
fn manual_run_ignores_timers_but_not_interlocks() {
    let mut b = Bench::boot();
    b.tick_at(250);
    b.sup.turn_on_manual(300, &mut b.hw, &mut b.sink).unwrap();

    b.run_until(1_000_000);
    assert!(b.sup.is_compressor_on(), "no on-duration limit in manual");
    assert_eq!(b.stops(StopCause::RunComplete), 0);
    assert_eq!(b.sup.snapshot(1_000_000).next_transition, None);

    b.hw.temperature = Ok(61.0);
    b.tick_at(1_000_250);
    assert!(!b.sup.is_compressor_on());
    assert_eq!(b.sup.mode(), Mode::Manual);

    b.hw.temperature = Ok(25.0);
    b.run_until(1_500_000);
    assert!(!b.sup.is_compressor_on(), "manual mode never restarts on its own");
}

#[test]
fn manual_off_then_automatic_restarts_after_rest() {
    let mut b = Bench::boot();
    b.tick_at(250);
    b.sup.turn_on_manual(300, &mut b.hw, &mut b.sink).unwrap();
    b.tick_at(500);

    b.sup.turn_off_manual(600, &mut b.hw, &mut b.sink);
    assert!(!b.hw.relay_on());
    assert_eq!(b.stops(StopCause::Manual), 1);

    b.sup.set_automatic(10_000, &mut b.sink);
    assert_eq!(b.sup.mode(), Mode::Automatic);
    assert_eq!(
        b.sink.count(|e| matches!(e, AppEvent::ModeChanged(_))),
        2,
        "Automatic -> Manual -> Automatic"
    );

    b.run_until(109_750);
    assert!(!b.sup.is_compressor_on());
    b.run_until(110_000);
    assert!(b.sup.is_compressor_on());
}

#[test]
fn set_automatic_drops_a_latched_fault() {
    let mut b = Bench::boot();
    b.hw.temperature = Ok(61.0);
    b.tick_at(250);
    b.hw.temperature = Ok(58.0);
    b.tick_at(500);
    assert!(b.sup.fault_latched());

    b.sup.set_automatic(600, &mut b.sink);
    assert!(!b.sup.fault_latched());

    // 58 °C is below the ceiling; without the latch it is safe.
    b.tick_at(750);
    assert!(!b.sup.fault_latched());
    assert!(b.sup.verdict().safe_to_run);

    b.run_until(100_500);
    assert!(!b.sup.is_compressor_on());
    b.run_until(100_750);
    assert!(b.sup.is_compressor_on(), "rest counted from the mode change");
}

// ── Fill cycles ───────────────────────────────────────────────

#[test]
fn fill_completion_records_history_and_forces_full_rest() {
    let mut b = Bench::boot();
    b.hw.tank_full = true;
    b.tick_at(250);

    // Tank drains: the fill window opens.
    b.hw.tank_full = false;
    b.run_until(500);

    b.run_until(100_000);
    assert!(b.sup.is_compressor_on());
    b.run_until(700_000);
    assert!(!b.sup.is_compressor_on());
    b.run_until(800_000);
    assert!(b.sup.is_compressor_on());
    assert_eq!(b.sup.snapshot(800_000).partial_cycles_this_fill, 2);

    b.run_until(850_000);
    b.hw.tank_full = true;
    b.tick_at(850_250);

    let expected = FillCycleRecord {
        duration_secs: 849,
        partial_cycles: 2,
    };
    assert!(!b.sup.is_compressor_on());
    assert_eq!(b.stops(StopCause::FillCompleted), 1);
    assert_eq!(
        b.sink
            .count(|e| matches!(e, AppEvent::FillCompleted(r) if *r == expected)),
        1
    );
    assert_eq!(b.sup.counters().completed_fills_total, 1);

    let view = b.sup.snapshot(850_250);
    assert_eq!(view.fill_history.first(), Some(&expected));
    assert_eq!(view.average_fill_secs, Some(849));

    let saved = b.nvs.last_saved().unwrap();
    assert_eq!(b.nvs.saves.len(), 2);
    assert_eq!(saved.counters.completed_fills_total, 1);
    assert_eq!(saved.history.len(), 1);

    // Tank drains again right away, but a full rest runs first.
    b.hw.tank_full = false;
    b.run_until(950_000);
    assert!(!b.sup.is_compressor_on());
    b.run_until(950_250);
    assert!(b.sup.is_compressor_on());
}

#[test]
fn tank_full_blocks_automatic_start() {
    let mut b = Bench::boot();
    b.hw.tank_full = true;
    b.run_until(200_000);
    assert!(!b.sup.is_compressor_on());

    let view = b.sup.snapshot(200_000);
    assert!(view.tank_full_alert);
    assert_eq!(view.next_transition, Some(NextTransition::TurnOn));
    assert_eq!(view.time_remaining_ms, 0);
}

// ── Configuration ─────────────────────────────────────────────

#[test]
fn partial_config_update_applies_valid_fields() {
    let mut b = Bench::boot();
    let update = ConfigUpdate {
        on_duration_ms: Some(30_000),
        rest_duration_ms: Some(200_000),
        temp_ceiling_c: None,
    };

    let report = b
        .sup
        .update_config(&update, 1_000, &mut b.nvs, &mut b.sink)
        .unwrap();
    assert!(report.accepted.contains(ConfigField::RestDuration));
    assert!(!report.accepted.contains(ConfigField::OnDuration));
    assert_eq!(&report.rejected[..], &[ConfigViolation::OnDurationTooShort]);

    assert_eq!(b.sup.config().rest_duration_ms, 200_000);
    assert_eq!(b.sup.config().on_duration_ms, 600_000);
    assert_eq!(b.sink.count(|e| matches!(e, AppEvent::ConfigUpdated(_))), 1);
    assert_eq!(b.nvs.saves.len(), 1);
}

#[test]
fn all_invalid_config_update_is_rejected() {
    let mut b = Bench::boot();
    let update = ConfigUpdate {
        on_duration_ms: Some(1),
        rest_duration_ms: None,
        temp_ceiling_c: Some(-3.0),
    };
    assert_eq!(
        b.sup.update_config(&update, 1_000, &mut b.nvs, &mut b.sink),
        Err(Error::InvalidConfig(ConfigViolation::OnDurationTooShort))
    );
    assert!(b.nvs.saves.is_empty());
}

#[test]
fn lowered_ceiling_takes_effect_next_tick() {
    let mut b = Bench::boot();
    b.hw.temperature = Ok(45.0);
    b.tick_at(250);
    assert!(!b.sup.fault_latched());

    let update = ConfigUpdate {
        temp_ceiling_c: Some(40.0),
        ..ConfigUpdate::default()
    };
    b.sup
        .update_config(&update, 300, &mut b.nvs, &mut b.sink)
        .unwrap();

    b.tick_at(500);
    assert!(b.sup.fault_latched());
    assert!(b.sup.snapshot(500).temperature_alert);
}

#[test]
fn unchanged_config_is_not_saved() {
    let mut b = Bench::boot();
    let update = ConfigUpdate {
        rest_duration_ms: Some(100_000),
        ..ConfigUpdate::default()
    };
    let report = b
        .sup
        .update_config(&update, 1_000, &mut b.nvs, &mut b.sink)
        .unwrap();
    assert!(!report.any_changed());
    assert!(b.nvs.saves.is_empty());
}

// ── Persistence ───────────────────────────────────────────────

#[test]
fn saves_are_spaced_by_the_interval() {
    let mut b = Bench::boot();
    let rest = |ms| ConfigUpdate {
        rest_duration_ms: Some(ms),
        ..ConfigUpdate::default()
    };

    b.sup
        .update_config(&rest(200_000), 1_000, &mut b.nvs, &mut b.sink)
        .unwrap();
    b.sup
        .update_config(&rest(300_000), 2_000, &mut b.nvs, &mut b.sink)
        .unwrap();
    assert_eq!(b.nvs.saves.len(), 1, "second change inside the interval");
    assert_eq!(b.sup.config().rest_duration_ms, 300_000);

    b.sup
        .update_config(&rest(400_000), 61_000, &mut b.nvs, &mut b.sink)
        .unwrap();
    assert_eq!(b.nvs.saves.len(), 2);
    assert_eq!(b.nvs.last_saved().unwrap().config.rest_duration_ms, 400_000);
}

#[test]
fn reset_counters_writes_immediately() {
    let mut b = Bench::boot();
    b.run_until(700_000);
    assert_eq!(b.sup.counters().partial_cycles_total, 1);
    assert_eq!(b.nvs.saves.len(), 1);

    b.sup
        .reset_counters(700_500, &mut b.nvs, &mut b.sink)
        .unwrap();
    assert_eq!(b.sup.counters().partial_cycles_total, 0);
    assert_eq!(b.nvs.saves.len(), 2, "not held back by the interval");
    assert_eq!(b.nvs.last_saved().unwrap().counters.partial_cycles_total, 0);
    assert_eq!(b.sink.count(|e| matches!(e, AppEvent::CountersReset)), 1);

    b.nvs.fail = true;
    assert_eq!(
        b.sup.reset_counters(700_600, &mut b.nvs, &mut b.sink),
        Err(Error::Storage(StorageError::IoError))
    );
}

#[test]
fn restores_snapshot_from_nvs() {
    let mut nvs = NvsAdapter::new().unwrap();
    let mut snap = PersistedSnapshot::default();
    snap.config.rest_duration_ms = 42_000;
    snap.counters.completed_fills_total = 3;
    snap.counters.partial_cycles_total = 11;
    nvs.save(&snap).unwrap();

    let mut sup = Supervisor::restore(&nvs, &LoopConfig::default(), 0);
    let mut hw = MockHardware::new();
    let mut sink = RecordingSink::new();
    sup.start(&mut hw, &mut sink);

    assert!(matches!(
        sink.events[0],
        AppEvent::Started { restored: true, .. }
    ));
    assert_eq!(sup.config().rest_duration_ms, 42_000);
    assert_eq!(sup.counters().partial_cycles_total, 11);
    assert_eq!(sup.counters().completed_fills_total, 3);
    assert_eq!(sup.mode(), Mode::Automatic);

    sup.tick(41_750, &mut hw, &mut nvs, &mut sink);
    assert!(!sup.is_compressor_on());
    sup.tick(42_000, &mut hw, &mut nvs, &mut sink);
    assert!(sup.is_compressor_on());
}

#[test]
fn corrupted_nvs_falls_back_to_defaults() {
    let mut nvs = NvsAdapter::new().unwrap();
    nvs.write("compressor", "snapshot", &[0xFF, 0xFF]).unwrap();

    let mut sup = Supervisor::restore(&nvs, &LoopConfig::default(), 0);
    let mut hw = MockHardware::new();
    let mut sink = RecordingSink::new();
    sup.start(&mut hw, &mut sink);

    assert!(matches!(
        sink.events[0],
        AppEvent::Started { restored: false, .. }
    ));
    assert_eq!(sup.persisted_snapshot(), PersistedSnapshot::default());
}

// ── Status ────────────────────────────────────────────────────

#[test]
fn status_serialises_to_json() {
    let mut b = Bench::boot();
    b.tick_at(40_000);

    let json = b.sup.snapshot(40_000).to_json().unwrap();
    assert!(json.contains("\"state\":\"Off\""), "{json}");
    assert!(json.contains("\"mode\":\"Automatic\""), "{json}");
    assert!(json.contains("\"next_transition\":\"TurnOn\""), "{json}");
    assert!(json.contains("\"time_remaining_ms\":60000"), "{json}");
    assert!(json.contains("\"temperature_c\":25.0"), "{json}");
}

#[test]
fn status_counts_down_the_run() {
    let mut b = Bench::boot();
    b.run_until(100_000);

    let view = b.sup.snapshot(400_000);
    assert!(view.compressor_on);
    assert_eq!(view.next_transition, Some(NextTransition::TurnOff));
    assert_eq!(view.time_remaining_ms, 300_000);
    assert_eq!(view.uptime_ms, 400_000);
}
