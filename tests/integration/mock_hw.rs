//! Mock adapters for integration tests.
//!
//! Records every relay call, every save and every event so tests can
//! assert on the full history without touching real GPIO or flash.

use compressor::app::events::AppEvent;
use compressor::app::ports::{EventSink, PersistencePort, RelayPort, SensorPort, StorageError};
use compressor::error::SensorFault;
use compressor::persistence::PersistedSnapshot;

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub temperature: Result<f32, SensorFault>,
    pub tank_full: bool,
    pub relay_calls: Vec<bool>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            temperature: Ok(25.0),
            tank_full: false,
            relay_calls: Vec::new(),
        }
    }

    pub fn relay_on(&self) -> bool {
        self.relay_calls.last().copied().unwrap_or(false)
    }

    /// Number of off→on and on→off changes seen on the relay line.
    pub fn relay_switches(&self) -> usize {
        self.relay_calls.windows(2).filter(|w| w[0] != w[1]).count()
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockHardware {
    fn read_temperature(&mut self) -> Result<f32, SensorFault> {
        self.temperature
    }

    fn read_tank_full(&mut self) -> bool {
        self.tank_full
    }
}

impl RelayPort for MockHardware {
    fn set_relay(&mut self, energized: bool) {
        self.relay_calls.push(energized);
    }
}

// ── MockNvs ───────────────────────────────────────────────────

/// In-memory persistence that remembers every successful save.
#[derive(Default)]
pub struct MockNvs {
    pub saves: Vec<PersistedSnapshot>,
    /// When set, every save fails with `IoError`.
    pub fail: bool,
}

#[allow(dead_code)]
impl MockNvs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_saved(&self) -> Option<&PersistedSnapshot> {
        self.saves.last()
    }
}

impl PersistencePort for MockNvs {
    fn load(&self) -> Result<Option<PersistedSnapshot>, StorageError> {
        Ok(self.saves.last().cloned())
    }

    fn save(&mut self, snapshot: &PersistedSnapshot) -> Result<(), StorageError> {
        if self.fail {
            return Err(StorageError::IoError);
        }
        self.saves.push(snapshot.clone());
        Ok(())
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
