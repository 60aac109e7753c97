//! Read-only projection of the supervisor for the status page.
//!
//! [`StatusView`] is what the HTTP layer renders.  It is built fresh on
//! every request and serialises to JSON with `serde_json`.

use serde::Serialize;

use crate::config::OperatingConfig;
use crate::fsm::StateId;
use crate::fsm::context::Mode;
use crate::history::{FILL_HISTORY_LEN, FillCycleRecord, TEMP_TREND_LEN, TrendPoint};
use crate::persistence::Counters;

/// What the duty-cycle timer will do next in automatic mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NextTransition {
    TurnOn,
    TurnOff,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusView {
    pub uptime_ms: u64,
    pub state: StateId,
    pub compressor_on: bool,
    pub mode: Mode,
    pub tank_full: bool,
    /// Last valid temperature, `None` before the first good reading.
    pub temperature_c: Option<f32>,
    pub sensor_fault: bool,
    pub fault_latched: bool,
    /// Current temperature at or above the ceiling.
    pub temperature_alert: bool,
    pub tank_full_alert: bool,
    /// `None` in manual mode.
    pub next_transition: Option<NextTransition>,
    /// Time until the timer-driven transition is due.  Zero when overdue
    /// (e.g. rest is over but an interlock holds the compressor off).
    pub time_remaining_ms: u64,
    pub config: OperatingConfig,
    pub counters: Counters,
    /// Newest first.
    pub fill_history: heapless::Vec<FillCycleRecord, FILL_HISTORY_LEN>,
    /// Mean over non-zero fill durations.
    pub average_fill_secs: Option<u32>,
    pub partial_cycles_this_fill: u16,
    /// Oldest first.
    pub temperature_trend: heapless::Vec<TrendPoint, TEMP_TREND_LEN>,
}

impl StatusView {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
