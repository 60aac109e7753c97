//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the "blackboard" the duty-cycle handlers read from and
//! write to: the tick's sensor readings and safety verdict, the operating
//! mode, the duty-cycle timers, and the relay command the supervisor applies
//! after the tick.

use crate::config::OperatingConfig;
use crate::safety::SafetyVerdict;

use super::StopCause;

/// Who decides when the compressor runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum Mode {
    /// Only user commands start or stop the compressor.  Interlocks still
    /// apply.
    Manual,
    /// The duty-cycle timers start and stop the compressor.
    Automatic,
}

/// Readings taken at the start of a tick.  The single source of truth for
/// that tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorSnapshot {
    /// Latest valid temperature, `None` while the sensor is faulted.
    pub temperature_c: Option<f32>,
    pub tank_full: bool,
}

/// The shared context passed to every state handler function.
pub struct FsmContext {
    // -- Timing --
    /// Clock reading for the current tick (ms since boot).
    pub now_ms: u64,
    /// Last time the compressor was switched, or the rest reference was
    /// reset.  The rest timer counts from here.
    pub last_transition_ms: u64,
    /// When the current run started.  `None` while Off.
    pub cycle_start_ms: Option<u64>,

    // -- Inputs --
    pub sensors: SensorSnapshot,
    pub verdict: SafetyVerdict,
    pub config: OperatingConfig,
    pub mode: Mode,

    // -- Outputs --
    /// Relay command applied after the tick.
    pub relay_energized: bool,
    /// Why the last On → Off transition chosen by a handler happened.
    pub stop_cause: Option<StopCause>,
}

impl FsmContext {
    /// Fresh context at boot: Automatic, Off, rest timer starting at `now_ms`.
    pub fn new(config: OperatingConfig, now_ms: u64) -> Self {
        Self {
            now_ms,
            last_transition_ms: now_ms,
            cycle_start_ms: None,
            sensors: SensorSnapshot::default(),
            verdict: SafetyVerdict::unknown(),
            config,
            mode: Mode::Automatic,
            relay_energized: false,
            stop_cause: None,
        }
    }

    /// Milliseconds since the rest/transition reference.
    pub fn since_transition_ms(&self) -> u64 {
        self.now_ms.saturating_sub(self.last_transition_ms)
    }

    /// Milliseconds the current run has lasted.  Zero while Off.
    pub fn run_elapsed_ms(&self) -> u64 {
        self.cycle_start_ms
            .map_or(0, |start| self.now_ms.saturating_sub(start))
    }

    pub fn is_automatic(&self) -> bool {
        self.mode == Mode::Automatic
    }
}
