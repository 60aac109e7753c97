//! Outbound application events.
//!
//! The [`Supervisor`](super::service::Supervisor) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them (serial log, web socket, ...).

use crate::config::OperatingConfig;
use crate::error::BlockReason;
use crate::fsm::context::Mode;
use crate::fsm::{StateId, StopCause};
use crate::history::FillCycleRecord;

use super::status::StatusView;

/// Structured events emitted by the application core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The supervisor has started.  `restored` is true when a persisted
    /// snapshot was loaded.
    Started { state: StateId, restored: bool },

    /// The relay was energised.
    CompressorStarted { mode: Mode },

    /// The relay was released.
    CompressorStopped { cause: StopCause },

    /// An interlock became active.
    FaultDetected(BlockReason),

    /// No interlock is active any more.
    FaultCleared,

    /// A tank fill completed.
    FillCompleted(FillCycleRecord),

    ModeChanged(Mode),

    ConfigUpdated(OperatingConfig),

    /// Counters and fill history were zeroed.
    CountersReset,

    /// Periodic telemetry snapshot.
    Telemetry(StatusView),
}
