//! Inbound commands to the supervisor and the channels that carry them.
//!
//! The connectivity task (web server) never touches the supervisor
//! directly.  It posts an [`AppCommand`] and waits for the matching
//! [`CommandReply`]; the control loop is the only writer.
//!
//! ```text
//! ┌──────────────┐  AppCommand   ┌──────────────┐
//! │  Web task    │──────────────▶│ Control Loop │
//! │              │◀──────────────│ (Supervisor) │
//! └──────────────┘  CommandReply └──────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use crate::config::{AppliedFields, ConfigUpdate};
use crate::error::Error;

use super::status::StatusView;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone)]
pub enum AppCommand {
    /// Manual start.  Switches to manual mode.
    TurnOn,
    /// Manual stop.  Switches to manual mode.
    TurnOff,
    /// Hand control back to the duty-cycle timers.
    SetAutomatic,
    UpdateConfig(ConfigUpdate),
    /// Zero counters and fill history.
    ResetCounters,
    GetStatus,
}

/// Answer to one [`AppCommand`].
#[derive(Debug, Clone)]
pub enum CommandReply {
    Done,
    ConfigApplied(AppliedFields),
    Status(Box<StatusView>),
    Rejected(Error),
}

/// Channel depth for inbound commands.
pub const CMD_DEPTH: usize = 4;

/// Channel depth for replies.
pub const REPLY_DEPTH: usize = 4;

pub type CommandChannel = Channel<CriticalSectionRawMutex, AppCommand, CMD_DEPTH>;
pub type ReplyChannel = Channel<CriticalSectionRawMutex, CommandReply, REPLY_DEPTH>;

/// Inbound command channel: web task → control loop.
pub static CMD_CHANNEL: CommandChannel = Channel::new();

/// Outbound reply channel: control loop → web task.
pub static REPLY_CHANNEL: ReplyChannel = Channel::new();
