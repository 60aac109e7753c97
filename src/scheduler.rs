//! Control-loop scheduler.
//!
//! The supervisor has no notion of time passing on its own.  The
//! [`ControlLoop`] reads the clock, hands queued commands to the
//! supervisor, and calls `tick()` whenever the tick interval has elapsed.
//! It never sleeps; `main` sleeps for [`ControlLoop::ms_until_next_tick`].
//! An attached [`Watchdog`] is fed at the end of every pass.
//!
//! ```text
//!  ┌────────────┐  AppCommand   ┌─────────────┐
//!  │  Web task  │──────────────▶│ ControlLoop │──▶ Supervisor.handle_command()
//!  │            │◀──────────────│   poll()    │──▶ Supervisor.tick()
//!  └────────────┘  CommandReply └─────────────┘──▶ AppEvent::Telemetry
//! ```
//!
//! Commands are always drained before the tick in the same pass, so a
//! command observes the readings of the previous tick.

use log::warn;

use crate::app::commands::{CommandChannel, ReplyChannel};
use crate::app::events::AppEvent;
use crate::app::ports::{ClockPort, EventSink, PersistencePort, RelayPort, SensorPort};
use crate::app::service::Supervisor;
use crate::config::LoopConfig;
use crate::drivers::watchdog::Watchdog;

pub struct ControlLoop<'a> {
    timing: LoopConfig,
    commands: &'a CommandChannel,
    replies: &'a ReplyChannel,
    watchdog: Option<&'a Watchdog>,
    last_tick_ms: Option<u64>,
    last_telemetry_ms: Option<u64>,
}

impl<'a> ControlLoop<'a> {
    pub fn new(timing: LoopConfig, commands: &'a CommandChannel, replies: &'a ReplyChannel) -> Self {
        Self {
            timing,
            commands,
            replies,
            watchdog: None,
            last_tick_ms: None,
            last_telemetry_ms: None,
        }
    }

    pub fn with_watchdog(mut self, watchdog: &'a Watchdog) -> Self {
        self.watchdog = Some(watchdog);
        self
    }

    /// One scheduling pass.  Returns `true` if the supervisor ticked.
    pub fn poll(
        &mut self,
        supervisor: &mut Supervisor,
        clock: &impl ClockPort,
        hw: &mut (impl SensorPort + RelayPort),
        store: &mut impl PersistencePort,
        sink: &mut impl EventSink,
    ) -> bool {
        let now_ms = clock.now_ms();

        // 1. Commands
        while let Ok(cmd) = self.commands.try_receive() {
            let reply = supervisor.handle_command(cmd, now_ms, hw, store, sink);
            if self.replies.try_send(reply).is_err() {
                warn!("Reply channel full, reply dropped");
            }
        }

        // 2. Tick
        let tick_due = self.last_tick_ms.is_none_or(|last| {
            now_ms.saturating_sub(last) >= u64::from(self.timing.tick_interval_ms)
        });
        if tick_due {
            supervisor.tick(now_ms, hw, store, sink);
            self.last_tick_ms = Some(now_ms);
        }

        // 3. Telemetry
        let telemetry_due = self.last_telemetry_ms.is_none_or(|last| {
            now_ms.saturating_sub(last) >= u64::from(self.timing.telemetry_interval_ms)
        });
        if telemetry_due && self.last_tick_ms.is_some() {
            sink.emit(&AppEvent::Telemetry(supervisor.snapshot(now_ms)));
            self.last_telemetry_ms = Some(now_ms);
        }

        if let Some(wdt) = self.watchdog {
            wdt.feed();
        }

        tick_due
    }

    /// How long the caller may sleep before the next tick is due.
    pub fn ms_until_next_tick(&self, now_ms: u64) -> u64 {
        match self.last_tick_ms {
            None => 0,
            Some(last) => {
                let next = last + u64::from(self.timing.tick_interval_ms);
                next.saturating_sub(now_ms)
            }
        }
    }
}
