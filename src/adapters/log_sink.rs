//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART / USB-CDC in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::fsm::StopCause;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                let temp = t
                    .temperature_c
                    .map_or_else(|| "--".to_string(), |c| format!("{c:.1}\u{00b0}C"));
                info!(
                    "TELEM | state={:?} mode={:?} | T={} | tank={} | latched={} sensor_fault={} | \
                     next={:?} in {}s | partials={} fills={} avg_fill={:?}s",
                    t.state,
                    t.mode,
                    temp,
                    if t.tank_full { "FULL" } else { "filling" },
                    t.fault_latched,
                    t.sensor_fault,
                    t.next_transition,
                    t.time_remaining_ms / 1000,
                    t.counters.partial_cycles_total,
                    t.counters.completed_fills_total,
                    t.average_fill_secs,
                );
            }
            AppEvent::CompressorStarted { mode } => {
                info!("RELAY | on ({:?})", mode);
            }
            AppEvent::CompressorStopped { cause } => match cause {
                StopCause::Interlock(reason) => warn!("RELAY | off: {}", reason),
                StopCause::RunComplete => info!("RELAY | off: run complete"),
                StopCause::FillCompleted => info!("RELAY | off: tank filled, resting"),
                StopCause::Manual => info!("RELAY | off: manual"),
            },
            AppEvent::FaultDetected(reason) => {
                warn!("FAULT | {}", reason);
            }
            AppEvent::FaultCleared => {
                info!("FAULT | cleared");
            }
            AppEvent::FillCompleted(rec) => {
                info!(
                    "FILL | {}s in {} partial cycles",
                    rec.duration_secs, rec.partial_cycles
                );
            }
            AppEvent::ModeChanged(mode) => {
                info!("MODE | {:?}", mode);
            }
            AppEvent::ConfigUpdated(c) => {
                info!(
                    "CONFIG | on={}ms rest={}ms ceiling={:.1}\u{00b0}C",
                    c.on_duration_ms, c.rest_duration_ms, c.temp_ceiling_c
                );
            }
            AppEvent::CountersReset => {
                info!("COUNTERS | reset");
            }
            AppEvent::Started { state, restored } => {
                info!("START | initial_state={:?} restored={}", state, restored);
            }
        }
    }
}
