//! Concrete state handler functions and table builder.
//!
//! Each state is defined by plain `fn` pointers: no closures, no dynamic
//! dispatch, no heap.
//!
//! ```text
//!        ┌──[auto ∧ safe ∧ rest elapsed]──┐
//!        │                                ▼
//!       OFF                               ON
//!        ▲                                │
//!        └──[unsafe ∨ (auto ∧ run done)]──┘
//!
//!  Manual mode: OFF ↔ ON only by command (supervisor forces the state);
//!  ON still drops to OFF on any interlock.
//! ```

use super::context::FsmContext;
use super::{StateDescriptor, StateId, StopCause};
use crate::error::BlockReason;
use log::info;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0: Off
        StateDescriptor {
            name: "Off",
            on_enter: Some(off_enter),
            on_exit: None,
            on_update: off_update,
        },
        // Index 1: On
        StateDescriptor {
            name: "On",
            on_enter: Some(on_enter),
            on_exit: None,
            on_update: on_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  OFF state
// ═══════════════════════════════════════════════════════════════════════════

fn off_enter(ctx: &mut FsmContext) {
    ctx.relay_energized = false;
    ctx.cycle_start_ms = None;
    // Any stop restarts the rest timer.
    ctx.last_transition_ms = ctx.now_ms;
    info!("OFF: relay released, resting {} ms", ctx.config.rest_duration_ms);
}

fn off_update(ctx: &mut FsmContext) -> Option<StateId> {
    if !ctx.is_automatic() || !ctx.verdict.safe_to_run || ctx.sensors.tank_full {
        return None;
    }

    if ctx.since_transition_ms() >= u64::from(ctx.config.rest_duration_ms) {
        info!("OFF: rest of {} ms complete, starting", ctx.since_transition_ms());
        return Some(StateId::On);
    }

    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  ON state
// ═══════════════════════════════════════════════════════════════════════════

fn on_enter(ctx: &mut FsmContext) {
    ctx.relay_energized = true;
    ctx.cycle_start_ms = Some(ctx.now_ms);
    ctx.last_transition_ms = ctx.now_ms;
    ctx.stop_cause = None;
    info!("ON: relay energised ({:?})", ctx.mode);
}

fn on_update(ctx: &mut FsmContext) -> Option<StateId> {
    // Interlocks beat the timer on the same tick.
    if !ctx.verdict.safe_to_run || ctx.sensors.tank_full {
        let reason = ctx.verdict.stop_reason().unwrap_or(if ctx.sensors.tank_full {
            BlockReason::TankFull
        } else {
            // No evaluation yet.
            BlockReason::SensorFault
        });
        ctx.stop_cause = Some(StopCause::Interlock(reason));
        return Some(StateId::Off);
    }

    if !ctx.is_automatic() {
        return None;
    }

    if ctx.run_elapsed_ms() >= u64::from(ctx.config.on_duration_ms) {
        info!("ON: run of {} ms complete", ctx.run_elapsed_ms());
        ctx.stop_cause = Some(StopCause::RunComplete);
        return Some(StateId::Off);
    }

    None
}
