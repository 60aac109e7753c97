//! Fill-cycle tracker.
//!
//! Watches the tank-full switch for edges and measures how long each fill
//! takes and how many compressor starts it needed.
//!
//! ```text
//!   FULL ──[switch opens]──▶ EMPTY     window opens, partial count = 0
//!   EMPTY ─[compressor on]─▶ EMPTY     partial count += 1
//!   EMPTY ─[switch closes]─▶ FULL      record emitted, window closes
//! ```
//!
//! A compressor start while no window is open (and the tank is not full)
//! opens one as a fallback, for switches that miss the empty edge.  This is
//! best-effort: a glitching switch can make a fill start earlier than it
//! really did.

use log::info;

use crate::history::{FillCycleRecord, FillHistory};

pub struct FillCycleTracker {
    history: FillHistory,
    completed_fills: u64,
    tank_full: bool,
    window_start_ms: Option<u64>,
    partial_this_fill: u16,
}

impl Default for FillCycleTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl FillCycleTracker {
    pub fn new() -> Self {
        Self::restore(FillHistory::new(), 0)
    }

    /// Rebuild from persisted history and completed-fill counter.
    pub fn restore(history: FillHistory, completed_fills: u64) -> Self {
        Self {
            history,
            completed_fills,
            tank_full: false,
            window_start_ms: None,
            partial_this_fill: 0,
        }
    }

    /// Feed one level-switch sample.  Edge-triggered: repeating the
    /// previous value does nothing.  Returns the record of a fill that just
    /// completed.
    pub fn on_level_sample(&mut self, tank_full: bool, now_ms: u64) -> Option<FillCycleRecord> {
        if tank_full == self.tank_full {
            return None;
        }
        self.tank_full = tank_full;

        if !tank_full {
            self.window_start_ms = Some(now_ms);
            self.partial_this_fill = 0;
            info!("FILL: tank empty, fill timer started");
            return None;
        }

        let start_ms = self.window_start_ms.take()?;
        let record = FillCycleRecord {
            duration_secs: (now_ms.saturating_sub(start_ms) / 1000) as u32,
            partial_cycles: self.partial_this_fill,
        };
        self.history.push(record);
        self.completed_fills += 1;
        info!(
            "FILL: tank full after {} s in {} partial cycles",
            record.duration_secs, record.partial_cycles
        );
        Some(record)
    }

    /// Count a compressor start against the current fill.
    pub fn on_compressor_start(&mut self, now_ms: u64) {
        if self.window_start_ms.is_none() && !self.tank_full {
            self.window_start_ms = Some(now_ms);
            self.partial_this_fill = 0;
            info!("FILL: fill timer started by compressor start");
        }
        self.partial_this_fill = self.partial_this_fill.saturating_add(1);
        info!("FILL: partial cycle #{} started", self.partial_this_fill);
    }

    /// Zero the history and completed-fill counter.  A fill in progress
    /// keeps measuring.
    pub fn reset(&mut self) {
        self.history.clear();
        self.completed_fills = 0;
    }

    pub fn history(&self) -> &FillHistory {
        &self.history
    }

    pub fn completed_fills(&self) -> u64 {
        self.completed_fills
    }

    pub fn fill_in_progress_since(&self) -> Option<u64> {
        self.window_start_ms
    }

    pub fn partial_cycles_this_fill(&self) -> u16 {
        self.partial_this_fill
    }
}
