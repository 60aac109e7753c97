//! Fixed-capacity histories: completed fill cycles and the hourly
//! temperature trend.
//!
//! Both are arena-style ring buffers with an explicit write cursor.  Callers
//! never see slot indices; they read through ordered iterators.

use serde::{Deserialize, Serialize};

/// Number of completed fill cycles kept.
pub const FILL_HISTORY_LEN: usize = 5;

/// Number of hourly temperature samples kept (one day).
pub const TEMP_TREND_LEN: usize = 24;

/// Spacing between two temperature trend samples (ms).
pub const TEMP_TREND_INTERVAL_MS: u64 = 3_600_000;

// ═══════════════════════════════════════════════════════════════
//  Fill cycles
// ═══════════════════════════════════════════════════════════════

/// One completed tank-empty → tank-full interval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillCycleRecord {
    /// Time from empty to full, in whole seconds.
    pub duration_secs: u32,
    /// Compressor starts during the fill.
    pub partial_cycles: u16,
}

/// Ring buffer of the last [`FILL_HISTORY_LEN`] fill cycles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillHistory {
    slots: [FillCycleRecord; FILL_HISTORY_LEN],
    /// Next slot to write.
    cursor: u8,
    /// Number of slots holding a record.
    len: u8,
}

impl Default for FillHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl FillHistory {
    pub const fn new() -> Self {
        Self {
            slots: [FillCycleRecord {
                duration_secs: 0,
                partial_cycles: 0,
            }; FILL_HISTORY_LEN],
            cursor: 0,
            len: 0,
        }
    }

    /// Append a record, overwriting the oldest once full.
    pub fn push(&mut self, record: FillCycleRecord) {
        self.slots[self.cursor as usize] = record;
        self.cursor = ((self.cursor as usize + 1) % FILL_HISTORY_LEN) as u8;
        if (self.len as usize) < FILL_HISTORY_LEN {
            self.len += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Records from newest to oldest.
    pub fn iter_recent(&self) -> impl Iterator<Item = &FillCycleRecord> + '_ {
        let cursor = self.cursor as usize;
        (0..self.len()).map(move |i| {
            &self.slots[(cursor + FILL_HISTORY_LEN - 1 - i) % FILL_HISTORY_LEN]
        })
    }

    /// Records in insertion order, oldest first.
    pub fn iter_chronological(&self) -> impl Iterator<Item = &FillCycleRecord> + '_ {
        let start = (self.cursor as usize + FILL_HISTORY_LEN - self.len()) % FILL_HISTORY_LEN;
        (0..self.len()).map(move |i| &self.slots[(start + i) % FILL_HISTORY_LEN])
    }

    /// Mean fill time in seconds over records with a non-zero duration.
    pub fn average_fill_secs(&self) -> Option<u32> {
        let (sum, count) = self
            .iter_recent()
            .filter(|r| r.duration_secs > 0)
            .fold((0u64, 0u64), |(s, n), r| (s + u64::from(r.duration_secs), n + 1));
        if count == 0 {
            None
        } else {
            Some((sum / count) as u32)
        }
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Clamp cursor and length read back from flash into range.
    pub fn sanitized(mut self) -> Self {
        if self.cursor as usize >= FILL_HISTORY_LEN || self.len as usize > FILL_HISTORY_LEN {
            log::warn!(
                "Stored fill history out of range (cursor={}, len={}), clamping",
                self.cursor,
                self.len
            );
            self.cursor %= FILL_HISTORY_LEN as u8;
            self.len = self.len.min(FILL_HISTORY_LEN as u8);
        }
        self
    }
}

// ═══════════════════════════════════════════════════════════════
//  Temperature trend
// ═══════════════════════════════════════════════════════════════

/// One point of the temperature chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendPoint {
    /// Age of the sample in whole hours (0 = newest).
    pub hours_ago: u8,
    pub temp_c: f32,
}

/// Hourly temperature samples for the last day.  Not persisted.
///
/// The first sample is due one full interval after `start_ms` (boot).
pub struct TemperatureTrend {
    slots: [Option<f32>; TEMP_TREND_LEN],
    cursor: usize,
    last_sample_ms: u64,
}

impl TemperatureTrend {
    pub const fn new(start_ms: u64) -> Self {
        Self {
            slots: [None; TEMP_TREND_LEN],
            cursor: 0,
            last_sample_ms: start_ms,
        }
    }

    /// Record `temp_c` if an hour has passed since the previous sample.
    /// Returns whether a sample was taken.
    pub fn maybe_record(&mut self, temp_c: f32, now_ms: u64) -> bool {
        if now_ms.saturating_sub(self.last_sample_ms) < TEMP_TREND_INTERVAL_MS {
            return false;
        }
        self.slots[self.cursor] = Some(temp_c);
        self.cursor = (self.cursor + 1) % TEMP_TREND_LEN;
        self.last_sample_ms = now_ms;
        log::debug!("Temperature trend sample: {temp_c:.1}\u{00b0}C");
        true
    }

    /// Recorded samples, oldest first.
    pub fn points(&self) -> heapless::Vec<TrendPoint, TEMP_TREND_LEN> {
        let mut out = heapless::Vec::new();
        for i in 0..TEMP_TREND_LEN {
            if let Some(temp_c) = self.slots[(self.cursor + i) % TEMP_TREND_LEN] {
                // Capacity equals the slot count.
                let _ = out.push(TrendPoint {
                    hours_ago: (TEMP_TREND_LEN - 1 - i) as u8,
                    temp_c,
                });
            }
        }
        out
    }
}
