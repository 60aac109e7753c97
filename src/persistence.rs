//! Durable state and the write debouncer.
//!
//! Everything that survives a reboot travels as one [`PersistedSnapshot`]
//! blob.  Writes go through [`SaveDebouncer`], which spaces them at least
//! `save_interval_ms` apart to spare the flash.  A request inside the
//! interval is dropped, not queued: the next state change that asks for a
//! save after the interval carries the newer data anyway.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::{PersistencePort, StorageError};
use crate::config::OperatingConfig;
use crate::history::FillHistory;

/// Lifetime totals.  Only a user reset makes them go down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    /// Compressor starts, manual and automatic.
    pub partial_cycles_total: u64,
    /// Completed tank fills.
    pub completed_fills_total: u64,
}

/// The unit of durability.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedSnapshot {
    pub config: OperatingConfig,
    pub counters: Counters,
    pub history: FillHistory,
}

impl PersistedSnapshot {
    /// Encode to the on-flash format.
    pub fn to_bytes(&self) -> Result<Vec<u8>, StorageError> {
        postcard::to_allocvec(self).map_err(|_| StorageError::IoError)
    }

    /// Decode from the on-flash format and sanitise every field.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StorageError> {
        let snapshot: Self = postcard::from_bytes(bytes).map_err(|_| StorageError::Corrupted)?;
        Ok(snapshot.sanitized())
    }

    /// Replace out-of-range values read back from flash.
    pub fn sanitized(self) -> Self {
        Self {
            config: self.config.sanitized(),
            counters: self.counters,
            history: self.history.sanitized(),
        }
    }
}

/// Result of a save request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The snapshot reached the store.
    Written,
    /// Dropped because the last write was too recent.
    Skipped,
    /// The store refused the write.  The interval is not restarted, so the
    /// next request tries again.
    Failed(StorageError),
}

/// Rate limiter for flash writes.
pub struct SaveDebouncer {
    interval_ms: u64,
    last_write_ms: Option<u64>,
}

impl SaveDebouncer {
    pub fn new(interval_ms: u32) -> Self {
        Self {
            interval_ms: u64::from(interval_ms),
            last_write_ms: None,
        }
    }

    /// Write `snapshot` unless the previous successful write happened less
    /// than the interval ago.
    pub fn request_save(
        &mut self,
        snapshot: &PersistedSnapshot,
        now_ms: u64,
        store: &mut impl PersistencePort,
    ) -> SaveOutcome {
        if let Some(last) = self.last_write_ms {
            let since = now_ms.saturating_sub(last);
            if since < self.interval_ms {
                info!("PERSIST: save skipped, last write {since} ms ago");
                return SaveOutcome::Skipped;
            }
        }
        self.write(snapshot, now_ms, store)
    }

    /// Write `snapshot` regardless of the interval.
    pub fn force_save(
        &mut self,
        snapshot: &PersistedSnapshot,
        now_ms: u64,
        store: &mut impl PersistencePort,
    ) -> SaveOutcome {
        self.write(snapshot, now_ms, store)
    }

    pub fn last_write_ms(&self) -> Option<u64> {
        self.last_write_ms
    }

    fn write(
        &mut self,
        snapshot: &PersistedSnapshot,
        now_ms: u64,
        store: &mut impl PersistencePort,
    ) -> SaveOutcome {
        match store.save(snapshot) {
            Ok(()) => {
                self.last_write_ms = Some(now_ms);
                info!(
                    "PERSIST: snapshot written (fills={}, partials={})",
                    snapshot.counters.completed_fills_total, snapshot.counters.partial_cycles_total
                );
                SaveOutcome::Written
            }
            Err(e) => {
                warn!("PERSIST: save failed: {e}");
                SaveOutcome::Failed(e)
            }
        }
    }
}
