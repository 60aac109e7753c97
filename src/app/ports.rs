//! Port traits: the hexagonal boundary between the supervisor and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Supervisor (domain)
//! ```
//!
//! Driven adapters (sensors, relay, clock, storage, event sinks) implement
//! these traits.  The [`Supervisor`](super::service::Supervisor) consumes
//! them via generics, so the domain core never touches hardware directly.

use crate::error::SensorFault;
use crate::persistence::PersistedSnapshot;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port, polled once per tick.
pub trait SensorPort {
    /// Compressor head temperature in °C, or why no valid reading exists.
    fn read_temperature(&mut self) -> Result<f32, SensorFault>;

    /// `true` while the tank-full switch is closed.
    fn read_tank_full(&mut self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Relay port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port for the compressor relay.
pub trait RelayPort {
    /// Energise or release the relay.  Repeating the current target must
    /// not produce another physical transition.
    fn set_relay(&mut self, energized: bool);
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock.
pub trait ClockPort {
    /// Milliseconds since boot.  Never goes backwards.
    fn now_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Persistence port (domain ↔ durable snapshot)
// ───────────────────────────────────────────────────────────────

/// Loads and stores the [`PersistedSnapshot`] as one unit.
///
/// Only the [`SaveDebouncer`](crate::persistence::SaveDebouncer) calls
/// `save`; everything else goes through it.
pub trait PersistencePort {
    /// `Ok(None)` when nothing was ever stored.
    fn load(&self) -> Result<Option<PersistedSnapshot>, StorageError>;

    fn save(&mut self, snapshot: &PersistedSnapshot) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (raw key-value NVS)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage.
///
/// - Keys are namespaced to prevent collisions between subsystems.
/// - Write operations MUST be atomic: no partial writes on power loss.
///   The ESP-IDF NVS API guarantees this natively; in-memory simulation
///   achieves it trivially.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`StoragePort`] and [`PersistencePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Generic I/O error.
    IoError,
    /// Stored blob failed to decode.
    Corrupted,
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
            Self::Corrupted => write!(f, "stored data corrupted"),
        }
    }
}
