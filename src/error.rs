//! Unified error types for the compressor supervisor.
//!
//! A single [`Error`] enum that every subsystem converts into, so command
//! handlers and the control loop report failures uniformly.  All variants
//! are `Copy`; none of them is fatal.  The worst response to any of them is
//! "stay or go Off and report it".

use core::fmt;

use crate::app::ports::StorageError;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The temperature sensor could not deliver a valid reading.
    Sensor(SensorFault),
    /// A manual start was refused by an interlock.
    Blocked(BlockReason),
    /// A configuration value was out of range.
    InvalidConfig(ConfigViolation),
    /// The backing store failed.
    Storage(StorageError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Blocked(e) => write!(f, "blocked: {e}"),
            Self::InvalidConfig(e) => write!(f, "invalid config: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor faults
// ---------------------------------------------------------------------------

/// Why a temperature reading was rejected.  Any of these is treated exactly
/// like an over-temperature condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorFault {
    /// Open or shorted thermistor (ADC pinned at a rail).
    Disconnected,
    /// Reading outside the physically plausible range.
    OutOfRange,
}

impl fmt::Display for SensorFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "temperature sensor disconnected"),
            Self::OutOfRange => write!(f, "temperature reading out of range"),
        }
    }
}

impl From<SensorFault> for Error {
    fn from(e: SensorFault) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Interlocks
// ---------------------------------------------------------------------------

/// Condition that keeps the compressor from running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    /// The tank-full switch is closed.
    TankFull,
    /// Temperature is at or above the ceiling.
    OverTemperature,
    /// A thermal fault is latched and the temperature has not yet fallen
    /// below the hysteresis band.
    Cooldown,
    /// The temperature sensor is not delivering valid readings.
    SensorFault,
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TankFull => write!(f, "tank is full"),
            Self::OverTemperature => write!(f, "temperature above limit"),
            Self::Cooldown => write!(f, "waiting for temperature to drop"),
            Self::SensorFault => write!(f, "temperature sensor fault"),
        }
    }
}

impl From<BlockReason> for Error {
    fn from(e: BlockReason) -> Self {
        Self::Blocked(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigViolation {
    /// On-duration below one minute.
    OnDurationTooShort,
    /// Rest-duration below one second.
    RestDurationTooShort,
    /// Ceiling not a finite value above 0 °C.
    CeilingNotPositive,
    /// The update carried no fields at all.
    NoFields,
}

impl fmt::Display for ConfigViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OnDurationTooShort => write!(f, "on-duration must be at least 60000 ms"),
            Self::RestDurationTooShort => write!(f, "rest-duration must be at least 1000 ms"),
            Self::CeilingNotPositive => write!(f, "temperature ceiling must be above 0"),
            Self::NoFields => write!(f, "no fields to update"),
        }
    }
}

impl From<ConfigViolation> for Error {
    fn from(e: ConfigViolation) -> Self {
        Self::InvalidConfig(e)
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
