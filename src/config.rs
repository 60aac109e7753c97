//! Operating configuration for the compressor supervisor.
//!
//! [`OperatingConfig`] holds the three tunable parameters that the user can
//! change at runtime and that survive a reboot.  [`LoopConfig`] holds the
//! fixed timing of the control loop itself and is never persisted.

use serde::{Deserialize, Serialize};

use crate::error::ConfigViolation;

/// Shortest accepted compressor on-duration.
pub const MIN_ON_DURATION_MS: u32 = 60_000;
/// Shortest accepted rest interval between automatic runs.
pub const MIN_REST_DURATION_MS: u32 = 1_000;

/// Tunable duty-cycle and safety parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OperatingConfig {
    /// How long the compressor runs per automatic cycle (ms).
    pub on_duration_ms: u32,
    /// Minimum rest between two automatic runs (ms).
    pub rest_duration_ms: u32,
    /// Temperature at which the compressor is cut off (°C).
    pub temp_ceiling_c: f32,
}

impl Default for OperatingConfig {
    fn default() -> Self {
        Self {
            on_duration_ms: 600_000,  // 10 min
            rest_duration_ms: 100_000, // 1 min 40 s
            temp_ceiling_c: 60.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Per-field validation
// ---------------------------------------------------------------------------

pub fn validate_on_duration(ms: u32) -> Result<u32, ConfigViolation> {
    if ms >= MIN_ON_DURATION_MS {
        Ok(ms)
    } else {
        Err(ConfigViolation::OnDurationTooShort)
    }
}

pub fn validate_rest_duration(ms: u32) -> Result<u32, ConfigViolation> {
    if ms >= MIN_REST_DURATION_MS {
        Ok(ms)
    } else {
        Err(ConfigViolation::RestDurationTooShort)
    }
}

/// The ceiling must be a finite positive temperature.  An infinite ceiling
/// would silently disable the thermal cutoff.
pub fn validate_temp_ceiling(c: f32) -> Result<f32, ConfigViolation> {
    if c.is_finite() && c > 0.0 {
        Ok(c)
    } else {
        Err(ConfigViolation::CeilingNotPositive)
    }
}

impl OperatingConfig {
    /// Replace every invalid field with its default.
    ///
    /// Used on values read back from flash, which may predate a validation
    /// rule or have been written by an older firmware.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let on_duration_ms = validate_on_duration(self.on_duration_ms).unwrap_or_else(|e| {
            log::warn!("Stored config: {e}, using default");
            defaults.on_duration_ms
        });
        let rest_duration_ms = validate_rest_duration(self.rest_duration_ms).unwrap_or_else(|e| {
            log::warn!("Stored config: {e}, using default");
            defaults.rest_duration_ms
        });
        let temp_ceiling_c = validate_temp_ceiling(self.temp_ceiling_c).unwrap_or_else(|e| {
            log::warn!("Stored config: {e}, using default");
            defaults.temp_ceiling_c
        });
        Self {
            on_duration_ms,
            rest_duration_ms,
            temp_ceiling_c,
        }
    }

    /// Apply a partial update field by field.
    ///
    /// Valid fields are written even when others in the same update are
    /// rejected.  The returned report says which fields were accepted,
    /// which of those actually changed value, and why the rest failed.
    pub fn apply(&mut self, update: &ConfigUpdate) -> AppliedFields {
        let mut report = AppliedFields::default();

        if let Some(ms) = update.on_duration_ms {
            match validate_on_duration(ms) {
                Ok(ms) => {
                    report.accepted.insert(ConfigField::OnDuration);
                    if ms != self.on_duration_ms {
                        self.on_duration_ms = ms;
                        report.changed.insert(ConfigField::OnDuration);
                    }
                }
                Err(v) => report.reject(v),
            }
        }

        if let Some(ms) = update.rest_duration_ms {
            match validate_rest_duration(ms) {
                Ok(ms) => {
                    report.accepted.insert(ConfigField::RestDuration);
                    if ms != self.rest_duration_ms {
                        self.rest_duration_ms = ms;
                        report.changed.insert(ConfigField::RestDuration);
                    }
                }
                Err(v) => report.reject(v),
            }
        }

        if let Some(c) = update.temp_ceiling_c {
            match validate_temp_ceiling(c) {
                Ok(c) => {
                    report.accepted.insert(ConfigField::TempCeiling);
                    if c.to_bits() != self.temp_ceiling_c.to_bits() {
                        self.temp_ceiling_c = c;
                        report.changed.insert(ConfigField::TempCeiling);
                    }
                }
                Err(v) => report.reject(v),
            }
        }

        report
    }
}

// ---------------------------------------------------------------------------
// Partial updates
// ---------------------------------------------------------------------------

/// A batched configuration change.  `None` fields are left untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigUpdate {
    pub on_duration_ms: Option<u32>,
    pub rest_duration_ms: Option<u32>,
    pub temp_ceiling_c: Option<f32>,
}

impl ConfigUpdate {
    pub fn is_empty(&self) -> bool {
        self.on_duration_ms.is_none()
            && self.rest_duration_ms.is_none()
            && self.temp_ceiling_c.is_none()
    }
}

/// Identifies one field of [`OperatingConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConfigField {
    OnDuration = 0b001,
    RestDuration = 0b010,
    TempCeiling = 0b100,
}

impl ConfigField {
    pub const fn mask(self) -> u8 {
        self as u8
    }
}

/// Small bitset of [`ConfigField`]s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldSet(u8);

impl FieldSet {
    pub fn insert(&mut self, field: ConfigField) {
        self.0 |= field.mask();
    }

    pub fn contains(self, field: ConfigField) -> bool {
        self.0 & field.mask() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }
}

/// Outcome of [`OperatingConfig::apply`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppliedFields {
    /// Fields that passed validation.
    pub accepted: FieldSet,
    /// Accepted fields whose value differs from before.
    pub changed: FieldSet,
    /// Why each rejected field failed.
    pub rejected: heapless::Vec<ConfigViolation, 3>,
}

impl AppliedFields {
    fn reject(&mut self, violation: ConfigViolation) {
        // Capacity equals the number of fields, so this cannot overflow.
        let _ = self.rejected.push(violation);
    }

    /// True if at least one field changed value (a save is due).
    pub fn any_changed(&self) -> bool {
        !self.changed.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Loop timing (not persisted)
// ---------------------------------------------------------------------------

/// Fixed timing of the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopConfig {
    /// Interval between supervisor ticks (ms).
    pub tick_interval_ms: u32,
    /// Interval between telemetry events (ms).
    pub telemetry_interval_ms: u32,
    /// Minimum spacing between two flash writes (ms).
    pub save_interval_ms: u32,
    /// Task watchdog timeout (ms).  Covers several missed ticks plus one
    /// flash write.
    pub watchdog_timeout_ms: u32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 250,
            telemetry_interval_ms: 60_000,
            save_interval_ms: 60_000,
            watchdog_timeout_ms: 3_000,
        }
    }
}
