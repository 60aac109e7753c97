//! Safety monitor.
//!
//! Runs **every tick before the duty-cycle FSM** and condenses the latest
//! temperature reading and tank-full switch into a [`SafetyVerdict`].
//!
//! ## Thermal latch
//!
//! 1. Temperature reaches the ceiling: the thermal fault latches.
//! 2. The latch holds while the temperature stays within
//!    [`HYSTERESIS_BAND_C`] of the ceiling, even below the ceiling itself.
//! 3. Once the temperature drops below `ceiling - band` the latch clears.
//!
//! The band keeps the compressor from short-cycling right at the ceiling.
//!
//! ## Sensor faults
//!
//! An invalid reading is equivalent to over-temperature: the verdict is
//! unsafe until a valid reading arrives again.  The previous good
//! temperature is kept for display.

use crate::error::{BlockReason, SensorFault};
use log::{error, info};

/// Width of the hysteresis band below the ceiling (°C).  Fixed.
pub const HYSTERESIS_BAND_C: f32 = 5.0;

/// Result of one safety evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafetyVerdict {
    /// The compressor may run.
    pub safe_to_run: bool,
    /// Thermal fault latched.
    pub fault_latched: bool,
    /// The last temperature read failed.
    pub sensor_fault: bool,
    /// The tank-full switch is closed.
    pub tank_full: bool,
}

impl SafetyVerdict {
    /// Verdict used before the first evaluation: nothing is known yet, so
    /// nothing may run.
    pub const fn unknown() -> Self {
        Self {
            safe_to_run: false,
            fault_latched: false,
            sensor_fault: false,
            tank_full: false,
        }
    }

    /// The most significant reason the compressor must be off, if any.
    pub fn stop_reason(&self) -> Option<BlockReason> {
        if self.sensor_fault {
            Some(BlockReason::SensorFault)
        } else if self.fault_latched {
            Some(BlockReason::OverTemperature)
        } else if self.tank_full {
            Some(BlockReason::TankFull)
        } else {
            None
        }
    }
}

/// Thermal and sensor-fault supervisor.
pub struct SafetyMonitor {
    ceiling_c: f32,
    temp_latched: bool,
    sensor_fault: Option<SensorFault>,
    last_temp_c: Option<f32>,
}

impl SafetyMonitor {
    pub fn new(ceiling_c: f32) -> Self {
        Self {
            ceiling_c,
            temp_latched: false,
            sensor_fault: None,
            last_temp_c: None,
        }
    }

    /// Evaluate the latest reading and tank switch.
    pub fn evaluate(&mut self, reading: Result<f32, SensorFault>, tank_full: bool) -> SafetyVerdict {
        match reading {
            Ok(temp_c) => {
                if self.sensor_fault.take().is_some() {
                    info!("SAFETY: temperature sensor recovered ({temp_c:.1}\u{00b0}C)");
                }
                self.last_temp_c = Some(temp_c);
                self.update_latch(temp_c);
            }
            Err(fault) => {
                if self.sensor_fault.is_none() {
                    error!("SAFETY FAULT SET: {fault}, forcing compressor off");
                }
                self.sensor_fault = Some(fault);
            }
        }

        self.verdict(tank_full)
    }

    /// Drop a latched thermal fault so the next evaluation judges the live
    /// temperature only.
    pub fn clear_latch(&mut self) {
        if self.temp_latched {
            info!("SAFETY: thermal latch cleared by mode change");
        }
        self.temp_latched = false;
    }

    /// Change the ceiling.  Takes effect on the next evaluation.
    pub fn set_ceiling(&mut self, ceiling_c: f32) {
        self.ceiling_c = ceiling_c;
    }

    /// Decide whether a manual start may proceed, based on the state left by
    /// the last evaluation.
    pub fn check_manual_start(&self, tank_full: bool) -> Result<(), BlockReason> {
        if tank_full {
            return Err(BlockReason::TankFull);
        }
        if self.sensor_fault.is_some() {
            return Err(BlockReason::SensorFault);
        }
        let Some(temp_c) = self.last_temp_c else {
            // No valid reading yet since boot.
            return Err(BlockReason::SensorFault);
        };
        if temp_c >= self.ceiling_c {
            return Err(BlockReason::OverTemperature);
        }
        if self.temp_latched {
            return Err(BlockReason::Cooldown);
        }
        Ok(())
    }

    pub fn fault_latched(&self) -> bool {
        self.temp_latched
    }

    pub fn sensor_fault(&self) -> Option<SensorFault> {
        self.sensor_fault
    }

    /// Last valid temperature, if any was ever read.
    pub fn last_temp_c(&self) -> Option<f32> {
        self.last_temp_c
    }

    // ── Internal ──────────────────────────────────────────────────

    fn update_latch(&mut self, temp_c: f32) {
        if temp_c >= self.ceiling_c {
            if !self.temp_latched {
                error!(
                    "SAFETY FAULT SET: over temperature {temp_c:.1}\u{00b0}C >= {:.1}\u{00b0}C",
                    self.ceiling_c
                );
            }
            self.temp_latched = true;
        } else if self.temp_latched && temp_c < self.ceiling_c - HYSTERESIS_BAND_C {
            info!("SAFETY FAULT CLEARED: temperature down to {temp_c:.1}\u{00b0}C");
            self.temp_latched = false;
        }
    }

    fn verdict(&self, tank_full: bool) -> SafetyVerdict {
        let sensor_fault = self.sensor_fault.is_some();
        SafetyVerdict {
            safe_to_run: !sensor_fault && !self.temp_latched && !tank_full,
            fault_latched: self.temp_latched,
            sensor_fault,
            tank_full,
        }
    }
}
