//! NTC thermistor temperature sensor (10 kOhm @ 25 C, B = 3950).
//!
//! Wired in a voltage divider with a fixed 10 kOhm resistor, read via the
//! ESP32-S3 ADC.  The simplified Beta equation converts resistance to
//! temperature.
//!
//! ## Fault detection
//!
//! A thermistor that is unplugged or shorted pins the divider at a rail, which
//! reads as [`SensorFault::Disconnected`].  A conversion that lands outside
//! the thermistor's rated range is [`SensorFault::OutOfRange`].
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads the ADC1 oneshot channel initialised by `hw_init`.
//! On host/test: reads from a static `AtomicU16` for injection.

use core::sync::atomic::AtomicU16;
#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::Ordering;

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;
use crate::error::SensorFault;

static SIM_TEMP_ADC: AtomicU16 = AtomicU16::new(2048);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_temp_adc(raw: u16) {
    SIM_TEMP_ADC.store(raw, Ordering::Relaxed);
}

const R25: f32 = 10_000.0;
const BETA: f32 = 3950.0;
const T25_K: f32 = 298.15;
const R_DIVIDER: f32 = 10_000.0;
const ADC_MAX: f32 = 4095.0;
const V_REF: f32 = 3.3;
/// Distance from either rail (V) below which the thermistor counts as open or
/// shorted.
const RAIL_MARGIN_V: f32 = 0.01;

/// Rated range of the thermistor.
const MIN_PLAUSIBLE_C: f32 = -40.0;
const MAX_PLAUSIBLE_C: f32 = 125.0;

pub struct TemperatureSensor {
    adc_channel: u32,
}

impl TemperatureSensor {
    pub fn new(adc_channel: u32) -> Self {
        Self { adc_channel }
    }

    pub fn read(&self) -> Result<f32, SensorFault> {
        let raw = self.read_adc().ok_or(SensorFault::Disconnected)?;
        celsius_from_adc(raw)
    }

    #[cfg(target_os = "espidf")]
    fn read_adc(&self) -> Option<u16> {
        hw_init::adc1_read(self.adc_channel)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_adc(&self) -> Option<u16> {
        let _ = self.adc_channel;
        Some(SIM_TEMP_ADC.load(Ordering::Relaxed))
    }
}

/// Convert a raw 12-bit divider reading to °C.
pub fn celsius_from_adc(raw: u16) -> Result<f32, SensorFault> {
    let voltage = (raw as f32 / ADC_MAX) * V_REF;
    if voltage <= RAIL_MARGIN_V || voltage >= V_REF - RAIL_MARGIN_V {
        return Err(SensorFault::Disconnected);
    }
    let r_ntc = R_DIVIDER * voltage / (V_REF - voltage);
    let inv_t = (1.0 / T25_K) + (1.0 / BETA) * (r_ntc / R25).ln();
    if inv_t <= 0.0 {
        return Err(SensorFault::OutOfRange);
    }
    let celsius = (1.0 / inv_t) - 273.15;
    if !(MIN_PLAUSIBLE_C..=MAX_PLAUSIBLE_C).contains(&celsius) {
        return Err(SensorFault::OutOfRange);
    }
    Ok(celsius)
}
