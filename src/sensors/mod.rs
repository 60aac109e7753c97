//! Sensor subsystem: individual drivers and the aggregating [`SensorHub`].

pub mod level_switch;
pub mod temperature;

use embedded_hal::digital::InputPin;

use crate::error::SensorFault;
use level_switch::LevelSwitch;
use temperature::TemperatureSensor;

/// Owns every sensor driver.
pub struct SensorHub<P: InputPin> {
    pub temperature: TemperatureSensor,
    pub tank: LevelSwitch<P>,
}

impl<P: InputPin> SensorHub<P> {
    /// Pass in pre-built drivers (built in main where peripheral ownership
    /// is established).
    pub fn new(temperature: TemperatureSensor, tank: LevelSwitch<P>) -> Self {
        Self { temperature, tank }
    }

    pub fn read_temperature(&mut self) -> Result<f32, SensorFault> {
        self.temperature.read()
    }

    pub fn read_tank_full(&mut self) -> bool {
        self.tank.is_full()
    }
}
