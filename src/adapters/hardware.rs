//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the [`SensorHub`], the relay driver and the status LED, exposing
//! them through [`SensorPort`] and [`RelayPort`].  This is the only module
//! in the system that touches actual hardware.

use embedded_hal::digital::{InputPin, OutputPin};

use crate::app::ports::{RelayPort, SensorPort};
use crate::drivers::relay::RelayDriver;
use crate::drivers::status_led::StatusLed;
use crate::error::SensorFault;
use crate::sensors::SensorHub;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<I: InputPin, O: OutputPin, L: OutputPin> {
    sensor_hub: SensorHub<I>,
    relay: RelayDriver<O>,
    led: StatusLed<L>,
}

impl<I: InputPin, O: OutputPin, L: OutputPin> HardwareAdapter<I, O, L> {
    pub fn new(sensor_hub: SensorHub<I>, relay: RelayDriver<O>, led: StatusLed<L>) -> Self {
        Self {
            sensor_hub,
            relay,
            led,
        }
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<I: InputPin, O: OutputPin, L: OutputPin> SensorPort for HardwareAdapter<I, O, L> {
    fn read_temperature(&mut self) -> Result<f32, SensorFault> {
        self.sensor_hub.read_temperature()
    }

    fn read_tank_full(&mut self) -> bool {
        self.sensor_hub.read_tank_full()
    }
}

// ── RelayPort implementation ──────────────────────────────────

impl<I: InputPin, O: OutputPin, L: OutputPin> RelayPort for HardwareAdapter<I, O, L> {
    /// The LED follows the commanded relay state.
    fn set_relay(&mut self, energized: bool) {
        self.relay.set(energized);
        self.led.set(energized);
    }
}
