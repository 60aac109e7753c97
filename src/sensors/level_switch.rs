//! Tank-full float switch.
//!
//! The switch closes to GND when the tank is full; the input uses the
//! pull-up, so LOW means full.  A failed pin read is reported as full,
//! which keeps the compressor off until the input is readable again.

use embedded_hal::digital::InputPin;
use log::warn;

pub struct LevelSwitch<P: InputPin> {
    pin: P,
}

impl<P: InputPin> LevelSwitch<P> {
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    pub fn is_full(&mut self) -> bool {
        match self.pin.is_low() {
            Ok(low) => low,
            Err(e) => {
                warn!("Level switch read failed ({e:?}), assuming full");
                true
            }
        }
    }
}
