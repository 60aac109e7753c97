//! Status LED driver.
//!
//! Active-high LED that mirrors the compressor relay: lit while the
//! compressor runs.  Like the relay driver it skips repeated writes, so it
//! can be set on every tick.

use embedded_hal::digital::OutputPin;
use log::warn;

pub struct StatusLed<P: OutputPin> {
    pin: P,
    lit: Option<bool>,
}

impl<P: OutputPin> StatusLed<P> {
    pub fn new(pin: P) -> Self {
        Self { pin, lit: None }
    }

    pub fn set(&mut self, on: bool) {
        if self.lit == Some(on) {
            return;
        }
        let result = if on {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        match result {
            Ok(()) => self.lit = Some(on),
            // Cosmetic only; retried on the next call.
            Err(e) => warn!("Status LED write failed: {e:?}"),
        }
    }
}
