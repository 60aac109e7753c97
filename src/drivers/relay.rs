//! Compressor relay driver.
//!
//! Active-low relay module: the coil is energised while the pin is LOW.
//! The driver remembers the last commanded level and ignores repeats, so
//! calling [`RelayDriver::set`] every tick produces exactly one pin write
//! per real change.
//!
//! Generic over any `embedded-hal` output pin; on the device this is an
//! `esp-idf-hal` `PinDriver`.

use embedded_hal::digital::OutputPin;
use log::{error, info};

pub struct RelayDriver<P: OutputPin> {
    pin: P,
    /// `None` until the first successful write.
    energized: Option<bool>,
}

impl<P: OutputPin> RelayDriver<P> {
    pub fn new(pin: P) -> Self {
        Self {
            pin,
            energized: None,
        }
    }

    /// Drive the relay.  A repeat of the current level is a no-op.  A pin
    /// error leaves the remembered level unchanged so the next call retries.
    pub fn set(&mut self, energized: bool) {
        if self.energized == Some(energized) {
            return;
        }
        let result = if energized {
            self.pin.set_low()
        } else {
            self.pin.set_high()
        };
        match result {
            Ok(()) => {
                self.energized = Some(energized);
                info!("RELAY: {}", if energized { "energised" } else { "released" });
            }
            Err(e) => error!("RELAY: pin write failed: {e:?}"),
        }
    }
}
