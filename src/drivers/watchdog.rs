//! Task Watchdog Timer (TWDT) driver.
//!
//! Subscribes the control-loop task to the ESP-IDF TWDT.  If the loop stops
//! feeding it (a blocked sensor read or flash write inside a tick), the
//! chip panics and reboots with the relay released.
//!
//! [`crate::scheduler::ControlLoop`] feeds it after every poll.

#[cfg(not(target_os = "espidf"))]
use core::cell::Cell;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use log::info;

pub struct Watchdog {
    #[cfg(target_os = "espidf")]
    subscribed: bool,
    #[cfg(not(target_os = "espidf"))]
    feeds: Cell<u32>,
}

impl Watchdog {
    /// Reconfigure the TWDT to `timeout_ms` and subscribe the calling task.
    pub fn new(timeout_ms: u32) -> Self {
        #[cfg(target_os = "espidf")]
        {
            unsafe {
                let cfg = esp_task_wdt_config_t {
                    timeout_ms,
                    idle_core_mask: 0,
                    trigger_panic: true,
                };
                let ret = esp_task_wdt_reconfigure(&cfg);
                if ret != ESP_OK {
                    log::warn!("TWDT reconfigure returned {} (may already be configured)", ret);
                }

                let ret = esp_task_wdt_add(core::ptr::null_mut());
                let subscribed = ret == ESP_OK;
                if subscribed {
                    info!("Watchdog: subscribed ({} ms timeout, panic on trigger)", timeout_ms);
                } else {
                    log::warn!("Watchdog: failed to subscribe ({})", ret);
                }

                Self { subscribed }
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            info!("Watchdog(sim): {} ms timeout, not enforced", timeout_ms);
            Self {
                feeds: Cell::new(0),
            }
        }
    }

    /// Reset the countdown.  Must be called more often than the timeout.
    pub fn feed(&self) {
        #[cfg(target_os = "espidf")]
        {
            if self.subscribed {
                unsafe {
                    esp_task_wdt_reset();
                }
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            self.feeds.set(self.feeds.get().wrapping_add(1));
        }
    }

    /// Number of feeds so far (simulation only).
    #[cfg(not(target_os = "espidf"))]
    pub fn feeds(&self) -> u32 {
        self.feeds.get()
    }
}
