//! Compressor Supervisor Firmware: Main Entry Point
//!
//! Hexagonal architecture driven by a polling control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   LogEventSink   NvsAdapter   MonotonicClock  │
//! │  (Sensor+Relay)    (EventSink)    (Persistence) (ClockPort)    │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              Supervisor (pure logic)                   │    │
//! │  │  Duty-cycle FSM · Safety latch · Fill tracking         │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  ControlLoop (commands · tick · telemetry)                     │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{PinDriver, Pull};
use esp_idf_hal::peripherals::Peripherals;
use log::{error, info, warn};

use compressor::adapters::hardware::HardwareAdapter;
use compressor::adapters::log_sink::LogEventSink;
use compressor::adapters::nvs::NvsAdapter;
use compressor::adapters::time::MonotonicClock;
use compressor::app::commands::{CMD_CHANNEL, REPLY_CHANNEL};
use compressor::app::ports::ClockPort;
use compressor::app::service::Supervisor;
use compressor::config::LoopConfig;
use compressor::drivers::relay::RelayDriver;
use compressor::drivers::status_led::StatusLed;
use compressor::drivers::watchdog::Watchdog;
use compressor::pins;
use compressor::scheduler::ControlLoop;
use compressor::sensors::level_switch::LevelSwitch;
use compressor::sensors::temperature::TemperatureSensor;
use compressor::sensors::SensorHub;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Compressor supervisor v{}        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    if let Err(e) = compressor::drivers::hw_init::init_peripherals() {
        // Temperature reads will report a sensor fault, which keeps the
        // compressor off until the next reboot.
        error!("ADC init failed: {}", e);
    }

    // ── 2. GPIO ───────────────────────────────────────────────
    let peripherals = Peripherals::take()?;

    // Relay input is active-low: drive high before anything else.
    let mut relay_pin = PinDriver::output(peripherals.pins.gpio15)?;
    relay_pin.set_high()?;
    info!("Relay on GPIO{} (active low), de-energised", pins::RELAY_GPIO);

    let mut led_pin = PinDriver::output(peripherals.pins.gpio2)?;
    led_pin.set_low()?;
    info!("Status LED on GPIO{}", pins::STATUS_LED_GPIO);

    let mut tank_pin = PinDriver::input(peripherals.pins.gpio16)?;
    tank_pin.set_pull(Pull::Up)?;
    info!("Tank float switch on GPIO{} (LOW = full)", pins::TANK_FULL_GPIO);

    // ── 3. Persistence ────────────────────────────────────────
    let mut nvs = match NvsAdapter::new() {
        Ok(n) => n,
        Err(e) => {
            warn!("NVS init failed ({}), settings will not survive a reboot", e);
            NvsAdapter::volatile()
        }
    };

    // ── 4. Adapters + supervisor ──────────────────────────────
    let sensor_hub = SensorHub::new(
        TemperatureSensor::new(pins::TEMP_ADC_CHANNEL),
        LevelSwitch::new(tank_pin),
    );
    let mut hw = HardwareAdapter::new(
        sensor_hub,
        RelayDriver::new(relay_pin),
        StatusLed::new(led_pin),
    );
    let clock = MonotonicClock::new();
    let mut log_sink = LogEventSink::new();
    let timing = LoopConfig::default();

    let watchdog = Watchdog::new(timing.watchdog_timeout_ms);

    let mut supervisor = Supervisor::restore(&nvs, &timing, clock.now_ms());
    supervisor.start(&mut hw, &mut log_sink);
    watchdog.feed();

    let mut control =
        ControlLoop::new(timing, &CMD_CHANNEL, &REPLY_CHANNEL).with_watchdog(&watchdog);

    info!("System ready. Entering control loop.");

    // ── 5. Control loop (feeds the watchdog every pass) ───────
    loop {
        control.poll(&mut supervisor, &clock, &mut hw, &mut nvs, &mut log_sink);

        let wait_ms = control.ms_until_next_tick(clock.now_ms()).max(1);
        FreeRtos::delay_ms(wait_ms.min(u64::from(timing.tick_interval_ms)) as u32);
    }
}
