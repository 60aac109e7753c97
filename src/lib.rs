//! Compressor supervisor firmware library.
//!
//! Exposes the pure-logic modules for integration testing and host-side
//! simulation. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod fill;
pub mod fsm;
pub mod history;
pub mod persistence;
pub mod safety;
pub mod scheduler;

pub mod pins;

// Hardware-facing modules compile on the host too; the device-only parts
// are guarded by cfg attributes inside.
pub mod adapters;
pub mod drivers;
pub mod sensors;
