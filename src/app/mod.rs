//! Application core: pure domain logic, zero I/O.
//!
//! Contains the compressor supervision rules: duty-cycle orchestration,
//! safety interlocks, fill tracking, and persistence decisions.  All
//! interaction with hardware happens through **port traits** defined in
//! [`ports`], keeping this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
pub mod status;
