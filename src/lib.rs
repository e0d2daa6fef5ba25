//! HazardWatch firmware library.
//!
//! Exposes the pure-logic modules for integration testing. All
//! ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module; on the host the drivers fall back to simulation.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod fsm;
pub mod hazard;
pub mod pins;
pub mod sensors;
pub mod sync;
pub mod timer;
