//! Actuator drivers, hardware initialisation, and peripheral helpers.

pub mod alarm;
pub mod buzzer;
pub mod hw_init;
pub mod task_pin;
pub mod watchdog;
