//! Active buzzer output.
//!
//! Writes the GPIO only when the requested level differs from the last
//! one written, so the alarm pattern can call `set()` every tick.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives `pins::BUZZER_GPIO` via hw_init.
//! On host/test: tracks state in-memory only.

use log::debug;

pub struct Buzzer {
    gpio: i32,
    on: bool,
    writes: u32,
}

impl Buzzer {
    pub fn new(gpio: i32) -> Self {
        Self {
            gpio,
            on: false,
            writes: 0,
        }
    }

    pub fn set(&mut self, on: bool) {
        if on == self.on {
            return;
        }
        self.write_hw(on);
        self.on = on;
        self.writes = self.writes.wrapping_add(1);
        debug!("buzzer {}", if on { "ON" } else { "OFF" });
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Level changes written to the pin since boot.
    pub fn writes(&self) -> u32 {
        self.writes
    }

    #[cfg(target_os = "espidf")]
    fn write_hw(&self, on: bool) {
        crate::drivers::hw_init::gpio_write(self.gpio, on);
    }

    #[cfg(not(target_os = "espidf"))]
    fn write_hw(&self, _on: bool) {
        let _ = self.gpio;
    }
}
