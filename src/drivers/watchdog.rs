//! Task Watchdog Timer (TWDT) driver.
//!
//! Resets the device if the main loop stops feeding it for longer than
//! the configured timeout.  The HTTP request timeout is validated to be
//! shorter than this, so a hung push cannot starve the watchdog on its own.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use log::{info, warn};

pub struct Watchdog {
    timeout_ms: u32,
    #[cfg(target_os = "espidf")]
    subscribed: bool,
    feeds: u32,
}

impl Watchdog {
    /// Initialise and subscribe the current task to the TWDT.
    pub fn new(timeout_ms: u32) -> Self {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: plain FFI configuration calls from the main task.
            unsafe {
                let cfg = esp_task_wdt_config_t {
                    timeout_ms,
                    idle_core_mask: 0,
                    trigger_panic: true,
                };
                let ret = esp_task_wdt_reconfigure(&cfg);
                if ret != ESP_OK {
                    warn!("TWDT reconfigure returned {} (may already be configured)", ret);
                }

                let ret = esp_task_wdt_add(core::ptr::null_mut());
                let subscribed = ret == ESP_OK;
                if subscribed {
                    info!("Watchdog: subscribed ({} ms timeout, panic on trigger)", timeout_ms);
                } else {
                    warn!("Watchdog: failed to subscribe ({})", ret);
                }

                Self {
                    timeout_ms,
                    subscribed,
                    feeds: 0,
                }
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            if timeout_ms == 0 {
                warn!("Watchdog(sim): zero timeout");
            }
            info!("Watchdog(sim): no-op ({} ms)", timeout_ms);
            Self {
                timeout_ms,
                feeds: 0,
            }
        }
    }

    /// Feed the watchdog.  Must be called at least once per timeout.
    pub fn feed(&mut self) {
        self.feeds = self.feeds.wrapping_add(1);
        #[cfg(target_os = "espidf")]
        {
            if self.subscribed {
                // SAFETY: resets the calling task's TWDT entry.
                unsafe {
                    esp_task_wdt_reset();
                }
            }
        }
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    pub fn feeds(&self) -> u32 {
        self.feeds
    }
}
