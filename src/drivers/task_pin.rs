//! Core-pinned thread spawning.
//!
//! ESP-IDF implements `std::thread` over pthreads, which are FreeRTOS
//! tasks underneath.  `esp_pthread_set_cfg()` configures the *next*
//! `pthread_create()` from the calling thread, so the config→spawn pair
//! must not interleave with other thread creation.  On the host the core
//! and priority are ignored.

use std::io;
use std::thread::JoinHandle;

/// CPU cores of the dual-core ESP32.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Core {
    /// PRO_CPU, where WiFi and lwIP run.
    Pro = 0,
    /// APP_CPU, the control loop.
    App = 1,
}

/// Thread placement for [`spawn_on_core`].
#[derive(Debug, Clone, Copy)]
pub struct TaskSpec {
    /// Null-terminated, e.g. `"push-io\0"`.
    pub name: &'static str,
    pub core: Core,
    pub priority: u8,
    pub stack_kb: usize,
}

impl TaskSpec {
    fn display_name(&self) -> &'static str {
        self.name.trim_end_matches('\0')
    }
}

#[cfg(target_os = "espidf")]
pub fn spawn_on_core(
    spec: TaskSpec,
    f: impl FnOnce() + Send + 'static,
) -> io::Result<JoinHandle<()>> {
    use esp_idf_svc::sys::{ESP_OK, esp_create_default_pthread_config, esp_pthread_set_cfg};

    // SAFETY: the config is copied by esp_pthread_set_cfg and applies only
    // to the next pthread_create from this thread, which follows directly.
    let ret = unsafe {
        let mut cfg = esp_create_default_pthread_config();
        cfg.pin_to_core = spec.core as i32;
        cfg.prio = i32::from(spec.priority);
        cfg.stack_size = (spec.stack_kb * 1024) as _;
        cfg.thread_name = spec.name.as_ptr().cast();
        esp_pthread_set_cfg(&cfg)
    };
    if ret != ESP_OK as i32 {
        return Err(io::Error::other(format!("esp_pthread_set_cfg failed: {ret}")));
    }

    log::info!(
        "task '{}' on {:?} (pri={}, stack={}KB)",
        spec.display_name(),
        spec.core,
        spec.priority,
        spec.stack_kb
    );
    std::thread::Builder::new()
        .name(spec.display_name().into())
        .spawn(f)
}

#[cfg(not(target_os = "espidf"))]
pub fn spawn_on_core(
    spec: TaskSpec,
    f: impl FnOnce() + Send + 'static,
) -> io::Result<JoinHandle<()>> {
    log::info!(
        "task '{}' (sim, unpinned, stack={}KB)",
        spec.display_name(),
        spec.stack_kb
    );
    std::thread::Builder::new()
        .name(spec.display_name().into())
        .stack_size(spec.stack_kb * 1024)
        .spawn(f)
}
