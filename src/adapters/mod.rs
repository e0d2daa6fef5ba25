//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements              | Connects to                |
//! |------------|-------------------------|----------------------------|
//! | `hardware` | SensorPort, AlarmPort   | ESP32 ADC, DHT22, buzzer   |
//! | `log_sink` | EventSink               | Serial log output          |
//! | `nvs`      | ConfigPort              | NVS / in-memory store      |
//! | `push_task`| (thread)                | Outbox → RemotePort        |
//! | `remote`   | RemotePort              | HTTPS document store       |
//! | `time`     | ClockPort               | esp_timer + SNTP           |
//! | `wifi`     | ConnectivityPort        | ESP-IDF WiFi STA           |

pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod push_task;
pub mod remote;
pub mod time;
pub mod wifi;
