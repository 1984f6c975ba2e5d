//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements   | Connects to               |
//! |----------------|--------------|---------------------------|
//! | `config_store` | ConfigPort   | any StoragePort           |
//! | `log_sink`     | EventSink    | Serial log output         |
//! | `memory`       | StoragePort  | HashMap (host, tests)     |
//! | `nvs`          | StoragePort  | ESP-IDF NVS partition     |
//! | `time`         | ClockPort    | RTC wall time + esp_timer |

pub mod config_store;
pub mod log_sink;
pub mod memory;
#[cfg(feature = "espidf")]
pub mod nvs;
pub mod time;
