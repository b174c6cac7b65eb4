//! Tracing initialization
//!
//! Console output is compact by default; `LOG_FORMAT=json` switches to one JSON object
//! per event for log shippers. Filtering follows `RUST_LOG`.

mod init_basic;

pub use init_basic::{init_telemetry, shutdown_telemetry, LogFormat};
