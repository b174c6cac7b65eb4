//! Vidvault Infrastructure Library
//!
//! Shared infrastructure components used by the API:
//! - Telemetry initialization
//! - In-process caches (upload authorization, view deduplication)

pub mod cache;
pub mod telemetry;

// Re-export commonly used types
pub use cache::{AuthorizationCache, ViewDedupeCache};
pub use telemetry::{init_telemetry, shutdown_telemetry, LogFormat};
