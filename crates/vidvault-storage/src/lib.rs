//! Vidvault Storage Library
//!
//! This crate provides the staging store for in-flight transfers and the on-disk
//! layout of placed media.
//!
//! # Layout
//!
//! - `<media_root>/<video_id>/<file>` for video, meta, tags and chapters files
//! - `<media_root>/<video_id>/extra/<file>`
//! - `<media_root>/<video_id>/areaMiniatures/<file>`
//! - `<media_root>/<video_id>/thumb.jpg`
//!
//! Destination paths are computed only in the `layout` module.

pub mod layout;
pub mod local;
pub mod traits;

// Re-export commonly used types
pub use layout::{MediaLayout, EXTRA_DIR, MINIATURES_DIR, THUMBNAIL_FILE};
pub use local::LocalStagingStore;
pub use traits::{StagingStore, StorageError, StorageResult};
