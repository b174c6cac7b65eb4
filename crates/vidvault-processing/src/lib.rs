//! Vidvault media processing
//!
//! Post-placement processing of uploaded videos. Currently: thumbnail extraction.

pub mod thumbnail;

pub use thumbnail::{FfmpegThumbnailExtractor, NoopThumbnailExtractor, ThumbnailExtractor};
