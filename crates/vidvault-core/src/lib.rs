//! Vidvault Core Library
//!
//! This crate provides core domain models, error types, configuration, and validation
//! that are shared across all Vidvault components.

pub mod config;
pub mod error;
pub mod metadata;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use metadata::{parse_video_metadata, VideoMetadata};
pub use models::{UploadFileKind, UserIdentity, Video, VideoPrivacy};
