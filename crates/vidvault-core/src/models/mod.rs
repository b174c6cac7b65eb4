//! Data models for the application
//!
//! Each sub-module represents a specific feature area.

mod upload;
mod user;
mod video;

pub use upload::*;
pub use user::*;
pub use video::*;
