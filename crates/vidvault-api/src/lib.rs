//! Vidvault API Library
//!
//! This crate provides the HTTP API handlers, upload services, middleware, and application setup.

mod api_doc;
pub mod auth;
pub mod constants;
pub mod error;
pub mod handlers;
pub mod services;
pub mod setup;
pub mod state;
mod utils;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
