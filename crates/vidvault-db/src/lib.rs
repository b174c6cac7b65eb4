//! Vidvault database layer
//!
//! The `VideoRecordStore` trait is the contract the upload services rely on;
//! `VideoRepository` implements it on Postgres.

pub mod db;

pub use db::{ClaimOutcome, VideoDetails, VideoRecordStore, VideoRepository};
#[cfg(feature = "test-utils")]
pub use db::InMemoryVideoStore;
