//! Database repositories for data access layer
//
// Store contract used by the upload, counter and lifecycle services
pub mod store;
//
// Postgres implementation
pub mod video;
//
// In-memory implementation for tests
#[cfg(feature = "test-utils")]
pub mod memory;

pub use store::{ClaimOutcome, VideoDetails, VideoRecordStore};
pub use video::VideoRepository;
#[cfg(feature = "test-utils")]
pub use memory::InMemoryVideoStore;
