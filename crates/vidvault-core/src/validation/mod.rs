//! Validation modules

pub mod filename;

pub use filename::{validate_final_filename, MAX_FILENAME_LENGTH};
