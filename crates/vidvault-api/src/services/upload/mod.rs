//! Upload pipeline: per-chunk authorization and completed-file placement

pub mod authorization;
pub mod completion;

pub use authorization::{AuthorizationDecision, AuthorizationGate, RejectReason};
pub use completion::{CompletionRequest, CompletionRouter, PlacedFile};
