//! Upload, counter and lifecycle services used by the HTTP handlers

pub mod counters;
pub mod lifecycle;
pub mod upload;

pub use counters::{CounterOutcome, CounterService};
pub use lifecycle::VideoService;
pub use upload::{
    AuthorizationDecision, AuthorizationGate, CompletionRequest, CompletionRouter, PlacedFile,
    RejectReason,
};
