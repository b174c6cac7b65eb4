//! Process-wide caches. Both are created once at startup with their windows injected
//! from configuration and are never persisted.

mod authorization;
mod view_dedupe;

pub use authorization::AuthorizationCache;
pub use view_dedupe::ViewDedupeCache;
