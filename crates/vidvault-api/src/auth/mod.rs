//! Session resolution and request identity

pub mod middleware;
pub mod models;
pub mod session;

pub use middleware::{session_middleware, SessionState};
pub use models::{CurrentUser, SessionClaims, SessionContext};
pub use session::{JwtSessionResolver, SessionResolver};
