//! API path constants

/// Prefix shared by every versioned route
pub const API_PREFIX: &str = "/api/v0";

/// Resumable-transfer header carrying the byte offset of a chunk
pub const UPLOAD_OFFSET_HEADER: &str = "upload-offset";

/// Cookie holding the session token when no Authorization header is sent
pub const SESSION_COOKIE: &str = "session";
