use uuid::Uuid;
use vidvault_api::auth::JwtSessionResolver;
use vidvault_core::UserIdentity;

/// Session secret shared by the test server and token helpers
pub const TEST_SESSION_SECRET: &str = "test-session-secret-at-least-32-characters-long";

pub struct TestUser {
    pub identity: UserIdentity,
    pub token: String,
}

impl TestUser {
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// New user with a one-hour session token
pub fn test_user() -> TestUser {
    let identity = UserIdentity::new(Uuid::new_v4());
    let token = JwtSessionResolver::new(TEST_SESSION_SECRET)
        .issue(identity, 3600)
        .expect("Failed to issue session token");
    TestUser { identity, token }
}
