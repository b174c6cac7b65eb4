//! Per-chunk upload authorization.
//!
//! Decides whether an identity may keep writing to a video id. The authorization
//! cache answers repeat checks; on a miss a single atomic claim against the store
//! both creates the `Processing` row for a new id and reports ownership of an
//! existing one. Only admissions are cached.

use std::sync::Arc;
use uuid::Uuid;
use vidvault_core::{AppError, UserIdentity};
use vidvault_db::{ClaimOutcome, VideoRecordStore};
use vidvault_infra::AuthorizationCache;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The request carries no valid session
    NoSession,
    /// The claimed video id is not a UUID
    InvalidVideoId,
    /// The video belongs to someone else
    NotOwner,
    /// The store could not be consulted; the check may be retried
    StoreUnavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationDecision {
    Admit,
    Reject(RejectReason),
}

impl AuthorizationDecision {
    pub fn is_admitted(self) -> bool {
        matches!(self, AuthorizationDecision::Admit)
    }

    /// Convert into a `Result` for handlers
    pub fn into_result(self) -> Result<(), AppError> {
        match self {
            AuthorizationDecision::Admit => Ok(()),
            AuthorizationDecision::Reject(reason) => Err(reason.into()),
        }
    }
}

impl From<RejectReason> for AppError {
    fn from(reason: RejectReason) -> Self {
        match reason {
            RejectReason::NoSession => AppError::Unauthorized("Sign-in required".to_string()),
            RejectReason::InvalidVideoId => {
                AppError::InvalidInput("Video id must be a UUID".to_string())
            }
            RejectReason::NotOwner => {
                AppError::Unauthorized("Video belongs to another user".to_string())
            }
            RejectReason::StoreUnavailable => AppError::ServiceUnavailable(
                "Upload authorization is temporarily unavailable".to_string(),
            ),
        }
    }
}

#[derive(Clone)]
pub struct AuthorizationGate {
    cache: AuthorizationCache,
    store: Arc<dyn VideoRecordStore>,
}

impl AuthorizationGate {
    pub fn new(cache: AuthorizationCache, store: Arc<dyn VideoRecordStore>) -> Self {
        Self { cache, store }
    }

    pub fn cache(&self) -> &AuthorizationCache {
        &self.cache
    }

    /// Check one inbound chunk or file. `transfer_id` is used for diagnostics only.
    pub async fn authorize(
        &self,
        video_id: &str,
        transfer_id: &str,
        identity: Option<UserIdentity>,
    ) -> AuthorizationDecision {
        let Some(identity) = identity else {
            tracing::debug!(video_id = %video_id, transfer_id = %transfer_id, "Upload rejected: no session");
            return AuthorizationDecision::Reject(RejectReason::NoSession);
        };

        let Ok(id) = Uuid::parse_str(video_id) else {
            tracing::debug!(video_id = %video_id, transfer_id = %transfer_id, "Upload rejected: malformed video id");
            return AuthorizationDecision::Reject(RejectReason::InvalidVideoId);
        };

        if let Some(cached) = self.cache.get(&id) {
            if cached == identity {
                return AuthorizationDecision::Admit;
            }
            tracing::warn!(
                video_id = %id,
                transfer_id = %transfer_id,
                user_id = %identity,
                "Upload rejected: video claimed by another user"
            );
            return AuthorizationDecision::Reject(RejectReason::NotOwner);
        }

        match self.store.claim(id, identity.id()).await {
            Ok(ClaimOutcome::OwnedByOther) => {
                tracing::warn!(
                    video_id = %id,
                    transfer_id = %transfer_id,
                    user_id = %identity,
                    "Upload rejected: video owned by another user"
                );
                AuthorizationDecision::Reject(RejectReason::NotOwner)
            }
            Ok(outcome) => {
                self.cache.put(id, identity);
                tracing::debug!(
                    video_id = %id,
                    transfer_id = %transfer_id,
                    user_id = %identity,
                    outcome = ?outcome,
                    "Upload admitted"
                );
                AuthorizationDecision::Admit
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    video_id = %id,
                    transfer_id = %transfer_id,
                    "Upload rejected: authorization store unavailable"
                );
                AuthorizationDecision::Reject(RejectReason::StoreUnavailable)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use vidvault_core::VideoPrivacy;
    use vidvault_db::InMemoryVideoStore;

    const TRANSFER: &str = "transfer-1";

    fn gate() -> (AuthorizationGate, InMemoryVideoStore) {
        let store = InMemoryVideoStore::new();
        let gate = AuthorizationGate::new(
            AuthorizationCache::new(1_000, Duration::from_secs(600)),
            Arc::new(store.clone()),
        );
        (gate, store)
    }

    fn user() -> UserIdentity {
        UserIdentity::new(Uuid::new_v4())
    }

    #[tokio::test]
    async fn test_no_session_is_rejected() {
        let (gate, store) = gate();
        let decision = gate
            .authorize(&Uuid::new_v4().to_string(), TRANSFER, None)
            .await;
        assert_eq!(decision, AuthorizationDecision::Reject(RejectReason::NoSession));
        assert_eq!(store.claim_calls(), 0);
    }

    #[tokio::test]
    async fn test_malformed_id_never_reaches_store() {
        let (gate, store) = gate();
        let decision = gate.authorize("not-a-uuid", TRANSFER, Some(user())).await;
        assert_eq!(
            decision,
            AuthorizationDecision::Reject(RejectReason::InvalidVideoId)
        );
        assert_eq!(store.claim_calls(), 0);
    }

    #[tokio::test]
    async fn test_first_chunk_creates_processing_row() {
        let (gate, store) = gate();
        let owner = user();
        let id = Uuid::new_v4();

        assert!(gate.authorize(&id.to_string(), TRANSFER, Some(owner)).await.is_admitted());

        let video = store.snapshot(id).unwrap();
        assert_eq!(video.owner_id, owner.id());
        assert_eq!(video.privacy, VideoPrivacy::Processing);
        assert_eq!(gate.cache().get(&id), Some(owner));
    }

    #[tokio::test]
    async fn test_cached_admission_skips_store() {
        let (gate, store) = gate();
        let owner = user();
        let id = Uuid::new_v4().to_string();

        for _ in 0..5 {
            assert!(gate.authorize(&id, TRANSFER, Some(owner)).await.is_admitted());
        }
        assert_eq!(store.claim_calls(), 1);
    }

    #[tokio::test]
    async fn test_other_identity_is_rejected() {
        let (gate, store) = gate();
        let id = Uuid::new_v4().to_string();
        gate.authorize(&id, TRANSFER, Some(user())).await;

        // Cache hit with a different identity
        let decision = gate.authorize(&id, TRANSFER, Some(user())).await;
        assert_eq!(decision, AuthorizationDecision::Reject(RejectReason::NotOwner));
        assert_eq!(store.claim_calls(), 1);

        // Cache miss against an existing row owned by someone else
        gate.cache().invalidate(&Uuid::parse_str(&id).unwrap());
        let decision = gate.authorize(&id, TRANSFER, Some(user())).await;
        assert_eq!(decision, AuthorizationDecision::Reject(RejectReason::NotOwner));
        assert!(gate.cache().get(&Uuid::parse_str(&id).unwrap()).is_none());
    }

    #[tokio::test]
    async fn test_store_failure_rejects_without_caching() {
        let (gate, store) = gate();
        let owner = user();
        let id = Uuid::new_v4();

        store.set_failing(true);
        let decision = gate.authorize(&id.to_string(), TRANSFER, Some(owner)).await;
        assert_eq!(
            decision,
            AuthorizationDecision::Reject(RejectReason::StoreUnavailable)
        );
        assert!(gate.cache().get(&id).is_none());
        assert!(matches!(
            decision.into_result(),
            Err(AppError::ServiceUnavailable(_))
        ));

        store.set_failing(false);
        assert!(gate.authorize(&id.to_string(), TRANSFER, Some(owner)).await.is_admitted());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_chunks_converge() {
        let (gate, store) = gate();
        let owner = user();
        let id = Uuid::new_v4().to_string();

        let attempts: Vec<_> = (0..16)
            .map(|_| {
                let gate = gate.clone();
                let id = id.clone();
                tokio::spawn(async move { gate.authorize(&id, TRANSFER, Some(owner)).await })
            })
            .collect();
        for handle in attempts {
            assert!(handle.await.unwrap().is_admitted());
        }

        assert_eq!(store.len(), 1);
        let video = store.snapshot(Uuid::parse_str(&id).unwrap()).unwrap();
        assert_eq!(video.owner_id, owner.id());
        assert_eq!(video.privacy, VideoPrivacy::Processing);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_two_owners_racing_for_new_id_admit_one() {
        for _ in 0..50 {
            let (gate, store) = gate();
            let id = Uuid::new_v4();

            let contenders: Vec<_> = [user(), user()]
                .into_iter()
                .map(|identity| {
                    let gate = gate.clone();
                    let id = id.to_string();
                    tokio::spawn(async move {
                        (identity, gate.authorize(&id, TRANSFER, Some(identity)).await)
                    })
                })
                .collect();

            let mut admitted = Vec::new();
            let mut refused = 0;
            for handle in contenders {
                match handle.await.unwrap() {
                    (identity, AuthorizationDecision::Admit) => admitted.push(identity),
                    (_, AuthorizationDecision::Reject(RejectReason::NotOwner)) => refused += 1,
                    (_, other) => panic!("unexpected decision {:?}", other),
                }
            }

            assert_eq!(admitted.len(), 1);
            assert_eq!(refused, 1);
            assert_eq!(store.len(), 1);
            assert_eq!(store.snapshot(id).unwrap().owner_id, admitted[0].id());
            assert_eq!(gate.cache().get(&id), Some(admitted[0]));
        }
    }
}
