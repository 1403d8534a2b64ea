//! Resolved user identity.

use gamesync_types::{UserId, UserProfile};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{info, warn};

use crate::error::SyncError;
use crate::source::{AuthSink, LibrarySource};

/// Holds the profile once authentication succeeds. Import entry points
/// consult it before doing any work.
#[derive(Default)]
pub struct Session {
    profile: RwLock<Option<UserProfile>>,
    auth_sink: Option<Arc<dyn AuthSink>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_auth_sink(auth_sink: Arc<dyn AuthSink>) -> Self {
        Self {
            profile: RwLock::new(None),
            auth_sink: Some(auth_sink),
        }
    }

    /// Resolve the profile through the backend and remember it.
    pub async fn authenticate(&self, source: &dyn LibrarySource) -> Result<UserProfile, SyncError> {
        let profile = source.profile().await?;
        info!(user_id = %profile.user_id, login = %profile.login, "Authenticated");
        self.set_profile(profile.clone());
        Ok(profile)
    }

    pub fn set_profile(&self, profile: UserProfile) {
        *self.profile.write().unwrap_or_else(PoisonError::into_inner) = Some(profile);
    }

    pub fn profile(&self) -> Option<UserProfile> {
        self.profile
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// User id, or `NotAuthenticated` if identity was never resolved.
    pub fn user_id(&self) -> Result<UserId, SyncError> {
        self.profile()
            .map(|p| p.user_id)
            .ok_or(SyncError::NotAuthenticated)
    }

    pub fn is_authenticated(&self) -> bool {
        self.profile().is_some()
    }

    /// Drop the identity and tell the host it must re-authenticate.
    pub fn lose_authentication(&self) {
        let previous = self
            .profile
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if previous.is_none() {
            return;
        }
        warn!("Backend session lost, re-authentication required");
        if let Some(sink) = &self.auth_sink {
            sink.authentication_lost();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingAuthSink(AtomicUsize);

    impl AuthSink for CountingAuthSink {
        fn authentication_lost(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn profile() -> UserProfile {
        UserProfile {
            user_id: UserId::new("76561197960287930"),
            login: "gaben".to_string(),
        }
    }

    #[test]
    fn test_unauthenticated_by_default() {
        let session = Session::new();
        assert_eq!(session.user_id(), Err(SyncError::NotAuthenticated));
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_lose_authentication_notifies_once() {
        let sink = Arc::new(CountingAuthSink::default());
        let session = Session::with_auth_sink(sink.clone());
        session.set_profile(profile());
        assert_eq!(session.user_id().unwrap().as_str(), "76561197960287930");

        session.lose_authentication();
        session.lose_authentication();

        assert_eq!(sink.0.load(Ordering::SeqCst), 1);
        assert_eq!(session.user_id(), Err(SyncError::NotAuthenticated));
    }
}
