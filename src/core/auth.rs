use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use tracing::{info, warn};

use crate::core::identity::IdentityProvider;
use crate::error::IdentityError;
use crate::storage::SharedStore;

pub const USER_KEY: &str = "familia_user";
pub const AUTH_TOKEN_KEY: &str = "familia_auth_token";

const LOAD_ERROR: &str = "Could not load saved sign-in.";
const SAVE_ERROR: &str = "Could not save sign-in data.";
const LOGIN_ERROR: &str = "Sign-in failed. Please try again.";

// ── Records ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthMarker {
    pub token: String,
    pub issued_at: DateTime<Utc>,
}

impl AuthMarker {
    pub fn issue(user: &User, issued_at: DateTime<Utc>) -> Self {
        let mut h = Sha256::new();
        h.update(user.id.as_bytes());
        h.update(issued_at.to_rfc3339().as_bytes());
        Self {
            token: hex::encode(h.finalize()),
            issued_at,
        }
    }
}

// ── Capability ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Unknown,
    Anonymous,
    Authenticated,
}

/// What the UI sees of the session, whether or not one is configured.
pub trait SessionHandle {
    fn user(&self) -> Option<&User>;
    fn is_loading(&self) -> bool;
    fn error(&self) -> Option<&str>;
    fn is_settings_open(&self) -> bool;
    fn login(&mut self) -> Option<LoginAttempt>;
    fn logout(&mut self);
    fn open_settings(&mut self);
    fn close_settings(&mut self);

    fn is_authenticated(&self) -> bool {
        self.user().is_some()
    }
}

/// Stand-in used when no session manager was composed. Reads report an
/// anonymous, idle session; writes do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct InertSession;

impl SessionHandle for InertSession {
    fn user(&self) -> Option<&User> {
        None
    }

    fn is_loading(&self) -> bool {
        false
    }

    fn error(&self) -> Option<&str> {
        None
    }

    fn is_settings_open(&self) -> bool {
        false
    }

    fn login(&mut self) -> Option<LoginAttempt> {
        warn!("login requested but no session is configured");
        None
    }

    fn logout(&mut self) {
        warn!("logout requested but no session is configured");
    }

    fn open_settings(&mut self) {
        warn!("settings requested but no session is configured");
    }

    fn close_settings(&mut self) {}
}

// ── Session manager ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoginAttempt(pub u64);

struct LoginCompletion {
    attempt: LoginAttempt,
    result: Result<User, IdentityError>,
}

pub struct SessionManager {
    store: SharedStore,
    provider: Arc<dyn IdentityProvider>,
    user: Option<User>,
    checked: bool,
    loading: bool,
    error: Option<String>,
    settings_open: bool,
    next_attempt: u64,
    pending: usize,
    tx: Sender<LoginCompletion>,
    rx: Receiver<LoginCompletion>,
}

impl SessionManager {
    /// Starts in the unknown phase with `loading` set, until
    /// [`check_session`](Self::check_session) runs.
    pub fn new(store: SharedStore, provider: Arc<dyn IdentityProvider>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            store,
            provider,
            user: None,
            checked: false,
            loading: true,
            error: None,
            settings_open: false,
            next_attempt: 0,
            pending: 0,
            tx,
            rx,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        match (&self.user, self.checked) {
            (Some(_), _) => SessionPhase::Authenticated,
            (None, true) => SessionPhase::Anonymous,
            (None, false) => SessionPhase::Unknown,
        }
    }

    pub fn pending_logins(&self) -> usize {
        self.pending
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Restores a saved session. A corrupt or unreadable record leaves the
    /// session anonymous with an error set.
    pub fn check_session(&mut self) {
        self.loading = true;
        match self.store.get(USER_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<User>(&raw) {
                Ok(user) => {
                    info!(user = %user.id, "restored saved session");
                    self.user = Some(user);
                }
                Err(err) => {
                    warn!(%err, "saved session is malformed");
                    self.error = Some(LOAD_ERROR.to_string());
                }
            },
            Ok(None) => {}
            Err(err) => {
                warn!(%err, "could not read saved session");
                self.error = Some(LOAD_ERROR.to_string());
            }
        }
        self.checked = true;
        self.loading = false;
    }

    /// Starts an identity exchange on a worker thread. The result is applied
    /// by [`pump`](Self::pump) or [`wait_for_logins`](Self::wait_for_logins).
    pub fn begin_login(&mut self) -> LoginAttempt {
        self.loading = true;
        self.error = None;
        self.next_attempt += 1;
        self.pending += 1;
        let attempt = LoginAttempt(self.next_attempt);
        let provider = Arc::clone(&self.provider);
        let tx = self.tx.clone();
        info!(attempt = attempt.0, provider = provider.name(), "login started");
        std::thread::spawn(move || {
            let result = catch_unwind(AssertUnwindSafe(|| provider.exchange()))
                .unwrap_or(Err(IdentityError::Panicked));
            let _ = tx.send(LoginCompletion { attempt, result });
        });
        attempt
    }

    /// Applies every login completion that has already arrived. Returns how
    /// many were applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(done) = self.rx.try_recv() {
            self.complete_login(done);
            applied += 1;
        }
        applied
    }

    /// Blocks until every in-flight login has completed, applying each in
    /// arrival order.
    pub fn wait_for_logins(&mut self) {
        while self.pending > 0 {
            match self.rx.recv() {
                Ok(done) => self.complete_login(done),
                Err(_) => break,
            }
        }
    }

    fn complete_login(&mut self, done: LoginCompletion) {
        self.pending = self.pending.saturating_sub(1);
        match done.result {
            Ok(user) => match self.persist(&user) {
                Ok(()) => {
                    info!(attempt = done.attempt.0, user = %user.id, "login succeeded");
                    self.user = Some(user);
                }
                Err(err) => {
                    warn!(attempt = done.attempt.0, %err, "could not persist session");
                    self.discard_persisted();
                    self.user = None;
                    self.error = Some(SAVE_ERROR.to_string());
                }
            },
            Err(err) => {
                warn!(attempt = done.attempt.0, %err, "login failed");
                self.user = None;
                self.error = Some(LOGIN_ERROR.to_string());
            }
        }
        self.checked = true;
        self.loading = false;
    }

    fn persist(&self, user: &User) -> Result<(), crate::error::StorageError> {
        let marker = AuthMarker::issue(user, Utc::now());
        self.store.set(USER_KEY, &serde_json::to_string(user)?)?;
        self.store.set(AUTH_TOKEN_KEY, &serde_json::to_string(&marker)?)?;
        Ok(())
    }

    fn discard_persisted(&self) {
        for key in [USER_KEY, AUTH_TOKEN_KEY] {
            if let Err(err) = self.store.remove(key) {
                warn!(key, %err, "could not remove stored session key");
            }
        }
    }
}

impl SessionHandle for SessionManager {
    fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    fn is_loading(&self) -> bool {
        self.loading
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn is_settings_open(&self) -> bool {
        self.settings_open
    }

    fn login(&mut self) -> Option<LoginAttempt> {
        Some(self.begin_login())
    }

    fn logout(&mut self) {
        if let Some(user) = self.user.take() {
            info!(user = %user.id, "logged out");
        }
        self.discard_persisted();
        self.checked = true;
        self.settings_open = false;
    }

    fn open_settings(&mut self) {
        self.settings_open = true;
    }

    fn close_settings(&mut self) {
        self.settings_open = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identity::MockIdentityProvider;
    use crate::storage::{KeyValueStore, MemoryStore};
    use std::sync::Mutex;
    use std::time::Duration;

    fn instant_provider() -> Arc<dyn IdentityProvider> {
        Arc::new(MockIdentityProvider::new(Duration::ZERO))
    }

    fn manager(store: &SharedStore) -> SessionManager {
        let mut m = SessionManager::new(Arc::clone(store), instant_provider());
        m.check_session();
        m
    }

    /// Hands out scripted users with per-call delays, in call order.
    struct Scripted {
        script: Mutex<Vec<(Duration, &'static str)>>,
    }

    impl IdentityProvider for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        fn exchange(&self) -> Result<User, IdentityError> {
            let (delay, id) = self
                .script
                .lock()
                .map_err(|_| IdentityError::Exchange("poisoned".into()))?
                .remove(0);
            std::thread::sleep(delay);
            let mut user = MockIdentityProvider::demo_user();
            user.id = id.to_string();
            Ok(user)
        }
    }

    struct Failing;

    impl IdentityProvider for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn exchange(&self) -> Result<User, IdentityError> {
            Err(IdentityError::Exchange("denied".into()))
        }
    }

    struct Panicking;

    impl IdentityProvider for Panicking {
        fn name(&self) -> &str {
            "panicking"
        }

        fn exchange(&self) -> Result<User, IdentityError> {
            panic!("provider blew up")
        }
    }

    #[test]
    fn new_manager_is_loading_until_checked() {
        let store = MemoryStore::new().shared();
        let mut m = SessionManager::new(Arc::clone(&store), instant_provider());
        assert_eq!(m.phase(), SessionPhase::Unknown);
        assert!(m.is_loading());
        m.check_session();
        assert_eq!(m.phase(), SessionPhase::Anonymous);
        assert!(!m.is_loading());
        assert!(m.error().is_none());
    }

    #[test]
    fn login_authenticates_and_persists_user_and_marker() {
        let store = MemoryStore::new().shared();
        let mut m = manager(&store);
        m.login();
        assert!(m.is_loading());
        m.wait_for_logins();
        assert!(m.is_authenticated());
        assert!(!m.is_loading());
        assert_eq!(m.phase(), SessionPhase::Authenticated);

        let raw = store.get(USER_KEY).unwrap().unwrap();
        assert!(raw.contains("\"familyName\""));
        let marker: AuthMarker =
            serde_json::from_str(&store.get(AUTH_TOKEN_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(marker.token.len(), 64);
    }

    #[test]
    fn saved_session_is_restored_on_reload() {
        let store = MemoryStore::new().shared();
        let mut first = manager(&store);
        first.login();
        first.wait_for_logins();

        let reloaded = manager(&store);
        assert_eq!(reloaded.user(), Some(&MockIdentityProvider::demo_user()));
    }

    #[test]
    fn logout_clears_user_storage_and_settings_flag() {
        let store = MemoryStore::new().shared();
        let mut m = manager(&store);
        m.login();
        m.wait_for_logins();
        m.open_settings();
        m.logout();
        assert!(!m.is_authenticated());
        assert!(!m.is_settings_open());
        assert_eq!(store.get(AUTH_TOKEN_KEY).unwrap(), None);

        let reloaded = manager(&store);
        assert!(reloaded.user().is_none());
    }

    #[test]
    fn logout_without_session_is_harmless() {
        let store = MemoryStore::new().shared();
        let mut m = manager(&store);
        m.logout();
        m.logout();
        assert_eq!(m.phase(), SessionPhase::Anonymous);
        assert!(m.error().is_none());
    }

    #[test]
    fn corrupt_saved_session_sets_error_and_stays_anonymous() {
        let store = MemoryStore::new().shared();
        store.set(USER_KEY, "{ not json").unwrap();
        let m = manager(&store);
        assert!(m.user().is_none());
        assert_eq!(m.error(), Some(LOAD_ERROR));
        assert!(!m.is_loading());
    }

    #[test]
    fn persistence_failure_never_leaves_a_half_set_session() {
        // Room for the user record but not for the marker as well.
        let probe = serde_json::to_string(&MockIdentityProvider::demo_user()).unwrap();
        let store = MemoryStore::with_quota(USER_KEY.len() + probe.len() + 8).shared();
        let mut m = manager(&store);
        m.login();
        m.wait_for_logins();
        assert!(!m.is_authenticated());
        assert_eq!(m.error(), Some(SAVE_ERROR));
        assert!(!m.is_loading());
        assert_eq!(store.get(USER_KEY).unwrap(), None);
        assert_eq!(store.get(AUTH_TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn exchange_failure_reports_error() {
        let store = MemoryStore::new().shared();
        let mut m = SessionManager::new(Arc::clone(&store), Arc::new(Failing));
        m.check_session();
        m.login();
        m.wait_for_logins();
        assert_eq!(m.phase(), SessionPhase::Anonymous);
        assert_eq!(m.error(), Some(LOGIN_ERROR));
        assert!(!m.is_loading());
    }

    #[test]
    fn panicking_provider_is_reported_as_a_failed_login() {
        let store = MemoryStore::new().shared();
        let mut m = SessionManager::new(Arc::clone(&store), Arc::new(Panicking));
        m.check_session();
        m.login();
        m.wait_for_logins();
        assert_eq!(m.error(), Some(LOGIN_ERROR));
        assert_eq!(m.pending_logins(), 0);
    }

    #[test]
    fn next_login_clears_previous_error() {
        let store = MemoryStore::new().shared();
        store.set(USER_KEY, "garbage").unwrap();
        let mut m = manager(&store);
        assert!(m.error().is_some());
        m.login();
        assert!(m.error().is_none());
        m.wait_for_logins();
        assert!(m.is_authenticated());
    }

    #[test]
    fn overlapping_logins_resolve_to_the_last_completion() {
        let store = MemoryStore::new().shared();
        let provider = Arc::new(Scripted {
            script: Mutex::new(vec![
                (Duration::from_millis(150), "slow"),
                (Duration::from_millis(0), "fast"),
            ]),
        });
        let mut m = SessionManager::new(Arc::clone(&store), provider);
        m.check_session();

        let first = m.begin_login();
        // Make sure the first worker has taken its script entry.
        std::thread::sleep(Duration::from_millis(50));
        let second = m.begin_login();
        assert!(second > first);
        assert_eq!(m.pending_logins(), 2);

        m.wait_for_logins();
        assert!(m.is_authenticated());
        assert_eq!(m.user().map(|u| u.id.as_str()), Some("slow"));
        let stored: User = serde_json::from_str(&store.get(USER_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(stored.id, "slow");
    }

    #[test]
    fn pump_is_non_blocking() {
        let store = MemoryStore::new().shared();
        let mut m = SessionManager::new(
            Arc::clone(&store),
            Arc::new(MockIdentityProvider::new(Duration::from_millis(200))),
        );
        m.check_session();
        m.login();
        assert_eq!(m.pump(), 0);
        assert!(m.is_loading());
        m.wait_for_logins();
        assert!(m.is_authenticated());
    }

    #[test]
    fn settings_flag_toggles_without_side_effects() {
        let store = MemoryStore::new().shared();
        let mut m = manager(&store);
        m.open_settings();
        assert!(m.is_settings_open());
        assert!(!m.is_authenticated());
        m.close_settings();
        assert!(!m.is_settings_open());
    }

    #[test]
    fn inert_session_reports_defaults_and_ignores_calls() {
        let mut inert = InertSession;
        assert!(inert.login().is_none());
        inert.open_settings();
        inert.logout();
        assert!(!inert.is_authenticated());
        assert!(!inert.is_loading());
        assert!(!inert.is_settings_open());
        assert!(inert.error().is_none());
    }

    #[test]
    fn marker_token_depends_on_issue_time() {
        let user = MockIdentityProvider::demo_user();
        let t0 = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let t1 = DateTime::parse_from_rfc3339("2024-01-01T00:00:01Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_ne!(
            AuthMarker::issue(&user, t0).token,
            AuthMarker::issue(&user, t1).token
        );
        assert_eq!(AuthMarker::issue(&user, t0), AuthMarker::issue(&user, t0));
    }
}
