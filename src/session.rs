//! Authentication session management.
//!
//! [`SessionManager`] owns the current user and bearer token.  It restores a
//! session from its [`TokenStore`] at startup, logs in and registers through
//! an [`AuthService`], and hands out a [`RequestContext`] so callers can
//! attach the credential to their own requests.

use crate::error::{Error, Result};
use crate::observability::{
    SESSION_BOOTSTRAP_REJECTED, SESSION_BOOTSTRAPS, SESSION_LOGIN_FAILURES, SESSION_LOGINS,
    SESSION_LOGOUTS, SESSION_REGISTRATION_FAILURES, SESSION_REGISTRATIONS,
};
use crate::service::AuthService;
use crate::token_store::TokenStore;
use crate::types::{BearerToken, Registration, RequestContext, User};

/// The externally visible state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Bootstrap has not finished.
    Loading,
    /// No user is logged in.
    LoggedOut,
    /// A user is logged in and their profile is known.
    Authenticated,
}

/// Owns the bearer token and current user for one client process.
pub struct SessionManager<A: AuthService, S: TokenStore> {
    auth: A,
    store: S,
    token: Option<BearerToken>,
    user: Option<User>,
    loading: bool,
    generation: u64,
}

impl<A: AuthService, S: TokenStore> SessionManager<A, S> {
    /// Creates a session that has not yet bootstrapped.
    pub fn new(auth: A, store: S) -> Self {
        Self {
            auth,
            store,
            token: None,
            user: None,
            loading: true,
            generation: 0,
        }
    }

    /// Restores the persisted session, if there is one.
    ///
    /// A stored token is attached and validated against the profile endpoint.
    /// Any failure logs out silently.  With no stored token no request is
    /// made.  Only the first call does anything; `is_loading` is false
    /// afterwards.
    pub async fn bootstrap(&mut self) -> SessionState {
        if !self.loading {
            return self.state();
        }
        SESSION_BOOTSTRAPS.click();

        let stored = match self.store.load() {
            Ok(stored) => stored,
            Err(err) => {
                tracing::warn!(error = %err, "could not read stored token");
                self.forget_credentials();
                None
            }
        };

        if let Some(token) = stored {
            self.attach(token.clone());
            let context = RequestContext::bearer(token, self.generation);
            match self.auth.current_user(&context).await {
                Ok(user) => {
                    tracing::info!(user = %user.username, "restored session");
                    self.user = Some(user);
                }
                Err(err) => {
                    SESSION_BOOTSTRAP_REJECTED.click();
                    tracing::warn!(error = %err, "stored token rejected; logging out");
                    self.forget_credentials();
                }
            }
        }

        self.loading = false;
        self.state()
    }

    /// Logs in with an email and password.
    ///
    /// On success the token is persisted and attached and the profile is
    /// fetched.  Failure is reported as [`Error::LoginFailed`], whose
    /// [`kind`](Error::kind) tells rejected credentials from an outage.
    ///
    /// Logging in does not end the bootstrap phase; a later
    /// [`bootstrap`](Self::bootstrap) still validates the stored token.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<User> {
        match self.try_login(email, password).await {
            Ok(user) => {
                SESSION_LOGINS.click();
                tracing::info!(user = %user.username, "logged in");
                Ok(user)
            }
            Err(err) => {
                SESSION_LOGIN_FAILURES.click();
                tracing::warn!(kind = %err.kind(), error = %err, "login error");
                Err(Error::login_failed(err))
            }
        }
    }

    async fn try_login(&mut self, email: &str, password: &str) -> Result<User> {
        let token = self.auth.issue_token(email, password).await?;
        self.store.save(&token)?;
        self.attach(token.clone());

        let context = RequestContext::bearer(token, self.generation);
        match self.auth.current_user(&context).await {
            Ok(user) => {
                self.user = Some(user.clone());
                Ok(user)
            }
            Err(err) => {
                // A token we cannot resolve to a user is not a session.
                self.forget_credentials();
                Err(err)
            }
        }
    }

    /// Creates an account and then logs in with the same credentials.
    ///
    /// Any failure, including in the chained login, is reported as
    /// [`Error::RegistrationFailed`].
    pub async fn register(&mut self, email: &str, username: &str, password: &str) -> Result<User> {
        let registration = Registration::new(email, username, password);
        if let Err(err) = self.auth.register(&registration).await {
            SESSION_REGISTRATION_FAILURES.click();
            tracing::warn!(kind = %err.kind(), error = %err, "registration error");
            return Err(Error::registration_failed(err));
        }
        match self.login(email, password).await {
            Ok(user) => {
                SESSION_REGISTRATIONS.click();
                Ok(user)
            }
            Err(err) => {
                SESSION_REGISTRATION_FAILURES.click();
                tracing::warn!(kind = %err.kind(), "login after registration failed");
                Err(Error::registration_failed(err))
            }
        }
    }

    /// Clears the stored token, the attached credential and the user.
    ///
    /// Calling this while logged out changes nothing.
    pub fn logout(&mut self) {
        let had_session = self.token.is_some() || self.user.is_some();
        self.forget_credentials();
        if had_session {
            SESSION_LOGOUTS.click();
            tracing::info!("logged out");
        }
    }

    /// The logged-in user.
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// The logged-in user's display name.
    pub fn display_name(&self) -> Option<&str> {
        self.user.as_ref().map(User::display_name)
    }

    /// True until [`bootstrap`](Self::bootstrap) (or a login) finishes.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// True when a user is logged in.
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// The current state.
    pub fn state(&self) -> SessionState {
        if self.loading {
            SessionState::Loading
        } else if self.user.is_some() {
            SessionState::Authenticated
        } else {
            SessionState::LoggedOut
        }
    }

    /// The context outgoing requests should carry right now.
    pub fn context(&self) -> RequestContext {
        RequestContext::new(self.token.clone(), self.generation)
    }

    /// Incremented whenever the attached credential changes.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether `context` was handed out under the current credential.
    pub fn is_current(&self, context: &RequestContext) -> bool {
        context.generation() == self.generation && context.token() == self.token.as_ref()
    }

    /// The token store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The auth service.
    pub fn auth(&self) -> &A {
        &self.auth
    }

    fn attach(&mut self, token: BearerToken) {
        self.token = Some(token);
        self.generation += 1;
    }

    fn forget_credentials(&mut self) {
        if let Err(err) = self.store.remove() {
            tracing::warn!(error = %err, "could not remove stored token");
        }
        let had_token = self.token.take().is_some();
        let had_user = self.user.take().is_some();
        if had_token || had_user {
            self.generation += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::error::FailureKind;
    use crate::token_store::MemoryTokenStore;
    use time::macros::datetime;

    const TOKEN: &str = "issued-token";

    fn kris() -> User {
        User {
            id: "1".to_string(),
            email: "a@b.com".to_string(),
            username: "kris".to_string(),
            is_active: true,
            is_verified: false,
            created_at: datetime!(2024-06-04 13:45:18 UTC),
        }
    }

    #[derive(Default)]
    struct FakeAuth {
        offline: bool,
        reject_registration: bool,
        calls: Mutex<Vec<String>>,
    }

    impl FakeAuth {
        fn offline() -> Self {
            Self {
                offline: true,
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait::async_trait]
    impl AuthService for FakeAuth {
        async fn issue_token(&self, email: &str, password: &str) -> Result<BearerToken> {
            self.record(format!("token {email}"));
            if self.offline {
                return Err(Error::connection("connection refused", None));
            }
            if email == "a@b.com" && password == "pw" {
                Ok(BearerToken::new(TOKEN))
            } else {
                Err(Error::authentication("Incorrect email or password"))
            }
        }

        async fn current_user(&self, context: &RequestContext) -> Result<User> {
            self.record(format!(
                "me {}",
                context.authorization().unwrap_or_default()
            ));
            if self.offline {
                return Err(Error::connection("connection refused", None));
            }
            match context.token() {
                Some(token) if token.as_str() == TOKEN => Ok(kris()),
                _ => Err(Error::authentication("Could not validate credentials")),
            }
        }

        async fn register(&self, registration: &Registration) -> Result<()> {
            self.record(format!("register {}", registration.email));
            if self.reject_registration {
                Err(Error::bad_request("Email already registered"))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn bootstrap_without_stored_token() {
        let mut session = SessionManager::new(FakeAuth::default(), MemoryTokenStore::new());
        assert!(session.is_loading());
        assert_eq!(session.state(), SessionState::Loading);

        assert_eq!(session.bootstrap().await, SessionState::LoggedOut);
        assert!(!session.is_loading());
        assert!(session.user().is_none());
        assert!(session.auth().calls().is_empty());
    }

    #[tokio::test]
    async fn bootstrap_restores_valid_token() {
        let store = MemoryTokenStore::with_token(BearerToken::new(TOKEN));
        let mut session = SessionManager::new(FakeAuth::default(), store);

        assert_eq!(session.bootstrap().await, SessionState::Authenticated);
        assert_eq!(session.display_name(), Some("kris"));
        assert_eq!(
            session.context().authorization().as_deref(),
            Some("Bearer issued-token")
        );
        assert_eq!(session.auth().calls(), vec!["me Bearer issued-token"]);
    }

    #[tokio::test]
    async fn bootstrap_with_rejected_token_logs_out() {
        let store = MemoryTokenStore::with_token(BearerToken::new("expired"));
        let mut session = SessionManager::new(FakeAuth::default(), store);

        assert_eq!(session.bootstrap().await, SessionState::LoggedOut);
        assert!(session.user().is_none());
        assert!(session.store().token().is_none());
        assert!(session.context().authorization().is_none());
    }

    #[tokio::test]
    async fn bootstrap_while_offline_logs_out() {
        let store = MemoryTokenStore::with_token(BearerToken::new(TOKEN));
        let mut session = SessionManager::new(FakeAuth::offline(), store);

        assert_eq!(session.bootstrap().await, SessionState::LoggedOut);
        assert!(session.store().token().is_none());
    }

    #[tokio::test]
    async fn bootstrap_runs_once() {
        let store = MemoryTokenStore::with_token(BearerToken::new(TOKEN));
        let mut session = SessionManager::new(FakeAuth::default(), store);
        session.bootstrap().await;
        session.bootstrap().await;
        assert_eq!(session.auth().calls().len(), 1);
    }

    #[tokio::test]
    async fn login_persists_and_attaches_token() {
        let mut session = SessionManager::new(FakeAuth::default(), MemoryTokenStore::new());
        session.bootstrap().await;

        let user = session.login("a@b.com", "pw").await.unwrap();
        assert_eq!(user.username, "kris");
        assert_eq!(session.state(), SessionState::Authenticated);
        assert_eq!(session.store().token(), Some(&BearerToken::new(TOKEN)));
        assert_eq!(
            session.context().authorization().as_deref(),
            Some("Bearer issued-token")
        );
        assert_eq!(
            session.auth().calls(),
            vec!["token a@b.com", "me Bearer issued-token"]
        );
    }

    #[tokio::test]
    async fn login_before_bootstrap_still_bootstraps() {
        let mut session = SessionManager::new(FakeAuth::default(), MemoryTokenStore::new());

        session.login("a@b.com", "pw").await.unwrap();
        assert!(session.is_loading());
        assert!(session.is_authenticated());

        assert_eq!(session.bootstrap().await, SessionState::Authenticated);
        assert!(!session.is_loading());
        assert_eq!(
            session.auth().calls(),
            vec![
                "token a@b.com",
                "me Bearer issued-token",
                "me Bearer issued-token"
            ]
        );
    }

    #[tokio::test]
    async fn login_with_bad_password() {
        let mut session = SessionManager::new(FakeAuth::default(), MemoryTokenStore::new());
        session.bootstrap().await;

        let err = session.login("a@b.com", "wrong").await.unwrap_err();
        assert!(err.is_login_failed());
        assert_eq!(err.to_string(), "Login failed");
        assert_eq!(err.kind(), FailureKind::InvalidCredentials);
        assert!(session.user().is_none());
        assert!(session.store().token().is_none());
    }

    #[tokio::test]
    async fn login_while_offline_is_a_network_failure() {
        let mut session = SessionManager::new(FakeAuth::offline(), MemoryTokenStore::new());
        session.bootstrap().await;

        let err = session.login("a@b.com", "pw").await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Network);
    }

    #[tokio::test]
    async fn register_logs_in() {
        let mut session = SessionManager::new(FakeAuth::default(), MemoryTokenStore::new());
        session.bootstrap().await;

        let user = session.register("a@b.com", "kris", "pw").await.unwrap();
        assert_eq!(user.username, "kris");
        assert!(session.is_authenticated());
        assert_eq!(
            session.auth().calls(),
            vec![
                "register a@b.com",
                "token a@b.com",
                "me Bearer issued-token"
            ]
        );
    }

    #[tokio::test]
    async fn register_rejected() {
        let auth = FakeAuth {
            reject_registration: true,
            ..FakeAuth::default()
        };
        let mut session = SessionManager::new(auth, MemoryTokenStore::new());
        session.bootstrap().await;

        let err = session.register("a@b.com", "kris", "pw").await.unwrap_err();
        assert!(err.is_registration_failed());
        assert_eq!(err.to_string(), "Registration failed");
        assert_eq!(err.kind(), FailureKind::InvalidCredentials);
        assert_eq!(session.auth().calls(), vec!["register a@b.com"]);
    }

    #[tokio::test]
    async fn register_with_failing_login() {
        let mut session = SessionManager::new(FakeAuth::default(), MemoryTokenStore::new());
        session.bootstrap().await;

        let err = session.register("a@b.com", "kris", "other").await.unwrap_err();
        assert!(err.is_registration_failed());
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn logout_clears_everything() {
        let mut session = SessionManager::new(FakeAuth::default(), MemoryTokenStore::new());
        session.bootstrap().await;
        session.login("a@b.com", "pw").await.unwrap();
        let before = session.context();

        session.logout();
        assert_eq!(session.state(), SessionState::LoggedOut);
        assert!(session.user().is_none());
        assert!(session.store().token().is_none());
        assert!(session.context().authorization().is_none());
        assert!(!session.is_current(&before));
    }

    #[tokio::test]
    async fn logout_when_logged_out_is_a_no_op() {
        let mut session = SessionManager::new(FakeAuth::default(), MemoryTokenStore::new());
        session.bootstrap().await;
        let generation = session.generation();

        session.logout();
        session.logout();
        assert_eq!(session.generation(), generation);
        assert_eq!(session.state(), SessionState::LoggedOut);
    }
}
