//! Session manager: the in-memory view of who is signed in.
//!
//! Status moves between `Loading`, `Unauthenticated` and `Authenticated`.
//! The user profile only exists inside `Authenticated`, so
//! `is_authenticated()` can never disagree with whether a profile is held.
//!
//! Every teardown (logout or a rejected credential) bumps a generation
//! counter. Profile results are committed only if the generation they
//! started under is still current, so a logout always wins over a login or
//! profile update that was in flight when it happened.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::api::{ApiError, Gateway, UnauthorizedHandler};
use crate::models::{AccessToken, PasswordReset, Registration, User, UserUpdate};
use crate::routes::{self, Navigation, Navigator, Route};

use super::{Admission, Credential, Guard, StoreError, TokenStore};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionStatus {
    /// Startup check of a stored credential has not finished
    #[default]
    Loading,
    Unauthenticated,
    Authenticated(User),
}

impl SessionStatus {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionStatus::Authenticated(_))
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SessionStatus::Loading)
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            SessionStatus::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// A logout or credential rejection happened while the call was in flight
    #[error("Session ended before the request completed")]
    Superseded,
}

impl SessionError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, SessionError::Api(e) if e.is_unauthorized())
    }

    pub fn user_message(&self) -> String {
        match self {
            SessionError::Api(e) => e.user_message(),
            SessionError::Store(_) => "Could not save your login on this device.".to_string(),
            SessionError::Superseded => "You were signed out. Please log in again.".to_string(),
        }
    }
}

/// State shared between the manager handles and the gateway's 401 handler
struct Shared {
    status: watch::Sender<SessionStatus>,
    generation: Mutex<u64>,
    store: Arc<dyn TokenStore>,
    navigator: Arc<dyn Navigator>,
}

impl Shared {
    fn lock_generation(&self) -> MutexGuard<'_, u64> {
        self.generation.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn generation(&self) -> u64 {
        *self.lock_generation()
    }

    fn clear_store(&self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear stored credential");
        }
    }

    /// Drop the credential and the profile, invalidating in-flight results
    fn tear_down(&self) {
        let mut generation = self.lock_generation();
        *generation += 1;
        self.clear_store();
        self.status.send_replace(SessionStatus::Unauthenticated);
    }

    /// Persist a freshly issued token unless the session ended meanwhile
    fn save_credential(&self, expected: u64, credential: &Credential) -> Result<(), SessionError> {
        let generation = self.lock_generation();
        if *generation != expected {
            return Err(SessionError::Superseded);
        }
        self.store.save(credential)?;
        Ok(())
    }

    /// Enter `Authenticated` with a newly established identity. Bumps the
    /// generation so older pending sign-ins cannot overwrite it.
    fn establish(&self, expected: u64, user: User) -> Result<(), SessionError> {
        let mut generation = self.lock_generation();
        if *generation != expected {
            return Err(SessionError::Superseded);
        }
        *generation += 1;
        self.status.send_replace(SessionStatus::Authenticated(user));
        Ok(())
    }

    /// Replace the profile of the current identity
    fn replace_user(&self, expected: u64, user: User) -> Result<(), SessionError> {
        let generation = self.lock_generation();
        if *generation != expected {
            return Err(SessionError::Superseded);
        }
        self.status.send_replace(SessionStatus::Authenticated(user));
        Ok(())
    }

    /// Settle as signed out after a failed profile fetch, if nothing newer
    /// has happened since `expected`
    fn settle_unauthenticated(&self, expected: u64, clear_credential: bool) {
        let mut generation = self.lock_generation();
        if *generation != expected {
            debug!("Session changed meanwhile, leaving it as is");
            return;
        }
        *generation += 1;
        if clear_credential {
            self.clear_store();
        }
        self.status.send_replace(SessionStatus::Unauthenticated);
    }
}

/// Registered with the gateway; runs on every `401`
struct CredentialRejected {
    shared: Weak<Shared>,
}

impl UnauthorizedHandler for CredentialRejected {
    fn on_unauthorized(&self) {
        if let Some(shared) = self.shared.upgrade() {
            warn!("Credential rejected, signing out");
            shared.tear_down();
            shared.navigator.navigate(Route::Login);
        }
    }
}

/// Owns the session for one process (or one test). Cloning yields another
/// handle to the same session.
#[derive(Clone)]
pub struct SessionManager {
    gateway: Arc<Gateway>,
    shared: Arc<Shared>,
}

impl SessionManager {
    /// Create a manager in the `Loading` state and hook it into the
    /// gateway's 401 handling. Call [`initialize`](Self::initialize) next.
    pub fn new(gateway: Arc<Gateway>, navigator: Arc<dyn Navigator>) -> Self {
        let (status, _) = watch::channel(SessionStatus::Loading);
        let shared = Arc::new(Shared {
            status,
            generation: Mutex::new(0),
            store: gateway.token_store().clone(),
            navigator,
        });

        gateway.on_unauthorized(Arc::new(CredentialRejected {
            shared: Arc::downgrade(&shared),
        }));

        Self { gateway, shared }
    }

    pub fn gateway(&self) -> &Arc<Gateway> {
        &self.gateway
    }

    /// Startup: validate a stored credential by fetching the profile.
    /// Returns the settled status.
    pub async fn initialize(&self) -> SessionStatus {
        let generation = self.shared.generation();

        let stored = match self.shared.store.load() {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "Failed to read stored credential");
                None
            }
        };

        if stored.is_none() {
            debug!("No stored credential");
            self.shared.settle_unauthenticated(generation, false);
            return self.status();
        }

        match self.gateway.current_user().await {
            Ok(user) => {
                info!(email = %user.email, "Session restored");
                if self.shared.establish(generation, user).is_err() {
                    debug!("Session changed during startup check, result discarded");
                }
            }
            Err(e) => {
                warn!(error = %e, "Stored credential could not be validated");
                self.shared.settle_unauthenticated(generation, true);
            }
        }
        self.status()
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, SessionError> {
        let generation = self.shared.generation();
        let token = self.gateway.login(email, password).await.map_err(|e| {
            error!(error = %e, "Login failed");
            e
        })?;
        let user = self.sign_in(generation, token).await?;
        info!(email = %user.email, "Login successful");
        Ok(user)
    }

    /// Create an account and sign in. Omitted profile fields take the
    /// server defaults (`09:00`, `UTC`).
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        notification_time: Option<&str>,
        timezone: Option<&str>,
    ) -> Result<User, SessionError> {
        let generation = self.shared.generation();
        let registration = Registration {
            email: email.to_string(),
            password: password.to_string(),
            notification_time: notification_time.map(str::to_string),
            timezone: timezone.map(str::to_string),
        };
        let token = self.gateway.register(&registration).await.map_err(|e| {
            error!(error = %e, "Registration failed");
            e
        })?;
        let user = self.sign_in(generation, token).await?;
        info!(email = %user.email, "Registration successful");
        Ok(user)
    }

    async fn sign_in(&self, generation: u64, token: AccessToken) -> Result<User, SessionError> {
        self.shared
            .save_credential(generation, &Credential::from(token.access_token))?;

        match self.gateway.current_user().await {
            Ok(user) => {
                self.shared.establish(generation, user.clone())?;
                Ok(user)
            }
            Err(e) => {
                error!(error = %e, "Failed to fetch profile after sign-in");
                self.shared.settle_unauthenticated(generation, true);
                Err(e.into())
            }
        }
    }

    /// Forget the credential and the profile. Never fails; storage errors
    /// are logged.
    pub fn logout(&self) {
        self.shared.tear_down();
        info!("Logged out");
    }

    /// Send a partial profile update. On success the session holds the
    /// server's record; on failure it is left exactly as it was.
    pub async fn update_user(&self, update: UserUpdate) -> Result<User, SessionError> {
        let generation = self.shared.generation();
        let user = self.gateway.update_user(&update).await.map_err(|e| {
            error!(error = %e, "Profile update failed");
            e
        })?;
        self.shared.replace_user(generation, user.clone())?;
        debug!("Profile updated");
        Ok(user)
    }

    /// Change the account password. Session state is not touched.
    pub async fn reset_password(
        &self,
        email: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), SessionError> {
        let reset = PasswordReset {
            email: email.to_string(),
            old_password: old_password.to_string(),
            new_password: new_password.to_string(),
        };
        let ack = self.gateway.reset_password(&reset).await?;
        info!(message = ?ack.message, "Password changed");
        Ok(())
    }

    pub fn status(&self) -> SessionStatus {
        self.shared.status.borrow().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.shared.status.borrow().user().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.shared.status.borrow().is_authenticated()
    }

    pub fn is_loading(&self) -> bool {
        self.shared.status.borrow().is_loading()
    }

    /// Watch status transitions
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.shared.status.subscribe()
    }

    pub fn admit(&self, guard: &dyn Guard) -> Admission {
        guard.admit(&self.shared.status.borrow())
    }

    /// Resolve a route path against the current status
    pub fn navigate(&self, path: &str) -> Navigation {
        routes::resolve(path, &self.shared.status.borrow())
    }
}
