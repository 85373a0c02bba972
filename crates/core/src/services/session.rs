//! Session context.
//!
//! Holds the currently signed-in session and notifies subscribers when it changes.
//! A context is created empty, initialized once from a stored token, then updated
//! on sign-in and sign-out.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};

use riviu_common::{AppError, AppResult};
use riviu_db::entities::user::{self, Role};
use serde::Serialize;
use tracing::debug;

use crate::services::authz::Actor;
use crate::services::user::{AuthSession, UserService};

/// The signed-in user as seen by the rest of the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub token: String,
    pub role: Role,
}

impl Session {
    #[must_use]
    pub fn new(user: &user::Model, token: impl Into<String>) -> Self {
        Self {
            user_id: user.id.clone(),
            email: user.email.clone(),
            token: token.into(),
            role: user.role,
        }
    }

    /// The session's user as an authorization actor.
    #[must_use]
    pub fn actor(&self) -> Actor {
        Actor {
            user_id: self.user_id.clone(),
            role: self.role,
        }
    }
}

impl From<AuthSession> for Session {
    fn from(auth: AuthSession) -> Self {
        Self::new(&auth.user, auth.token)
    }
}

/// A change of the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn(Session),
    SignedOut,
}

type Listener = Box<dyn Fn(&SessionEvent) + Send + Sync>;

#[derive(Default)]
struct Inner {
    current: RwLock<Option<Session>>,
    listeners: RwLock<HashMap<u64, Listener>>,
    next_id: AtomicU64,
}

/// Shared, cloneable session state.
#[derive(Clone, Default)]
pub struct SessionContext {
    inner: Arc<Inner>,
}

impl SessionContext {
    /// Create a context with no session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore the session for a stored token.
    ///
    /// An unknown or missing token leaves the context signed out. Store failures are
    /// returned and leave the context unchanged.
    pub async fn initialize(&self, users: &UserService, token: Option<&str>) -> AppResult<Option<Session>> {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            self.clear();
            return Ok(None);
        };

        match users.authenticate(token).await {
            Ok(user) => {
                let session = Session::new(&user, token);
                self.set(session.clone());
                Ok(Some(session))
            }
            Err(AppError::Unauthorized) => {
                debug!("Stored token no longer valid");
                self.clear();
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// The current session, if signed in.
    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.inner
            .current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the current session and notify subscribers.
    pub fn set(&self, session: Session) {
        *self
            .inner
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        self.notify(&SessionEvent::SignedIn(session));
    }

    /// Sign out locally and notify subscribers.
    pub fn clear(&self) {
        *self
            .inner
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
        self.notify(&SessionEvent::SignedOut);
    }

    /// Register a listener for session changes.
    ///
    /// The listener stays registered until [`Subscription::unsubscribe`] is called.
    /// Listeners run while the listener table is read-locked, so they must not
    /// subscribe or unsubscribe themselves.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Box::new(listener));

        Subscription {
            id,
            inner: Arc::downgrade(&self.inner),
        }
    }

    fn notify(&self, event: &SessionEvent) {
        let listeners = self
            .inner
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        for listener in listeners.values() {
            listener(event);
        }
    }
}

/// Handle returned by [`SessionContext::subscribe`].
#[must_use = "dropping a Subscription keeps the listener registered; call unsubscribe to remove it"]
pub struct Subscription {
    id: u64,
    inner: Weak<Inner>,
}

impl Subscription {
    /// Stop receiving session events.
    pub fn unsubscribe(self) {
        if let Some(inner) = self.inner.upgrade() {
            inner
                .listeners
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&self.id);
        }
    }
}
