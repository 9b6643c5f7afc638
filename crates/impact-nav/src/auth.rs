//! Identity provider boundary
//!
//! Credential checks happen elsewhere; navigation only needs the current
//! [`Session`] and a notification when it changes.

use impact_access::Session;
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Callback receiving the new session, `None` after sign-out
pub type SessionListener = Arc<dyn Fn(Option<Session>) + Send + Sync>;

/// Opaque authentication capability
pub trait AuthProvider: Send + Sync {
    /// Session of the signed-in user, if any
    fn current_session(&self) -> Option<Session>;

    /// Register a listener for sign-in and sign-out
    fn on_session_change(&self, listener: SessionListener) -> SessionSubscription;
}

/// Registration of a session listener
///
/// Deregisters exactly once, on [`SessionSubscription::release`] or drop.
#[must_use = "dropping the subscription deregisters the listener"]
pub struct SessionSubscription {
    release: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl SessionSubscription {
    /// Subscription running `release` when it ends
    pub fn new<F>(release: F) -> Self
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Deregister now
    pub fn release(mut self) {
        self.run_release();
    }

    /// Whether the listener is still registered
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.release.is_some()
    }

    fn run_release(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        self.run_release();
    }
}

impl std::fmt::Debug for SessionSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSubscription")
            .field("active", &self.is_active())
            .finish()
    }
}

#[derive(Default)]
struct AuthState {
    session: RwLock<Option<Session>>,
    listeners: Mutex<BTreeMap<u64, SessionListener>>,
    next_listener: AtomicU64,
}

/// In-process provider where the host signs users in and out directly
///
/// Clones share state.
#[derive(Clone, Default)]
pub struct InMemoryAuthProvider {
    state: Arc<AuthState>,
}

impl InMemoryAuthProvider {
    /// Provider with nobody signed in
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current session and notify listeners
    pub fn sign_in(&self, session: Session) {
        tracing::info!(role = %session.role, user = %session.display_name, "signed in");
        *self.state.session.write() = Some(session.clone());
        self.notify(Some(session));
    }

    /// Clear the current session and notify listeners
    ///
    /// Returns `false` when nobody was signed in; listeners are not called.
    pub fn sign_out(&self) -> bool {
        let previous = self.state.session.write().take();
        if previous.is_none() {
            return false;
        }
        tracing::info!("signed out");
        self.notify(None);
        true
    }

    /// Number of registered listeners
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.state.listeners.lock().len()
    }

    // Outside the locks: listeners typically read the provider again.
    fn notify(&self, session: Option<Session>) {
        let listeners: Vec<SessionListener> =
            self.state.listeners.lock().values().cloned().collect();
        for listener in listeners {
            listener(session.clone());
        }
    }
}

impl AuthProvider for InMemoryAuthProvider {
    fn current_session(&self) -> Option<Session> {
        self.state.session.read().clone()
    }

    fn on_session_change(&self, listener: SessionListener) -> SessionSubscription {
        let id = self.state.next_listener.fetch_add(1, Ordering::Relaxed);
        self.state.listeners.lock().insert(id, listener);

        let state = Arc::downgrade(&self.state);
        SessionSubscription::new(move || {
            if let Some(state) = state.upgrade() {
                state.listeners.lock().remove(&id);
            }
        })
    }
}

impl std::fmt::Debug for InMemoryAuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryAuthProvider")
            .field("session", &*self.state.session.read())
            .field("listeners", &self.listener_count())
            .finish()
    }
}
