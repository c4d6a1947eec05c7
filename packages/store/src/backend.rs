//! # Backend boundary: auth source and component table
//!
//! The hosted backend is consumed through two traits, so the same session and
//! write-path logic runs against the real HTTP client (`api` crate) or the
//! in-memory fake ([`crate::MemoryBackend`]).
//!
//! | Trait | Operations |
//! |-------|-----------|
//! | [`AuthSource`] | `get_session`, `on_auth_state_change`, `oauth_url`, `sign_out` |
//! | [`ComponentTable`] | `insert`, `select_all` |
//!
//! Everything here is single-threaded: callbacks are `Rc`, futures are `?Send`.
//!
//! ## Subscriptions
//!
//! [`AuthListeners`] is the listener registry both backends share. Registering a
//! callback returns a [`Subscription`]; the callback stays registered until the
//! handle is unsubscribed or dropped, whichever comes first.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::{ComponentRow, NewComponent, Session};

/// Error body returned by the backend (`{ message, code, details, hint }`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct RemoteError {
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

impl RemoteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            details: None,
            hint: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// Kind of session change reported to subscribers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthChangeEvent {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
}

/// Callback invoked on every session change.
pub type AuthCallback = Rc<dyn Fn(AuthChangeEvent, Option<&Session>)>;

/// Handle to a registered auth listener.
///
/// Releasing is idempotent: [`unsubscribe`](Subscription::unsubscribe) and `Drop`
/// both run the release at most once.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A handle with nothing to release.
    pub fn detached() -> Self {
        Self { release: None }
    }

    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

#[derive(Default)]
struct ListenerTable {
    next_id: u64,
    callbacks: BTreeMap<u64, AuthCallback>,
}

/// Registry of auth listeners shared by backend implementations.
#[derive(Clone, Default)]
pub struct AuthListeners {
    table: Rc<RefCell<ListenerTable>>,
}

impl AuthListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, callback: AuthCallback) -> Subscription {
        let id = {
            let mut table = self.table.borrow_mut();
            let id = table.next_id;
            table.next_id += 1;
            table.callbacks.insert(id, callback);
            id
        };
        let weak: Weak<RefCell<ListenerTable>> = Rc::downgrade(&self.table);
        Subscription::new(move || {
            if let Some(table) = weak.upgrade() {
                table.borrow_mut().callbacks.remove(&id);
            }
        })
    }

    /// Notify every registered listener, in registration order.
    pub fn emit(&self, event: AuthChangeEvent, session: Option<&Session>) {
        // Snapshot first: a callback may unsubscribe while we iterate.
        let callbacks: Vec<AuthCallback> = self.table.borrow().callbacks.values().cloned().collect();
        tracing::debug!(?event, listeners = callbacks.len(), "emitting auth change");
        for callback in callbacks {
            callback(event, session);
        }
    }

    pub fn len(&self) -> usize {
        self.table.borrow().callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The auth half of the backend.
#[async_trait(?Send)]
pub trait AuthSource {
    /// Current session, or `None` when nobody is signed in.
    async fn get_session(&self) -> Result<Option<Session>, RemoteError>;

    /// Register a listener for session changes.
    fn on_auth_state_change(&self, callback: AuthCallback) -> Subscription;

    /// Where to send the browser to sign in with an OAuth `provider`.
    fn oauth_url(&self, provider: &str) -> Result<String, RemoteError> {
        Err(RemoteError::new(format!("{provider} sign-in is not available")))
    }

    /// End the current session. Listeners receive `SignedOut`.
    async fn sign_out(&self) -> Result<(), RemoteError>;
}

/// The `components` table.
#[async_trait(?Send)]
pub trait ComponentTable {
    async fn insert(&self, row: &NewComponent) -> Result<(), RemoteError>;

    async fn select_all(&self) -> Result<Vec<ComponentRow>, RemoteError>;
}

/// A full backend: auth plus the component table.
pub trait Backend: AuthSource + ComponentTable {}

impl<T: AuthSource + ComponentTable + ?Sized> Backend for T {}

/// Load every component, logging failures and treating them as an empty list.
pub async fn fetch_components<T: ComponentTable + ?Sized>(table: &T) -> Vec<ComponentRow> {
    match table.select_all().await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!("Failed to load components: {}", e);
            Vec::new()
        }
    }
}
