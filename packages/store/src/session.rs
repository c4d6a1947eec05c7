//! # Session projection
//!
//! [`SessionProjector`] mirrors the session held by an [`AuthSource`] into a local
//! [`SessionState`] and keeps it current until it is deactivated.
//!
//! ## Lifecycle
//!
//! 1. [`activate`](SessionProjector::activate) starts at [`SessionState::Unknown`]
//!    and registers a standing listener on the source.
//! 2. [`initial_fetch`](SessionProjector::initial_fetch) returns a `'static` future
//!    that asks the source for its current session once and writes `Present` or
//!    `Absent`. A failed fetch is logged and resolves to `Absent`.
//! 3. Every change notification overwrites the value. The fetch and the listener
//!    race freely; the last write wins.
//! 4. [`deactivate`](SessionProjector::deactivate) (also run on `Drop`) releases the
//!    listener. From then on every write is discarded, including a fetch that
//!    resolves late or a source that keeps firing.
//!
//! The value never returns to `Unknown` once resolved.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;

use crate::backend::{AuthChangeEvent, AuthSource, Subscription};
use crate::models::{Identity, Session};

/// Local view of the auth session.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum SessionState {
    /// The initial check has not completed.
    #[default]
    Unknown,
    /// Nobody is signed in.
    Absent,
    /// Signed in as this identity.
    Present(Identity),
}

impl SessionState {
    pub fn from_session(session: Option<&Session>) -> Self {
        match session {
            Some(session) => Self::Present(session.user.clone()),
            None => Self::Absent,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn user(&self) -> Option<&Identity> {
        match self {
            Self::Present(user) => Some(user),
            _ => None,
        }
    }
}

type Observer = Box<dyn Fn(&SessionState)>;

struct Projection {
    state: RefCell<SessionState>,
    active: Cell<bool>,
    observer: Observer,
}

impl Projection {
    fn write(&self, next: SessionState, origin: &str) -> bool {
        if !self.active.get() {
            tracing::debug!(origin, "discarding session write after teardown");
            return false;
        }
        tracing::debug!(origin, state = ?next, "session projection updated");
        *self.state.borrow_mut() = next.clone();
        (self.observer)(&next);
        true
    }
}

/// Keeps a [`SessionState`] in sync with an [`AuthSource`].
pub struct SessionProjector<S: AuthSource + ?Sized + 'static> {
    source: Rc<S>,
    projection: Rc<Projection>,
    subscription: Option<Subscription>,
}

impl<S: AuthSource + ?Sized + 'static> SessionProjector<S> {
    /// Start projecting `source`. `observer` runs after every accepted write.
    pub fn activate<F>(source: Rc<S>, observer: F) -> Self
    where
        F: Fn(&SessionState) + 'static,
    {
        let projection = Rc::new(Projection {
            state: RefCell::new(SessionState::Unknown),
            active: Cell::new(true),
            observer: Box::new(observer),
        });

        let listener = Rc::downgrade(&projection);
        let subscription = source.on_auth_state_change(Rc::new(
            move |event: AuthChangeEvent, session: Option<&Session>| {
                if let Some(projection) = listener.upgrade() {
                    projection.write(SessionState::from_session(session), event_name(event));
                }
            },
        ));

        Self {
            source,
            projection,
            subscription: Some(subscription),
        }
    }

    /// The one-shot initial session check. Resolves `Unknown` to `Absent` or `Present`.
    pub fn initial_fetch(&self) -> impl Future<Output = ()> + 'static {
        let source = self.source.clone();
        let projection = self.projection.clone();
        async move {
            let next = match source.get_session().await {
                Ok(session) => SessionState::from_session(session.as_ref()),
                Err(e) => {
                    tracing::warn!("Session check failed, treating as signed out: {}", e);
                    SessionState::Absent
                }
            };
            projection.write(next, "initial_fetch");
        }
    }

    /// Current value.
    pub fn state(&self) -> SessionState {
        self.projection.state.borrow().clone()
    }

    /// Set the value without waiting for the source, e.g. right after signing out.
    pub fn override_with(&self, user: Option<Identity>) {
        let next = match user {
            Some(user) => SessionState::Present(user),
            None => SessionState::Absent,
        };
        self.projection.write(next, "override");
    }

    pub fn is_active(&self) -> bool {
        self.projection.active.get()
    }

    /// Stop projecting and release the listener. Safe to call more than once.
    pub fn deactivate(&mut self) {
        self.projection.active.set(false);
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
            tracing::debug!("session projector deactivated");
        }
    }
}

impl<S: AuthSource + ?Sized + 'static> Drop for SessionProjector<S> {
    fn drop(&mut self) {
        self.deactivate();
    }
}

fn event_name(event: AuthChangeEvent) -> &'static str {
    match event {
        AuthChangeEvent::InitialSession => "INITIAL_SESSION",
        AuthChangeEvent::SignedIn => "SIGNED_IN",
        AuthChangeEvent::SignedOut => "SIGNED_OUT",
        AuthChangeEvent::TokenRefreshed => "TOKEN_REFRESHED",
        AuthChangeEvent::UserUpdated => "USER_UPDATED",
    }
}
