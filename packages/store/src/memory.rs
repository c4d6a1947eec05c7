use std::cell::{Cell, RefCell};

use async_trait::async_trait;

use crate::backend::{
    AuthCallback, AuthChangeEvent, AuthListeners, AuthSource, ComponentTable, RemoteError,
    Subscription,
};
use crate::models::{ComponentRow, Identity, NewComponent, Session};

/// In-memory backend for testing and the unconfigured fallback.
#[derive(Default)]
pub struct MemoryBackend {
    session: RefCell<Option<Session>>,
    listeners: AuthListeners,
    rows: RefCell<Vec<ComponentRow>>,
    next_id: Cell<i64>,
    insert_failure: RefCell<Option<RemoteError>>,
    select_failure: RefCell<Option<RemoteError>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored session without notifying listeners.
    pub fn set_session(&self, user: Option<Identity>) {
        *self.session.borrow_mut() = user.map(session_for);
    }

    /// Sign in as `user` and notify listeners.
    pub fn sign_in(&self, user: Identity) {
        let session = session_for(user);
        *self.session.borrow_mut() = Some(session.clone());
        self.listeners.emit(AuthChangeEvent::SignedIn, Some(&session));
    }

    /// Re-issue the current session's token and notify listeners.
    pub fn refresh_token(&self) {
        let session = self.session.borrow().clone();
        if let Some(session) = session {
            self.listeners
                .emit(AuthChangeEvent::TokenRefreshed, Some(&session));
        }
    }

    /// Make the next insert fail with `error`.
    pub fn fail_next_insert(&self, error: RemoteError) {
        *self.insert_failure.borrow_mut() = Some(error);
    }

    /// Make the next select fail with `error`.
    pub fn fail_next_select(&self, error: RemoteError) {
        *self.select_failure.borrow_mut() = Some(error);
    }

    pub fn rows(&self) -> Vec<ComponentRow> {
        self.rows.borrow().clone()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

fn session_for(user: Identity) -> Session {
    Session {
        access_token: format!("memory-{}", user.id),
        refresh_token: String::new(),
        token_type: "bearer".to_string(),
        expires_in: 3600,
        expires_at: None,
        user,
    }
}

#[async_trait(?Send)]
impl AuthSource for MemoryBackend {
    async fn get_session(&self) -> Result<Option<Session>, RemoteError> {
        Ok(self.session.borrow().clone())
    }

    fn on_auth_state_change(&self, callback: AuthCallback) -> Subscription {
        self.listeners.subscribe(callback)
    }

    async fn sign_out(&self) -> Result<(), RemoteError> {
        self.session.borrow_mut().take();
        self.listeners.emit(AuthChangeEvent::SignedOut, None);
        Ok(())
    }
}

#[async_trait(?Send)]
impl ComponentTable for MemoryBackend {
    async fn insert(&self, row: &NewComponent) -> Result<(), RemoteError> {
        if let Some(error) = self.insert_failure.borrow_mut().take() {
            return Err(error);
        }
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        self.rows.borrow_mut().push(row.clone().into_row(id));
        Ok(())
    }

    async fn select_all(&self) -> Result<Vec<ComponentRow>, RemoteError> {
        if let Some(error) = self.select_failure.borrow_mut().take() {
            return Err(error);
        }
        Ok(self.rows())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fetch_components;

    fn part(name: &str, quantity: i64) -> NewComponent {
        NewComponent {
            name: name.to_string(),
            quantity,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_increasing_ids() {
        let backend = MemoryBackend::new();
        backend.insert(&part("Resistor", 10)).await.unwrap();
        backend.insert(&part("Diode", 4)).await.unwrap();

        let rows = backend.select_all().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, 1);
        assert_eq!(rows[0].name, "Resistor");
        assert_eq!(rows[1].id, 2);
        assert_eq!(rows[1].quantity, 4);
    }

    #[tokio::test]
    async fn test_insert_failure_is_one_shot() {
        let backend = MemoryBackend::new();
        backend.fail_next_insert(RemoteError::new("network"));

        let err = backend.insert(&part("Resistor", 1)).await.unwrap_err();
        assert_eq!(err.message, "network");
        assert!(backend.rows().is_empty());

        backend.insert(&part("Resistor", 1)).await.unwrap();
        assert_eq!(backend.rows().len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_components_treats_failure_as_empty() {
        let backend = MemoryBackend::new();
        backend.insert(&part("Resistor", 1)).await.unwrap();
        backend.fail_next_select(RemoteError::new("permission denied"));

        assert!(fetch_components(&backend).await.is_empty());
        assert_eq!(fetch_components(&backend).await.len(), 1);
    }

    #[tokio::test]
    async fn test_sign_out_clears_session() {
        let backend = MemoryBackend::new();
        backend.set_session(Some(Identity {
            id: "u1".to_string(),
            email: None,
            app_metadata: Default::default(),
        }));
        assert!(backend.get_session().await.unwrap().is_some());

        backend.sign_out().await.unwrap();
        assert!(backend.get_session().await.unwrap().is_none());
    }
}
