//! Authentication hook and buttons for the UI.

use std::cell::RefCell;
use std::rc::Rc;

use dioxus::prelude::*;
use store::{AuthSource, Backend, Identity, SessionProjector, SessionState};

/// Session state for the current component, plus the override setter.
#[derive(Clone)]
pub struct UseUser {
    state: Signal<SessionState>,
    projector: Rc<RefCell<SessionProjector<dyn Backend>>>,
}

impl UseUser {
    /// Current value; `Unknown` until the first session check completes.
    pub fn state(&self) -> SessionState {
        (self.state)()
    }

    /// Set the value without waiting for the auth source to confirm it.
    pub fn set_user(&self, user: Option<Identity>) {
        self.projector.borrow().override_with(user);
    }
}

/// Mirror the backend's auth session into a signal.
///
/// The listener is registered when the component mounts and released when it
/// unmounts; a session check that finishes after unmount is ignored.
pub fn use_user() -> UseUser {
    let state = use_signal(|| SessionState::Unknown);

    let projector = use_hook(move || {
        let projector = SessionProjector::activate(api::client(), move |next: &SessionState| {
            let mut state = state;
            state.set(next.clone());
        });
        spawn(projector.initial_fetch());
        Rc::new(RefCell::new(projector))
    });

    use_drop({
        let projector = projector.clone();
        move || projector.borrow_mut().deactivate()
    });

    UseUser { state, projector }
}

/// Button that starts the OAuth sign-in flow for `provider`.
#[component]
pub fn LoginButton(
    provider: String,
    #[props(default = "Login".to_string())] label: String,
    #[props(default = "".to_string())] class: String,
) -> Element {
    let mut error = use_signal(|| Option::<String>::None);

    let onclick = move |_: MouseEvent| match api::client().oauth_url(&provider) {
        Ok(url) => {
            tracing::debug!("Redirecting to {}", url);
            #[cfg(target_arch = "wasm32")]
            {
                if let Some(window) = web_sys::window() {
                    let _ = window.location().set_href(&url);
                }
            }
        }
        Err(e) => {
            tracing::error!("Failed to start sign-in: {}", e);
            error.set(Some(e.to_string()));
        }
    };

    rsx! {
        button {
            class: "{class}",
            onclick: onclick,
            "{label}"
        }
        if let Some(err) = error() {
            p { class: "notice notice--error", "{err}" }
        }
    }
}

/// Button that signs the current user out.
#[component]
pub fn LogoutButton(
    #[props(default = "Logout".to_string())] label: String,
    #[props(default = "".to_string())] class: String,
    on_logout: EventHandler<()>,
) -> Element {
    let onclick = move |_: MouseEvent| async move {
        if let Err(e) = api::client().sign_out().await {
            tracing::error!("Sign-out failed: {}", e);
        }
        on_logout.call(());
    };

    rsx! {
        button {
            class: "{class}",
            onclick: onclick,
            "{label}"
        }
    }
}
