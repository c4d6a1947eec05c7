//! Login page view with the OAuth button.

use dioxus::prelude::*;
use store::SessionState;
use ui::{use_user, LoginButton};

use crate::Route;

/// Login page component.
#[component]
pub fn Login() -> Element {
    let user = use_user();
    let nav = use_navigator();
    let provider = use_hook(api::sign_in_provider);

    // Already signed in, go home
    if let SessionState::Present(_) = user.state() {
        nav.replace(Route::Home {});
    }

    rsx! {
        main {
            class: "page login",
            h1 { "Login" }
            LoginButton {
                provider: provider,
                label: "Sign in with GitHub",
                class: "login-btn",
            }
        }
    }
}
