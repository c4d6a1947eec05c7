//! Home page: who is signed in, and the inventory list.

use dioxus::prelude::*;
use store::SessionState;
use ui::{use_components, use_user, ComponentList, LogoutButton, Navbar};

use crate::Route;

#[component]
pub fn Home() -> Element {
    let user = use_user();
    let components = use_components();

    let on_logout = {
        let user = user.clone();
        move |_: ()| user.set_user(None)
    };

    let rows = components.read().clone().unwrap_or_default();

    rsx! {
        main {
            class: "page",
            h1 { "Welcome to the Home Page" }

            Navbar {
                {match user.state() {
                    SessionState::Present(identity) => rsx! {
                        p { "Logged in as: {identity.display_name()}" }
                        LogoutButton { class: "nav-button", on_logout: on_logout }
                    },
                    SessionState::Absent => rsx! {
                        Link { class: "nav-button", to: Route::Login {}, "Login" }
                    },
                    SessionState::Unknown => rsx! {
                        span { class: "nav-status", "Checking session..." }
                    },
                }}
                Link { class: "nav-link", to: Route::Dashboard {}, "Dashboard" }
            }

            ComponentList { rows }
        }
    }
}
