use dioxus::prelude::*;
use ui::{use_user, ComponentForm};

use crate::Route;

/// Form page for adding components. Only a confirmed signed-out session redirects.
#[component]
pub fn Dashboard() -> Element {
    let user = use_user();
    let nav = use_navigator();

    if user.state().is_absent() {
        nav.replace(Route::Login {});
    }

    rsx! {
        main {
            class: "page",
            h1 { "Welcome to the Dashboard Page" }
            nav {
                class: "navbar",
                Link { to: Route::Home {}, "Home" }
            }

            h2 { "Add New Component" }
            ComponentForm {}
        }
    }
}
