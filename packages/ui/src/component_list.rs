//! Inventory list and the hook that loads it.

use dioxus::prelude::*;
use store::models::display_or_dash;
use store::{fetch_components, ComponentRow};

/// Load all components once on mount. Failures are logged and show as an empty list.
pub fn use_components() -> Resource<Vec<ComponentRow>> {
    use_resource(|| async move {
        let client = api::client();
        fetch_components(client.as_ref()).await
    })
}

/// Cards for each component row.
#[component]
pub fn ComponentList(rows: Vec<ComponentRow>) -> Element {
    rsx! {
        div {
            class: "component-list",
            h2 { "Components" }
            if rows.is_empty() {
                p { class: "component-list__empty", "No components yet." }
            }
            for row in rows {
                div {
                    key: "{row.id}",
                    class: "component-card",
                    div { strong { "Name: " } "{row.name}" }
                    div { strong { "Category: " } {display_or_dash(row.category.as_deref())} }
                    div { strong { "Description: " } {display_or_dash(row.description.as_deref())} }
                    div { strong { "Image URL: " } {display_or_dash(row.image_url.as_deref())} }
                    div { strong { "Quantity: " } "{row.quantity}" }
                }
            }
        }
    }
}
