use dioxus::prelude::*;
use store::{ComponentTable, DraftField, DraftForm, SubmitOutcome};

use crate::notice::{notify, Notice, NoticeBanner, NoticeLevel};

/// Form for adding a component to the inventory.
///
/// Submitting is blocked while the name is empty or a previous submit is still
/// pending. The draft is cleared only after the insert succeeds.
#[component]
pub fn ComponentForm(#[props(default)] on_saved: EventHandler<()>) -> Element {
    let mut form = use_signal(DraftForm::new);
    let mut notice = use_signal(|| Option::<Notice>::None);

    let handle_submit = move |evt: FormEvent| {
        evt.prevent_default();
        if !form.read().missing_required().is_empty() {
            notice.set(Some(Notice::new(NoticeLevel::Error, "Name is required")));
            return;
        }
        let row = match form.write().begin_submit() {
            Ok(row) => row,
            Err(e) => {
                tracing::debug!("Ignoring submit: {}", e);
                return;
            }
        };
        notice.set(None);
        spawn(async move {
            let result = api::client().insert(&row).await;
            let outcome = form.write().finish_submit(result);
            let message = match outcome {
                SubmitOutcome::Saved => {
                    on_saved.call(());
                    Notice::new(NoticeLevel::Success, "Component inserted successfully!")
                }
                SubmitOutcome::Failed(e) => {
                    Notice::new(NoticeLevel::Error, format!("Insert failed: {}", e))
                }
            };
            notify(&message);
            notice.set(Some(message));
        });
    };

    let draft = form.read().draft().clone();
    let submitting = form.read().is_submitting();

    rsx! {
        form {
            class: "component-form",
            onsubmit: handle_submit,

            if let Some(n) = notice() {
                NoticeBanner { notice: n }
            }

            input {
                r#type: "text",
                name: DraftField::Name.as_str(),
                placeholder: "Name",
                required: true,
                value: "{draft.name}",
                oninput: move |evt: FormEvent| form.write().update(DraftField::Name, &evt.value()),
            }
            input {
                r#type: "text",
                name: DraftField::Category.as_str(),
                placeholder: "Category",
                value: "{draft.category}",
                oninput: move |evt: FormEvent| form.write().update(DraftField::Category, &evt.value()),
            }
            textarea {
                name: DraftField::Description.as_str(),
                placeholder: "Description",
                value: "{draft.description}",
                oninput: move |evt: FormEvent| form.write().update(DraftField::Description, &evt.value()),
            }
            input {
                r#type: "text",
                name: DraftField::ImageUrl.as_str(),
                placeholder: "Image URL",
                value: "{draft.image_url}",
                oninput: move |evt: FormEvent| form.write().update(DraftField::ImageUrl, &evt.value()),
            }
            input {
                r#type: "number",
                name: DraftField::Quantity.as_str(),
                placeholder: "Quantity",
                required: true,
                value: "{draft.quantity}",
                oninput: move |evt: FormEvent| form.write().update(DraftField::Quantity, &evt.value()),
            }

            button {
                r#type: "submit",
                disabled: submitting,
                if submitting { "Saving..." } else { "Add Component" }
            }
        }
    }
}
