//! # Record write path
//!
//! [`ComponentDraft`] is the form's local copy of a component being entered. It is
//! edited one field at a time with [`ComponentDraft::update`], which never fails:
//! the quantity is parsed from text and falls back to `0` when the text is not an
//! integer.
//!
//! [`DraftForm`] wraps the draft with a [`Phase`] and drives the single insert:
//!
//! | Step | Effect |
//! |------|--------|
//! | [`begin_submit`](DraftForm::begin_submit) | `Editing` → `Submitting`, returns the payload. Rejected with [`SubmitError::InFlight`] while a submit is pending. |
//! | [`finish_submit`](DraftForm::finish_submit) | Back to `Editing`. Success resets the draft; failure keeps it. |
//! | [`submit`](DraftForm::submit) | Both of the above around one [`ComponentTable::insert`]. |
//!
//! Required fields are checked by [`DraftForm::missing_required`]; blocking the
//! submit button is up to the form.

use std::fmt;
use std::str::FromStr;

use crate::backend::{ComponentTable, RemoteError};
use crate::models::NewComponent;

/// A field of the component form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DraftField {
    Name,
    Category,
    Description,
    ImageUrl,
    Quantity,
}

impl DraftField {
    pub const ALL: [DraftField; 5] = [
        DraftField::Name,
        DraftField::Category,
        DraftField::Description,
        DraftField::ImageUrl,
        DraftField::Quantity,
    ];

    /// Column name, also used as the input's `name` attribute.
    pub fn as_str(&self) -> &'static str {
        match self {
            DraftField::Name => "name",
            DraftField::Category => "category",
            DraftField::Description => "description",
            DraftField::ImageUrl => "image_url",
            DraftField::Quantity => "quantity",
        }
    }

    pub fn is_required(&self) -> bool {
        matches!(self, DraftField::Name | DraftField::Quantity)
    }
}

impl fmt::Display for DraftField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown field: {0}")]
pub struct UnknownField(pub String);

impl FromStr for DraftField {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DraftField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}

/// Form contents for a component that has not been saved yet.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ComponentDraft {
    pub name: String,
    pub category: String,
    pub description: String,
    pub image_url: String,
    pub quantity: i64,
}

impl ComponentDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace exactly `field` with `raw`, leaving every other field as it was.
    pub fn update(&mut self, field: DraftField, raw: &str) {
        match field {
            DraftField::Name => self.name = raw.to_string(),
            DraftField::Category => self.category = raw.to_string(),
            DraftField::Description => self.description = raw.to_string(),
            DraftField::ImageUrl => self.image_url = raw.to_string(),
            DraftField::Quantity => self.quantity = parse_quantity(raw),
        }
    }

    /// Text shown in the input for `field`.
    pub fn value(&self, field: DraftField) -> String {
        match field {
            DraftField::Name => self.name.clone(),
            DraftField::Category => self.category.clone(),
            DraftField::Description => self.description.clone(),
            DraftField::ImageUrl => self.image_url.clone(),
            DraftField::Quantity => self.quantity.to_string(),
        }
    }

    /// Insert payload. Empty optional fields become `None`.
    pub fn to_new_component(&self) -> NewComponent {
        NewComponent {
            name: self.name.clone(),
            category: non_empty(&self.category),
            description: non_empty(&self.description),
            image_url: non_empty(&self.image_url),
            quantity: self.quantity,
        }
    }
}

/// Integer quantity from form text; anything that isn't an integer is 0.
pub fn parse_quantity(raw: &str) -> i64 {
    raw.trim().parse().unwrap_or(0)
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Editing,
    Submitting,
}

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum SubmitError {
    #[error("a submission is already in progress")]
    InFlight,
    #[error("insert failed: {0}")]
    Remote(#[from] RemoteError),
}

/// Result of a finished submission, for the form's notification.
#[derive(Clone, Debug, PartialEq)]
pub enum SubmitOutcome {
    Saved,
    Failed(RemoteError),
}

/// A draft plus its submission phase.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DraftForm {
    draft: ComponentDraft,
    phase: Phase,
}

impl DraftForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &ComponentDraft {
        &self.draft
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_submitting(&self) -> bool {
        self.phase == Phase::Submitting
    }

    pub fn update(&mut self, field: DraftField, raw: &str) {
        self.draft.update(field, raw);
    }

    /// Required fields that are still empty.
    ///
    /// Stricter than the browser's `required` attribute: a name made only of
    /// whitespace counts as missing.
    pub fn missing_required(&self) -> Vec<DraftField> {
        let mut missing = Vec::new();
        if self.draft.name.trim().is_empty() {
            missing.push(DraftField::Name);
        }
        missing
    }

    /// Enter `Submitting` and hand out the payload to insert.
    pub fn begin_submit(&mut self) -> Result<NewComponent, SubmitError> {
        if self.is_submitting() {
            return Err(SubmitError::InFlight);
        }
        self.phase = Phase::Submitting;
        Ok(self.draft.to_new_component())
    }

    /// Apply the insert result and return to `Editing`.
    pub fn finish_submit(&mut self, result: Result<(), RemoteError>) -> SubmitOutcome {
        self.phase = Phase::Editing;
        match result {
            Ok(()) => {
                self.draft = ComponentDraft::default();
                tracing::info!("Component inserted");
                SubmitOutcome::Saved
            }
            Err(e) => {
                tracing::error!("Insert failed: {}", e);
                SubmitOutcome::Failed(e)
            }
        }
    }

    /// Insert the current draft into `table`.
    pub async fn submit<T: ComponentTable + ?Sized>(
        &mut self,
        table: &T,
    ) -> Result<(), SubmitError> {
        let row = self.begin_submit()?;
        let result = table.insert(&row).await;
        match self.finish_submit(result) {
            SubmitOutcome::Saved => Ok(()),
            SubmitOutcome::Failed(e) => Err(SubmitError::Remote(e)),
        }
    }
}
