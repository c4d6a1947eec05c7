pub mod backend;
pub mod config;
pub mod draft;
pub mod models;
pub mod session;

mod memory;
pub use memory::MemoryBackend;

pub use backend::{
    fetch_components, AuthCallback, AuthChangeEvent, AuthListeners, AuthSource, Backend,
    ComponentTable, RemoteError, Subscription,
};
pub use config::InventoryConfig;
pub use draft::{ComponentDraft, DraftField, DraftForm, Phase, SubmitError, SubmitOutcome};
pub use models::{ComponentRow, Identity, NewComponent, Session};
pub use session::{SessionProjector, SessionState};
