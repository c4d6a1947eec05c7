//! # API crate: the hosted backend for the inventory front end
//!
//! This crate connects the UI to the Supabase project that owns authentication and
//! the `components` table. It exposes one process-wide client and the pieces it is
//! built from.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | [`SupabaseConfig`] from `inventory.toml` plus `SUPABASE_URL` / `SUPABASE_ANON_KEY` / `AUTH_REDIRECT_URL` |
//! | [`supabase`] | [`SupabaseClient`]: GoTrue auth and PostgREST table access over `reqwest` |
//! | [`persist`] | Session storage (`localStorage` on the web) and the clock |
//!
//! ## The shared client
//!
//! [`client`] returns a lazily created, thread-local `Rc<dyn Backend>`. The first
//! call reads the configuration; when it is missing or invalid the client falls back
//! to an in-memory [`store::MemoryBackend`] and logs a warning, so the UI still
//! renders. [`install_client`] replaces the shared client, which is how tests and
//! previews substitute a fake.

use std::cell::RefCell;
use std::rc::Rc;

use store::{Backend, MemoryBackend};

pub mod config;
pub mod persist;
pub mod supabase;

pub use config::{ConfigError, SupabaseConfig};
pub use supabase::SupabaseClient;

thread_local! {
    static CLIENT: RefCell<Option<Rc<dyn Backend>>> = const { RefCell::new(None) };
}

/// The shared backend client, created on first use.
pub fn client() -> Rc<dyn Backend> {
    CLIENT.with(|slot| slot.borrow_mut().get_or_insert_with(connect).clone())
}

/// Replace the shared client.
pub fn install_client(backend: Rc<dyn Backend>) {
    CLIENT.with(|slot| *slot.borrow_mut() = Some(backend));
}

fn connect() -> Rc<dyn Backend> {
    match SupabaseConfig::from_env() {
        Ok(config) => {
            tracing::info!(url = %config.url, table = %config.table, "Connecting to Supabase");
            Rc::new(SupabaseClient::new(config))
        }
        Err(e) => {
            tracing::warn!("Supabase is not configured ({}), using in-memory backend", e);
            Rc::new(MemoryBackend::new())
        }
    }
}

/// OAuth provider configured for sign-in.
pub fn sign_in_provider() -> String {
    SupabaseConfig::from_env()
        .map(|config| config.provider)
        .unwrap_or_else(|_| store::config::AuthConfig::default().provider)
}
