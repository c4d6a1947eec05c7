//! Session persistence and clock access.
//!
//! In the browser the session lives in `localStorage` under [`STORAGE_KEY`] so a
//! reload keeps the user signed in, and the OAuth redirect fragment is read from
//! `window.location`. Native builds keep the session in memory only.

use store::Session;

pub const STORAGE_KEY: &str = "sb-auth-token";

/// Current Unix time in seconds.
#[cfg(target_arch = "wasm32")]
pub fn now_secs() -> i64 {
    (js_sys::Date::now() / 1000.0) as i64
}

#[cfg(not(target_arch = "wasm32"))]
pub fn now_secs() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(target_arch = "wasm32")]
fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok().flatten()
}

#[cfg(target_arch = "wasm32")]
pub fn load_session() -> Option<Session> {
    let raw = local_storage()?.get_item(STORAGE_KEY).ok().flatten()?;
    match serde_json::from_str(&raw) {
        Ok(session) => Some(session),
        Err(e) => {
            tracing::warn!("Discarding unreadable stored session: {}", e);
            None
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub fn save_session(session: Option<&Session>) {
    let Some(storage) = local_storage() else {
        return;
    };
    let result = match session {
        Some(session) => match serde_json::to_string(session) {
            Ok(raw) => storage.set_item(STORAGE_KEY, &raw),
            Err(e) => {
                tracing::error!("Failed to serialize session: {}", e);
                return;
            }
        },
        None => storage.remove_item(STORAGE_KEY),
    };
    if result.is_err() {
        tracing::warn!("Failed to update stored session");
    }
}

/// The current page URL if it carries an OAuth redirect fragment.
/// The fragment is removed from the address bar once read.
#[cfg(target_arch = "wasm32")]
pub fn take_redirect_url() -> Option<String> {
    let window = web_sys::window()?;
    let location = window.location();
    let hash = location.hash().ok()?;
    if !hash.contains("access_token=") && !hash.contains("error=") {
        return None;
    }
    let href = location.href().ok()?;
    let clean = href.split('#').next().unwrap_or_default().to_string();
    if let Ok(history) = window.history() {
        let _ = history.replace_state_with_url(&wasm_bindgen::JsValue::NULL, "", Some(&clean));
    }
    Some(href)
}

#[cfg(not(target_arch = "wasm32"))]
pub fn load_session() -> Option<Session> {
    None
}

#[cfg(not(target_arch = "wasm32"))]
pub fn save_session(_session: Option<&Session>) {}

#[cfg(not(target_arch = "wasm32"))]
pub fn take_redirect_url() -> Option<String> {
    None
}
