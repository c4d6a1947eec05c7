use dioxus::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A message shown to the user after an action completes.
#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    fn class(&self) -> &'static str {
        match self.level {
            NoticeLevel::Success => "notice notice--success",
            NoticeLevel::Error => "notice notice--error",
        }
    }
}

/// Log the notice and, in the browser, show it as a blocking alert.
pub fn notify(notice: &Notice) {
    match notice.level {
        NoticeLevel::Success => tracing::info!("{}", notice.message),
        NoticeLevel::Error => tracing::error!("{}", notice.message),
    }
    #[cfg(target_arch = "wasm32")]
    {
        if let Some(window) = web_sys::window() {
            let _ = window.alert_with_message(&notice.message);
        }
    }
}

#[component]
pub fn NoticeBanner(notice: Notice) -> Element {
    rsx! {
        div {
            class: notice.class(),
            role: "status",
            "{notice.message}"
        }
    }
}
