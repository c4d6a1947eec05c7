//! This crate contains all shared UI for the workspace.

mod navbar;
pub use navbar::Navbar;

mod auth;
pub use auth::{use_user, LoginButton, LogoutButton, UseUser};

mod notice;
pub use notice::{notify, Notice, NoticeBanner, NoticeLevel};

mod component_form;
pub use component_form::ComponentForm;

mod component_list;
pub use component_list::{use_components, ComponentList};
