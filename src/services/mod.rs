//! Domain services used by the HTTP and websocket routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own the notice lifecycle, validation, and alert fan-out so
//! route handlers stay focused on protocol translation and the session gate.

pub mod alert;
pub mod auth;
pub mod banner;
pub mod board;
pub mod draft;
pub mod feed;
pub mod images;
pub mod notice;
pub mod preview;
pub mod session;
pub mod store;
pub mod validation;
