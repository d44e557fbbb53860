//! Core entity definitions for snooze.
//!
//! This crate defines the plain data types mirrored from the news API: users,
//! stories, the story list aggregate, and the payloads sent when creating or
//! updating them. Nothing here performs I/O; network operations live in
//! `news_api`.

mod host;
mod story;
mod user;

pub use host::*;
pub use story::*;
pub use user::*;
