//! Client for the Hack-or-Snooze news API.
//!
//! This crate provides:
//! - Wire types for every endpoint
//! - The [`NewsApi`] transport trait with HTTP and in-memory backends
//! - [`NewsClient`], the session/domain model that keeps users, stories and
//!   the story list reconciled with server responses

mod api;
mod client;
mod error;
mod http;
mod memory;
mod requests;
mod responses;

pub use api::*;
pub use client::*;
pub use error::{ApiError, ApiResult};
pub use http::*;
pub use memory::*;
pub use requests::*;
pub use responses::*;
