//! Typed endpoint calls on top of [`ApiClient`](crate::http::ApiClient).

mod auth;
mod orders;

pub use auth::*;
pub use orders::*;
