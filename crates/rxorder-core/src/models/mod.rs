//! Domain models for the prescription ordering client.

mod order;
mod user;

pub use order::*;
pub use user::*;
