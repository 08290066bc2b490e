//! Shared error helpers and countdown math used across the porch crates.

pub mod countdown;
pub mod error;

pub use error::{Error, FromMessage, Result};
