//! Shared utility helpers.

pub mod error;
pub(crate) mod name;

pub use error::{ScreenMatchError, ScreenMatchResult};
