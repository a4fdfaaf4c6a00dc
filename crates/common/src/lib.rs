//! Shared types for the resume-analysis client workspace

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
