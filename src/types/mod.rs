//! Shared types for Textframe

pub mod error;

pub use error::{Result, TextframeError};
