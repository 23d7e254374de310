//! Shared utilities and error types

pub mod error;
mod subscribers;

pub use error::{EngineError, LoadError, ObservationError, PageError, Precondition, Result, ScriptError};
pub use subscribers::Subscribers;
