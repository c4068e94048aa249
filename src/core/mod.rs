//! Core types shared across the orchestrator: the error taxonomy and the
//! result envelopes every operation returns.

pub mod error;
pub mod result;

pub use error::{Result, UpdateError};
pub use result::{MutationResult, UpdateStatus};
