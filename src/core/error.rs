//! Error handling for the update orchestrator.
//!
//! The error system follows two rules laid out in the orchestrator's design:
//!
//! 1. **Check operations never fail for recoverable conditions.** A status
//!    probe that dies or a release API that is unreachable degrades to a
//!    `warning` field on the returned status so the dashboard keeps working.
//! 2. **Mutating operations return structured results for operational
//!    problems.** A failed `openclaw update` or a network error during
//!    staging surfaces as an `ok: false` result with a human-readable
//!    message; `Err` is reserved for programmer-error-shaped input such as
//!    a malformed repository string.
//!
//! [`UpdateError`] is the typed taxonomy behind both rules. Call sites that
//! need to degrade an error into a warning format it with `to_string()`.

use thiserror::Error;

/// All failure modes of the update/rollback core.
#[derive(Error, Debug)]
pub enum UpdateError {
    /// Input rejected before any external call was made.
    ///
    /// Covers malformed `owner/repo` strings and similar caller mistakes.
    #[error("{message}")]
    Validation {
        /// Why the input was rejected.
        message: String,
    },

    /// The release-hosting API answered with a non-2xx status.
    #[error("release API request failed ({status}): {message}")]
    ReleaseApi {
        /// HTTP status code returned by the API.
        status: u16,
        /// Response body or status text, truncated for display.
        message: String,
    },

    /// No release exists for the requested tag, after trying both
    /// `v`-prefix variants.
    #[error("no release found for {repo}@{tag}")]
    ReleaseNotFound {
        /// Repository that was queried.
        repo: String,
        /// Tag as originally requested.
        tag: String,
    },

    /// The release API answered 2xx but the payload was not usable.
    #[error("unexpected release payload: {reason}")]
    ReleasePayload {
        /// What was missing or malformed.
        reason: String,
    },

    /// An external CLI invocation exited non-zero.
    #[error("command failed: {command}")]
    CommandFailed {
        /// The command line that failed.
        command: String,
        /// Captured stderr (stdout if stderr was empty).
        stderr: String,
    },

    /// An external CLI invocation exceeded its timeout.
    #[error("command timed out after {seconds}s: {command}")]
    CommandTimeout {
        /// The command line that timed out.
        command: String,
        /// The timeout that was exceeded.
        seconds: u64,
    },

    /// The operation is only meaningful on Linux hosts.
    #[error("{operation} is only supported on Linux")]
    PlatformUnsupported {
        /// The operation that was refused.
        operation: String,
    },

    /// Filesystem error while reading or writing local state.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Transport-level HTTP error.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// JSON (de)serialization error for marker files and API payloads.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl UpdateError {
    /// Shorthand for a [`UpdateError::Validation`] error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, UpdateError>;
