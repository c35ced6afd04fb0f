//! TrustGate error types

use thiserror::Error;

/// TrustGate error type
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid policy configuration (bad regex, malformed argument path).
    /// Raised at policy creation time, never during evaluation.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A tool invocation was denied by policy. Carries the human-readable
    /// reason that is surfaced to the caller as a refusal.
    #[error("Tool invocation denied: {0}")]
    PolicyDenied(String),

    /// An allow policy's required argument was absent from the call.
    /// Display output contains the exact wording policy reasons rely on.
    #[error("Missing required argument: {0}")]
    MissingArgument(String),

    /// A quarantine round exceeded its time budget. Non-fatal: the
    /// coordinator summarizes the partial transcript.
    #[error("Quarantine round timed out after {completed_rounds} completed rounds")]
    QuarantineTimeout { completed_rounds: usize },

    /// LLM provider error
    #[error("Provider error: {0}")]
    Provider(String),

    /// Store error
    #[error("Store error: {0}")]
    Store(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for TrustGate operations
pub type Result<T> = std::result::Result<T, Error>;
