use thiserror::Error;

use crate::domain::Method;

/// Rejections raised locally before any request leaves the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no text provided")]
    EmptyInput,
    #[error("text too long: {length} characters exceeds the {limit} limit")]
    InputTooLong { length: usize, limit: usize },
    #[error("a password is required for the {0} method")]
    MissingSecret(Method),
}

/// Normalized failure classes for calls to the processing service. Every
/// gateway call resolves to a success payload or exactly one of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The service could not be reached at all.
    #[error("cannot reach the processing service: {0}")]
    Transport(String),
    /// The service was reached but reported a failure, returned a
    /// non-success status, or produced an unreadable reply.
    #[error("{0}")]
    Application(String),
}
