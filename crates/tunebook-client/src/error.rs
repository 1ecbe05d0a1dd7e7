use tunebook_types::WireError;

use crate::catalog::Method;

/// Failures of the call itself. A backend answering `false` or "absent" is
/// not an error and never shows up here.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("{method}: transport failure: {source}")]
    Transport {
        method: Method,
        #[source]
        source: reqwest::Error,
    },

    #[error("{method}: rejected by backend (code {code}): {message}")]
    Rejected {
        method: Method,
        code: u32,
        message: String,
    },

    #[error("{method}: could not encode arguments: {source}")]
    Encode {
        method: Method,
        #[source]
        source: WireError,
    },

    #[error("{method}: could not decode reply: {source}")]
    Decode {
        method: Method,
        #[source]
        source: WireError,
    },

    #[error("{method}: expected {expected} arguments, got {got}")]
    ArgumentCount {
        method: Method,
        expected: usize,
        got: usize,
    },

    #[error("{0}: no principal is signed in")]
    SignedOut(Method),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ClientError {
    pub fn method(&self) -> Option<Method> {
        match self {
            ClientError::Transport { method, .. }
            | ClientError::Rejected { method, .. }
            | ClientError::Encode { method, .. }
            | ClientError::Decode { method, .. }
            | ClientError::ArgumentCount { method, .. }
            | ClientError::SignedOut(method) => Some(*method),
            ClientError::Config(_) => None,
        }
    }

    /// Connectivity failures on queries are the only ones worth offering a
    /// retry for; updates may already have been applied.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Transport { method, source } => {
                method.class().is_retry_safe() && (source.is_connect() || source.is_timeout())
            }
            _ => false,
        }
    }
}
