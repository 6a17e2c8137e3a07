//! Unified error types for the wallet integration core.
//!
//! Detection and refresh failures inside the provider bridge are absorbed
//! into state rather than surfaced here; everything a pipeline caller can
//! observe goes through [`Error`].

/// Result type alias for wallet operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the wallet integration core.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// No wallet provider has been detected in this session.
    #[error("Amadeus provider unavailable")]
    ProviderUnavailable,

    /// An operation required an active account and none is set.
    #[error("wallet must be connected")]
    NotConnected,

    /// The transfer amount failed to parse or was not positive.
    #[error("invalid amount {input:?}: must be a positive number")]
    InvalidAmount {
        /// The rejected user input.
        input: String,
    },

    /// The provider refused or failed to sign a transaction.
    #[error("signing failed: {0}")]
    Signing(String),

    /// An opaque failure surfaced by the provider outside of signing.
    #[error("provider error: {0}")]
    Provider(String),

    /// The node rejected a submitted transaction with a non-2xx response.
    #[error("submission rejected: HTTP {status}: {body}")]
    Submission {
        /// HTTP status code returned by the node.
        status: u16,
        /// Response body, verbatim.
        body: String,
    },

    /// Transport-level failure reaching the node endpoint.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl Error {
    /// Create an invalid-amount error for the given input.
    #[must_use]
    pub fn invalid_amount(input: impl Into<String>) -> Self {
        Self::InvalidAmount {
            input: input.into(),
        }
    }

    /// Create a signing error with a provider-supplied message.
    #[must_use]
    pub fn signing(msg: impl Into<String>) -> Self {
        Self::Signing(msg.into())
    }

    /// Create an opaque provider error.
    #[must_use]
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }
}
