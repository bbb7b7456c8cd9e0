//! Token exchange errors.
//!
//! These cover malformed input only. Expected validation outcomes (bad
//! token, ownership mismatch, missing subject) are result values.

use thiserror::Error;

/// Errors raised while parsing a token exchange request or its claims.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenExchangeError {
    /// The request is structurally malformed.
    #[error("{0}")]
    InvalidRequest(String),

    /// The subject claim is ambiguous.
    #[error("{0}")]
    SubjectParsing(String),

    /// An existing `act` claim cannot be extended.
    #[error("{0}")]
    MalformedActor(String),
}

impl TokenExchangeError {
    /// Stable name of the error kind, used in error descriptions.
    pub fn kind(&self) -> &'static str {
        match self {
            TokenExchangeError::InvalidRequest(_) => "InvalidRequestError",
            TokenExchangeError::SubjectParsing(_) => "SubjectParsingError",
            TokenExchangeError::MalformedActor(_) => "MalformedActorError",
        }
    }

    pub(crate) fn invalid_request(desc: impl Into<String>) -> Self {
        TokenExchangeError::InvalidRequest(desc.into())
    }
}
