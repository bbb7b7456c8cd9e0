//! Token validation capability supplied by the host.
//!
//! The exchange pipeline never decodes tokens itself. The host plugs in
//! whatever already validates its access tokens (JWT verification,
//! introspection endpoint, reference token store) behind [`TokenValidator`].

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;

use super::claims::Claim;

/// Outcome of validating an access token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenValidationResult {
    /// The token was rejected.
    pub is_error: bool,
    /// Claims carried by the token.
    pub claims: Vec<Claim>,
}

impl TokenValidationResult {
    /// Accepted token with its claims.
    pub fn success(claims: Vec<Claim>) -> Self {
        Self {
            is_error: false,
            claims,
        }
    }

    /// Rejected token, no claims.
    pub fn error() -> Self {
        Self {
            is_error: true,
            claims: Vec::new(),
        }
    }
}

/// Validates access tokens previously issued by the authorization server.
#[async_trait]
pub trait TokenValidator: Send + Sync {
    /// Validate `token` and return its claims.
    async fn validate_access_token(&self, token: &str) -> TokenValidationResult;
}

/// Token validator backed by a fixed token → claims table.
///
/// Unknown tokens are reported as errors.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct StaticTokenValidator {
    tokens: HashMap<String, Vec<Claim>>,
}

impl StaticTokenValidator {
    /// Empty table; every token is rejected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `token` with the claims it carries.
    pub fn with_token(mut self, token: impl Into<String>, claims: Vec<Claim>) -> Self {
        self.tokens.insert(token.into(), claims);
        self
    }

    /// Load from a JSON object mapping tokens to claim lists.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Number of known tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether no tokens are known.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl TokenValidator for StaticTokenValidator {
    async fn validate_access_token(&self, token: &str) -> TokenValidationResult {
        match self.tokens.get(token) {
            Some(claims) => TokenValidationResult::success(claims.clone()),
            None => TokenValidationResult::error(),
        }
    }
}
