//! Shared fixtures for exchange tests.

use async_trait::async_trait;
use std::sync::Mutex;

use super::constants::{params, TokenType, GRANT_TYPE_TOKEN_EXCHANGE};
use super::introspection::{TokenValidationResult, TokenValidator};
use super::request::{ExchangeRequest, Parameters};
use super::subject::{SubjectTokenValidationResult, SubjectTokenValidator};

/// Minimal valid parameters for subject token "abc".
pub fn exchange_params() -> Parameters {
    [
        (params::GRANT_TYPE, GRANT_TYPE_TOKEN_EXCHANGE),
        (params::SUBJECT_TOKEN, "abc"),
        (params::SUBJECT_TOKEN_TYPE, TokenType::AccessToken.as_urn()),
    ]
    .into_iter()
    .collect()
}

/// Request for subject token "abc" made by `client_id`.
pub fn request_for(client_id: &str) -> ExchangeRequest {
    ExchangeRequest::parse(client_id, &exchange_params()).unwrap()
}

/// Subject validator returning a canned result and recording its inputs.
pub struct FixedSubjectValidator {
    result: SubjectTokenValidationResult,
    calls: Mutex<Vec<(String, String)>>,
}

impl FixedSubjectValidator {
    pub fn new(result: SubjectTokenValidationResult) -> Self {
        Self {
            result,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SubjectTokenValidator for FixedSubjectValidator {
    async fn validate(&self, token: &str, token_type: &str) -> SubjectTokenValidationResult {
        self.calls
            .lock()
            .unwrap()
            .push((token.to_string(), token_type.to_string()));
        self.result.clone()
    }
}

/// Token validator that never answers.
pub struct HangingTokenValidator;

#[async_trait]
impl TokenValidator for HangingTokenValidator {
    async fn validate_access_token(&self, _token: &str) -> TokenValidationResult {
        std::future::pending().await
    }
}
