//! Token exchange request validation.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use super::claims::{claim_types, claim_values, first_claim_value, Claim};
use super::config::AudienceCheck;
use super::request::ExchangeRequest;
use super::subject::SubjectTokenValidator;

/// Result of validating an exchange request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeValidationResult {
    error_description: Option<String>,
    claims: Option<Vec<Claim>>,
}

impl ExchangeValidationResult {
    pub fn success(claims: Vec<Claim>) -> Self {
        Self {
            error_description: None,
            claims: Some(claims),
        }
    }

    /// Rejected request with a stable description.
    pub fn failure(error_description: impl Into<String>) -> Self {
        Self {
            error_description: Some(error_description.into()),
            claims: None,
        }
    }

    /// Whether the request was accepted.
    pub fn is_valid(&self) -> bool {
        self.claims.is_some()
    }

    /// OAuth `error_description` for a failed validation.
    pub fn error_description(&self) -> Option<&str> {
        self.error_description.as_deref()
    }

    pub fn claims(&self) -> Option<&[Claim]> {
        self.claims.as_deref()
    }

    pub fn into_claims(self) -> Option<Vec<Claim>> {
        self.claims
    }
}

/// Authorizes a token exchange request.
#[async_trait]
pub trait ExchangeRequestValidator: Send + Sync {
    async fn validate(&self, request: &ExchangeRequest) -> ExchangeValidationResult;
}

/// Requires a valid subject token that the requester legitimately holds.
pub struct DefaultExchangeRequestValidator {
    subject_validator: Arc<dyn SubjectTokenValidator>,
    audience_check: AudienceCheck,
}

impl DefaultExchangeRequestValidator {
    pub fn new(subject_validator: Arc<dyn SubjectTokenValidator>) -> Self {
        Self {
            subject_validator,
            audience_check: AudienceCheck::default(),
        }
    }

    /// Select the ownership rule.
    pub fn with_audience_check(mut self, audience_check: AudienceCheck) -> Self {
        self.audience_check = audience_check;
        self
    }

    /// Whether `client_id` may exchange a token carrying `claims`.
    fn is_recipient(&self, claims: &[Claim], client_id: &str) -> bool {
        if claim_values(claims, claim_types::AUDIENCE).any(|aud| aud == client_id) {
            return true;
        }

        match self.audience_check {
            AudienceCheck::AudienceOrClientId => {
                first_claim_value(claims, claim_types::CLIENT_ID) == Some(client_id)
            }
            AudienceCheck::AudienceOnly => false,
        }
    }
}

#[async_trait]
impl ExchangeRequestValidator for DefaultExchangeRequestValidator {
    async fn validate(&self, request: &ExchangeRequest) -> ExchangeValidationResult {
        let result = self
            .subject_validator
            .validate(request.subject_token(), request.subject_token_type())
            .await;

        let Some(claims) = result.into_claims() else {
            return ExchangeValidationResult::failure("Invalid subject token");
        };

        if !self.is_recipient(&claims, request.client_id()) {
            warn!(
                client_id = %request.client_id(),
                audience_check = ?self.audience_check,
                "Requester is not a recipient of the subject token"
            );
            return ExchangeValidationResult::failure(
                "Requester must be a recipient of the subject token",
            );
        }

        debug!(client_id = %request.client_id(), "Token exchange request validated");
        ExchangeValidationResult::success(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::subject::SubjectTokenValidationResult;
    use crate::exchange::testing::{request_for, FixedSubjectValidator};

    fn validator(result: SubjectTokenValidationResult) -> DefaultExchangeRequestValidator {
        DefaultExchangeRequestValidator::new(Arc::new(FixedSubjectValidator::new(result)))
    }

    #[tokio::test]
    async fn test_subject_validator_called_with_request_token() {
        let subject = Arc::new(FixedSubjectValidator::new(
            SubjectTokenValidationResult::success(vec![Claim::new("aud", "api1")]),
        ));
        let validator = DefaultExchangeRequestValidator::new(subject.clone());

        validator.validate(&request_for("api1")).await;

        let calls = subject.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "abc");
        assert_eq!(calls[0].1, "urn:ietf:params:oauth:token-type:access_token");
    }

    #[tokio::test]
    async fn test_invalid_subject_token() {
        let result = validator(SubjectTokenValidationResult::failure())
            .validate(&request_for("api1"))
            .await;

        assert!(!result.is_valid());
        assert!(result.claims().is_none());
        assert_eq!(result.error_description(), Some("Invalid subject token"));
    }

    #[tokio::test]
    async fn test_wrong_audience() {
        let result = validator(SubjectTokenValidationResult::success(vec![
            Claim::new("sub", "123"),
            Claim::new("aud", "other"),
            Claim::new("client_id", "app9"),
        ]))
        .validate(&request_for("api1"))
        .await;

        assert!(!result.is_valid());
        assert!(result.claims().is_none());
        assert_eq!(
            result.error_description(),
            Some("Requester must be a recipient of the subject token")
        );
    }

    #[tokio::test]
    async fn test_matching_audience_among_many() {
        let claims = vec![
            Claim::new("sub", "123"),
            Claim::new("name", "alice"),
            Claim::new("aud", "api4"),
            Claim::new("aud", "api1"),
        ];
        let result = validator(SubjectTokenValidationResult::success(claims.clone()))
            .validate(&request_for("api1"))
            .await;

        assert!(result.is_valid());
        assert_eq!(result.error_description(), None);
        assert_eq!(result.into_claims(), Some(claims));
    }

    #[tokio::test]
    async fn test_matching_client_id() {
        let claims = vec![Claim::new("sub", "123"), Claim::new("client_id", "api1")];
        let result = validator(SubjectTokenValidationResult::success(claims.clone()))
            .validate(&request_for("api1"))
            .await;

        assert!(result.is_valid());
        assert_eq!(result.claims(), Some(&claims[..]));
    }

    #[tokio::test]
    async fn test_audience_only_ignores_client_id() {
        let claims = vec![Claim::new("sub", "123"), Claim::new("client_id", "api1")];
        let result = validator(SubjectTokenValidationResult::success(claims.clone()))
            .with_audience_check(AudienceCheck::AudienceOnly)
            .validate(&request_for("api1"))
            .await;
        assert!(!result.is_valid());

        let claims = vec![Claim::new("sub", "123"), Claim::new("aud", "api1")];
        let result = validator(SubjectTokenValidationResult::success(claims))
            .with_audience_check(AudienceCheck::AudienceOnly)
            .validate(&request_for("api1"))
            .await;
        assert!(result.is_valid());
    }
}
