//! Subject token validation.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use super::claims::Claim;
use super::constants::TokenType;
use super::introspection::TokenValidator;

/// Result of validating the subject token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectTokenValidationResult {
    claims: Option<Vec<Claim>>,
}

impl SubjectTokenValidationResult {
    pub fn success(claims: Vec<Claim>) -> Self {
        Self {
            claims: Some(claims),
        }
    }

    /// Rejected subject token.
    pub fn failure() -> Self {
        Self { claims: None }
    }

    /// Whether the subject token was accepted.
    pub fn is_valid(&self) -> bool {
        self.claims.is_some()
    }

    /// Claims of a valid token, `None` when invalid.
    pub fn claims(&self) -> Option<&[Claim]> {
        self.claims.as_deref()
    }

    /// Claims of an accepted token.
    pub fn into_claims(self) -> Option<Vec<Claim>> {
        self.claims
    }
}

/// Validates the `subject_token` of an exchange request.
#[async_trait]
pub trait SubjectTokenValidator: Send + Sync {
    async fn validate(&self, token: &str, token_type: &str) -> SubjectTokenValidationResult;
}

/// Accepts access tokens issued by this authorization server.
///
/// Other RFC 8693 token types are rejected: only an access token proves the
/// requester previously obtained a token for the subject.
pub struct DefaultSubjectTokenValidator {
    token_validator: Arc<dyn TokenValidator>,
    timeout: Option<Duration>,
}

impl DefaultSubjectTokenValidator {
    pub fn new(token_validator: Arc<dyn TokenValidator>) -> Self {
        Self {
            token_validator,
            timeout: None,
        }
    }

    /// Bound each validation call. A call that does not finish in time
    /// counts as an invalid token.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl SubjectTokenValidator for DefaultSubjectTokenValidator {
    async fn validate(&self, token: &str, token_type: &str) -> SubjectTokenValidationResult {
        if TokenType::from_urn(token_type) != Some(TokenType::AccessToken) {
            warn!(token_type = %token_type, "Received unsupported subject token type");
            return SubjectTokenValidationResult::failure();
        }

        let validation = self.token_validator.validate_access_token(token);
        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, validation).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(
                        timeout_ms = limit.as_millis() as u64,
                        "Subject token validation timed out"
                    );
                    return SubjectTokenValidationResult::failure();
                }
            },
            None => validation.await,
        };

        if result.is_error {
            warn!("Received invalid subject token");
            return SubjectTokenValidationResult::failure();
        }

        SubjectTokenValidationResult::success(result.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::introspection::{StaticTokenValidator, TokenValidationResult};
    use crate::exchange::testing::HangingTokenValidator;

    fn validator() -> DefaultSubjectTokenValidator {
        let tokens = StaticTokenValidator::new().with_token(
            "abc",
            vec![Claim::new("sub", "123"), Claim::new("aud", "api1")],
        );
        DefaultSubjectTokenValidator::new(Arc::new(tokens))
    }

    #[tokio::test]
    async fn test_valid_access_token() {
        let result = validator()
            .validate("abc", TokenType::AccessToken.as_urn())
            .await;

        assert!(result.is_valid());
        assert_eq!(
            result.claims().unwrap(),
            &[Claim::new("sub", "123"), Claim::new("aud", "api1")]
        );
    }

    #[tokio::test]
    async fn test_unsupported_token_types() {
        for token_type in [TokenType::IdToken, TokenType::Jwt, TokenType::RefreshToken] {
            let result = validator().validate("abc", token_type.as_urn()).await;
            assert!(!result.is_valid());
            assert!(result.claims().is_none());
        }

        let result = validator().validate("abc", "urn:example:custom").await;
        assert!(!result.is_valid());
    }

    #[tokio::test]
    async fn test_token_validator_error() {
        let result = validator()
            .validate("unknown", TokenType::AccessToken.as_urn())
            .await;

        assert!(!result.is_valid());
        assert!(result.into_claims().is_none());
    }

    #[tokio::test]
    async fn test_claims_passed_through_unfiltered() {
        struct Echo;

        #[async_trait]
        impl TokenValidator for Echo {
            async fn validate_access_token(&self, token: &str) -> TokenValidationResult {
                TokenValidationResult::success(vec![
                    Claim::new("jti", token),
                    Claim::json("cnf", r#"{"x5t#S256":"abc"}"#),
                ])
            }
        }

        let result = DefaultSubjectTokenValidator::new(Arc::new(Echo))
            .validate("t1", TokenType::AccessToken.as_urn())
            .await;

        assert_eq!(
            result.into_claims().unwrap(),
            vec![
                Claim::new("jti", "t1"),
                Claim::json("cnf", r#"{"x5t#S256":"abc"}"#)
            ]
        );
    }

    #[tokio::test]
    async fn test_hung_validation_times_out() {
        let validator = DefaultSubjectTokenValidator::new(Arc::new(HangingTokenValidator))
            .with_timeout(Duration::from_millis(20));

        let result = validator
            .validate("abc", TokenType::AccessToken.as_urn())
            .await;
        assert!(!result.is_valid());
    }
}
