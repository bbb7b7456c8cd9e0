//! Token exchange extension grant (RFC 8693).
//!
//! The host authorization server drives this through [`ExtensionGrantValidator`]:
//! it hands over the token request, the grant parses and authorizes it, and
//! the outcome is written back to the context for the host to issue (or
//! refuse) the new token.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::claims::{claim_types, first_claim_value, Claim, ClaimsParser, DefaultClaimsParser};
use super::config::TokenExchangeConfig;
use super::constants::{TokenType, GRANT_TYPE_TOKEN_EXCHANGE, ISSUED_TOKEN_TYPE};
use super::error::TokenExchangeError;
use super::introspection::TokenValidator;
use super::request::{DefaultRequestParser, Parameters, RequestParser};
use super::subject::DefaultSubjectTokenValidator;
use super::validator::{DefaultExchangeRequestValidator, ExchangeRequestValidator};

/// OAuth error code used for every rejected exchange.
pub const INVALID_GRANT: &str = "invalid_grant";

/// How the client authenticated at the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientAuthentication {
    /// e.g. "client_secret_basic", "private_key_jwt".
    pub method: String,
}

/// The host's token request.
#[derive(Debug, Clone)]
pub struct TokenRequest {
    /// Client making the request. May be rewritten after a successful exchange.
    pub client_id: String,
    /// Raw request parameters.
    pub raw: Parameters,
    /// `None` when the client did not authenticate.
    pub client_authentication: Option<ClientAuthentication>,
}

/// Outcome of an extension grant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GrantResult {
    Success(GrantSuccess),
    Failure(GrantFailure),
}

impl GrantResult {
    pub fn is_success(&self) -> bool {
        matches!(self, GrantResult::Success(_))
    }
}

/// What the host needs to issue the exchanged token.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrantSuccess {
    pub subject: String,
    pub authentication_method: String,
    pub claims: Vec<Claim>,
    /// Extra token response parameters.
    pub custom_response: BTreeMap<String, serde_json::Value>,
}

/// Token error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GrantFailure {
    pub error: String,
    pub error_description: String,
}

impl GrantFailure {
    pub fn invalid_grant(desc: impl Into<String>) -> Self {
        Self {
            error: INVALID_GRANT.to_string(),
            error_description: desc.into(),
        }
    }
}

/// Request and result slot shared with the host.
#[derive(Debug, Clone)]
pub struct GrantValidationContext {
    pub request: TokenRequest,
    pub result: Option<GrantResult>,
}

impl GrantValidationContext {
    pub fn new(request: TokenRequest) -> Self {
        Self {
            request,
            result: None,
        }
    }
}

/// Contract between a host authorization server and a custom grant type.
#[async_trait]
pub trait ExtensionGrantValidator: Send + Sync {
    /// The `grant_type` value this validator handles.
    fn grant_type(&self) -> &str;

    /// Validate the request and store the outcome in `context.result`.
    async fn validate(&self, context: &mut GrantValidationContext);
}

/// Adjusts the host's request after a successful exchange.
pub trait RequestPostProcessor: Send + Sync {
    fn update_request(&self, request: &mut TokenRequest, claims: &[Claim]);
}

/// Makes the host record the subject token's original client as the
/// requesting client of the issued token, instead of the exchange caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct OriginalClientRewrite;

impl RequestPostProcessor for OriginalClientRewrite {
    fn update_request(&self, request: &mut TokenRequest, claims: &[Claim]) {
        match first_claim_value(claims, claim_types::CLIENT_ID) {
            Some(client_id) => {
                if request.client_id != client_id {
                    debug!(
                        from = %request.client_id,
                        to = %client_id,
                        "Rewriting token request client_id"
                    );
                    request.client_id = client_id.to_string();
                }
            }
            None => warn!("No client_id claim to rewrite token request with"),
        }
    }
}

/// The token exchange grant: parse, validate, then derive subject and claims.
pub struct TokenExchangeGrantValidator {
    parser: Arc<dyn RequestParser>,
    validator: Arc<dyn ExchangeRequestValidator>,
    claims_parser: Arc<dyn ClaimsParser>,
    post_processor: Option<Arc<dyn RequestPostProcessor>>,
    log_exchanges: bool,
}

impl TokenExchangeGrantValidator {
    pub fn new(
        parser: Arc<dyn RequestParser>,
        validator: Arc<dyn ExchangeRequestValidator>,
        claims_parser: Arc<dyn ClaimsParser>,
    ) -> Self {
        Self {
            parser,
            validator,
            claims_parser,
            post_processor: None,
            log_exchanges: false,
        }
    }

    /// Wire the default pipeline around the host's token validator.
    pub fn from_config(
        config: &TokenExchangeConfig,
        token_validator: Arc<dyn TokenValidator>,
    ) -> Self {
        let subject_validator = DefaultSubjectTokenValidator::new(token_validator)
            .with_timeout(config.introspection_timeout());
        let validator = DefaultExchangeRequestValidator::new(Arc::new(subject_validator))
            .with_audience_check(config.audience_check);

        let grant = Self::new(
            Arc::new(DefaultRequestParser),
            Arc::new(validator),
            Arc::new(DefaultClaimsParser),
        )
        .with_exchange_logging(config.log_exchanges);

        if config.rewrite_client_id {
            grant.with_post_processor(Arc::new(OriginalClientRewrite))
        } else {
            grant
        }
    }

    /// Run `post_processor` on the host request after each successful exchange.
    pub fn with_post_processor(mut self, post_processor: Arc<dyn RequestPostProcessor>) -> Self {
        self.post_processor = Some(post_processor);
        self
    }

    /// Log request details for every exchange.
    pub fn with_exchange_logging(mut self, enabled: bool) -> Self {
        self.log_exchanges = enabled;
        self
    }

    async fn exchange(&self, token_request: &TokenRequest) -> Result<GrantSuccess, GrantFailure> {
        let request = self
            .parser
            .parse(&token_request.client_id, &token_request.raw)
            .map_err(|e| GrantFailure::invalid_grant(e.to_string()))?;

        if self.log_exchanges {
            debug!(
                subject_token_type = %request.subject_token_type(),
                requested_token_type = ?request.requested_token_type(),
                audience = ?request.audience(),
                resource = ?request.resource(),
                scope = ?request.scope(),
                has_actor_token = request.actor_token().is_some(),
                "Processing token exchange"
            );
        }

        let validation = self.validator.validate(&request).await;
        if !validation.is_valid() {
            debug!(reason = ?validation.error_description(), "Token exchange validation failed");
        }
        let claims = validation
            .into_claims()
            .ok_or_else(|| GrantFailure::invalid_grant("Invalid subject token"))?;

        let to_failure = |e: TokenExchangeError| {
            GrantFailure::invalid_grant(format!("Unable to generate claims. {} - {}", e.kind(), e))
        };
        let subject = self
            .claims_parser
            .parse_subject(&claims, &request)
            .map_err(to_failure)?;
        let claims = self
            .claims_parser
            .parse_claims(claims, &request)
            .map_err(to_failure)?;

        let subject = subject.ok_or_else(|| {
            GrantFailure::invalid_grant(
                "Unable to parse subject claim - subject claim is required for token exchange",
            )
        })?;

        let mut custom_response = BTreeMap::new();
        custom_response.insert(
            ISSUED_TOKEN_TYPE.to_string(),
            serde_json::Value::String(TokenType::AccessToken.as_urn().to_string()),
        );

        Ok(GrantSuccess {
            subject,
            authentication_method: GRANT_TYPE_TOKEN_EXCHANGE.to_string(),
            claims,
            custom_response,
        })
    }
}

#[async_trait]
impl ExtensionGrantValidator for TokenExchangeGrantValidator {
    fn grant_type(&self) -> &str {
        GRANT_TYPE_TOKEN_EXCHANGE
    }

    async fn validate(&self, context: &mut GrantValidationContext) {
        let span = info_span!(
            "token_exchange",
            request_id = %Uuid::new_v4(),
            client_id = %context.request.client_id
        );

        async {
            if context.request.client_authentication.is_none() {
                info!("Received unauthenticated token exchange request");
            }

            let result = match self.exchange(&context.request).await {
                Ok(success) => {
                    if let Some(post_processor) = &self.post_processor {
                        post_processor.update_request(&mut context.request, &success.claims);
                    }
                    info!(subject = %success.subject, "Token exchange successful");
                    GrantResult::Success(success)
                }
                Err(failure) => {
                    warn!(
                        error_description = %failure.error_description,
                        "Token exchange rejected"
                    );
                    GrantResult::Failure(failure)
                }
            };

            context.result = Some(result);
        }
        .instrument(span)
        .await
    }
}
