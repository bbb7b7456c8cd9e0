//! Token Exchange (RFC 8693).
//!
//! Validates `urn:ietf:params:oauth:grant-type:token-exchange` requests for a
//! host authorization server:
//! - parse the request parameters into an [`ExchangeRequest`]
//! - validate the subject token and bind it to the requesting client
//! - derive the subject and claims, extending the `act` delegation chain
//!
//! Token decoding and issuance stay with the host.

pub mod claims;
pub mod config;
pub mod constants;
pub mod error;
pub mod grant;
pub mod introspection;
pub mod request;
pub mod subject;
pub mod validator;

#[cfg(test)]
pub(crate) mod testing;

pub use claims::{Actor, Claim, ClaimValueType, ClaimsParser, DefaultClaimsParser};
pub use config::{AudienceCheck, TokenExchangeConfig, TokenExchangeConfigJson};
pub use constants::{TokenType, GRANT_TYPE_TOKEN_EXCHANGE, ISSUED_TOKEN_TYPE};
pub use error::TokenExchangeError;
pub use grant::{
    ClientAuthentication, ExtensionGrantValidator, GrantFailure, GrantResult, GrantSuccess,
    GrantValidationContext, OriginalClientRewrite, RequestPostProcessor,
    TokenExchangeGrantValidator, TokenRequest, INVALID_GRANT,
};
pub use introspection::{StaticTokenValidator, TokenValidationResult, TokenValidator};
pub use request::{DefaultRequestParser, ExchangeRequest, Parameters, RequestParser};
pub use subject::{
    DefaultSubjectTokenValidator, SubjectTokenValidationResult, SubjectTokenValidator,
};
pub use validator::{
    DefaultExchangeRequestValidator, ExchangeRequestValidator, ExchangeValidationResult,
};
