//! Token exchange request parsing (RFC 8693 §2.1).

use super::constants::{params, GRANT_TYPE_TOKEN_EXCHANGE};
use super::error::TokenExchangeError;

/// Parameters that RFC 6749 §3.2 forbids from appearing more than once.
const SINGLE_VALUED: [&str; 7] = [
    params::GRANT_TYPE,
    params::SUBJECT_TOKEN,
    params::SUBJECT_TOKEN_TYPE,
    params::ACTOR_TOKEN,
    params::ACTOR_TOKEN_TYPE,
    params::REQUESTED_TOKEN_TYPE,
    params::SCOPE,
];

/// Raw token request parameters, in arrival order.
///
/// A name may occur more than once (e.g. several `resource` values).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameters(Vec<(String, String)>);

impl Parameters {
    /// Empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a form-urlencoded request body.
    pub fn from_form(body: &str) -> Result<Self, TokenExchangeError> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(body).map_err(|e| {
            TokenExchangeError::invalid_request(format!("Invalid request body: {}", e))
        })?;
        Ok(Self(pairs))
    }

    /// Append a parameter, keeping any earlier values for the same name.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    /// First value supplied for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Every value supplied for `name`.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter(move |(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Number of parameters, counting repeats.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no parameters were supplied.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// A structurally valid token exchange request.
///
/// Only constructed through [`ExchangeRequest::parse`], so the grant type is
/// always the token exchange URN, the subject token and its type are never
/// blank, and the actor token and its type are either both set or both unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeRequest {
    client_id: String,
    grant_type: String,
    resource: Option<String>,
    audience: Option<String>,
    scope: Option<Vec<String>>,
    requested_token_type: Option<String>,
    subject_token: String,
    subject_token_type: String,
    actor_token: Option<String>,
    actor_token_type: Option<String>,
}

impl ExchangeRequest {
    /// Parse the request made by `client_id`.
    pub fn parse(client_id: &str, parameters: &Parameters) -> Result<Self, TokenExchangeError> {
        if client_id.trim().is_empty() {
            return Err(TokenExchangeError::invalid_request(
                "Token exchange request must identify the requesting client",
            ));
        }

        for name in SINGLE_VALUED {
            if parameters.get_all(name).count() > 1 {
                return Err(TokenExchangeError::invalid_request(format!(
                    "Token exchange request must not repeat the {} parameter",
                    name
                )));
            }
        }

        let grant_type = parameters.get(params::GRANT_TYPE);
        if grant_type != Some(GRANT_TYPE_TOKEN_EXCHANGE) {
            return Err(TokenExchangeError::invalid_request(format!(
                "Token exchange request must have grant type of {}",
                GRANT_TYPE_TOKEN_EXCHANGE
            )));
        }

        let subject_token = non_blank(parameters.get(params::SUBJECT_TOKEN)).ok_or_else(|| {
            TokenExchangeError::invalid_request("Token exchange request must contain subject token")
        })?;

        let subject_token_type =
            non_blank(parameters.get(params::SUBJECT_TOKEN_TYPE)).ok_or_else(|| {
                TokenExchangeError::invalid_request(
                    "Token exchange request must contain subject token type",
                )
            })?;

        // Presence, not content: an empty actor_token still needs its type
        let actor_token = parameters.get(params::ACTOR_TOKEN);
        let actor_token_type = parameters.get(params::ACTOR_TOKEN_TYPE);
        if actor_token.is_some() != actor_token_type.is_some() {
            return Err(TokenExchangeError::invalid_request(
                "Token exchange request must contain both actor token and actor token type",
            ));
        }

        Ok(Self {
            client_id: client_id.to_string(),
            grant_type: GRANT_TYPE_TOKEN_EXCHANGE.to_string(),
            resource: parameters.get(params::RESOURCE).map(String::from),
            audience: parameters.get(params::AUDIENCE).map(String::from),
            scope: parameters
                .get(params::SCOPE)
                .map(|s| s.split(' ').map(String::from).collect()),
            requested_token_type: parameters.get(params::REQUESTED_TOKEN_TYPE).map(String::from),
            subject_token: subject_token.to_string(),
            subject_token_type: subject_token_type.to_string(),
            actor_token: actor_token.map(String::from),
            actor_token_type: actor_token_type.map(String::from),
        })
    }

    /// The client that made the exchange request.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Always the token exchange grant URN.
    pub fn grant_type(&self) -> &str {
        &self.grant_type
    }

    /// URI of the resource where the requester intends to use the token.
    pub fn resource(&self) -> Option<&str> {
        self.resource.as_deref()
    }

    /// Logical name of the target service.
    pub fn audience(&self) -> Option<&str> {
        self.audience.as_deref()
    }

    /// Requested scopes, `None` when the parameter was not sent at all.
    pub fn scope(&self) -> Option<&[String]> {
        self.scope.as_deref()
    }

    /// Token type the requester wants issued, if stated.
    pub fn requested_token_type(&self) -> Option<&str> {
        self.requested_token_type.as_deref()
    }

    /// The token being exchanged.
    pub fn subject_token(&self) -> &str {
        &self.subject_token
    }

    /// Token type URN of the subject token.
    pub fn subject_token_type(&self) -> &str {
        &self.subject_token_type
    }

    /// Token representing the acting party, if any.
    pub fn actor_token(&self) -> Option<&str> {
        self.actor_token.as_deref()
    }

    /// Token type URN of the actor token.
    pub fn actor_token_type(&self) -> Option<&str> {
        self.actor_token_type.as_deref()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Builds [`ExchangeRequest`]s from raw parameters.
pub trait RequestParser: Send + Sync {
    fn parse(
        &self,
        client_id: &str,
        parameters: &Parameters,
    ) -> Result<ExchangeRequest, TokenExchangeError>;
}

/// Parser enforcing RFC 8693 §2.1.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRequestParser;

impl RequestParser for DefaultRequestParser {
    fn parse(
        &self,
        client_id: &str,
        parameters: &Parameters,
    ) -> Result<ExchangeRequest, TokenExchangeError> {
        ExchangeRequest::parse(client_id, parameters)
    }
}
