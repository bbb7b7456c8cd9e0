//! Claim derivation for exchanged tokens.
//!
//! Works out the subject of the new token and stamps the `act` (actor)
//! claim (RFC 8693 §4.1) when a client other than the subject token's own
//! client performs the exchange.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use super::error::TokenExchangeError;
use super::request::ExchangeRequest;

/// Claim types used by the exchange pipeline.
pub mod claim_types {
    pub const SUBJECT: &str = "sub";
    pub const AUDIENCE: &str = "aud";
    pub const CLIENT_ID: &str = "client_id";
    pub const ACTOR: &str = "act";
    pub const ISSUER: &str = "iss";
}

/// A single `(type, value)` claim. Types may repeat (e.g. several `aud`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    #[serde(rename = "type")]
    pub claim_type: String,
    pub value: String,
    /// How the issuer should embed `value` in the new token.
    #[serde(default, skip_serializing_if = "ClaimValueType::is_string")]
    pub value_type: ClaimValueType,
}

impl Claim {
    /// Plain string claim.
    pub fn new(claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: value.into(),
            value_type: ClaimValueType::String,
        }
    }

    /// Claim whose value is a serialized JSON object.
    pub fn json(claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            value_type: ClaimValueType::Json,
            ..Self::new(claim_type, value)
        }
    }

    /// Whether this claim has type `claim_type`.
    pub fn is(&self, claim_type: &str) -> bool {
        self.claim_type == claim_type
    }
}

/// Representation of a claim value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimValueType {
    #[default]
    String,
    Json,
}

impl ClaimValueType {
    fn is_string(&self) -> bool {
        matches!(self, ClaimValueType::String)
    }
}

/// All values of `claim_type`, in order.
pub fn claim_values<'a>(
    claims: &'a [Claim],
    claim_type: &'a str,
) -> impl Iterator<Item = &'a str> + 'a {
    claims
        .iter()
        .filter(move |c| c.is(claim_type))
        .map(|c| c.value.as_str())
}

/// First value of `claim_type`, if any.
pub fn first_claim_value<'a>(claims: &'a [Claim], claim_type: &'a str) -> Option<&'a str> {
    claim_values(claims, claim_type).next()
}

/// The `act` claim: one link in the delegation chain.
///
/// `inner_actor` holds the previous link, so the outermost actor is the most
/// recent party to exchange the token. Members this type does not model
/// (such as `sub`) are carried in `extra` so that earlier links survive
/// re-serialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    /// Issuer of the exchanged token.
    #[serde(rename = "iss", default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,

    /// Client the exchanged token was originally issued to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// Previous actor in the chain.
    #[serde(rename = "act", default, skip_serializing_if = "Option::is_none")]
    pub inner_actor: Option<Box<Actor>>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Actor {
    pub fn for_client(client_id: impl Into<String>) -> Self {
        Self {
            client_id: Some(client_id.into()),
            ..Default::default()
        }
    }

    /// Parse an `act` claim value.
    pub fn from_json(value: &str) -> serde_json::Result<Self> {
        serde_json::from_str(value)
    }

    /// Serialize as an `act` claim value.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Number of links, this one included.
    pub fn depth(&self) -> usize {
        1 + self.inner_actor.as_ref().map_or(0, |inner| inner.depth())
    }
}

/// Derives the subject and claim set of the token to issue.
pub trait ClaimsParser: Send + Sync {
    /// The single `sub` value, `None` when the token carries none.
    fn parse_subject(
        &self,
        claims: &[Claim],
        request: &ExchangeRequest,
    ) -> Result<Option<String>, TokenExchangeError>;

    /// Claims for the new token.
    fn parse_claims(
        &self,
        claims: Vec<Claim>,
        request: &ExchangeRequest,
    ) -> Result<Vec<Claim>, TokenExchangeError>;
}

/// Claims parser that extends the delegation chain on cross-client exchange.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultClaimsParser;

impl ClaimsParser for DefaultClaimsParser {
    fn parse_subject(
        &self,
        claims: &[Claim],
        _request: &ExchangeRequest,
    ) -> Result<Option<String>, TokenExchangeError> {
        let mut subjects = claim_values(claims, claim_types::SUBJECT);
        let subject = subjects.next();

        if subjects.next().is_some() {
            return Err(TokenExchangeError::SubjectParsing(
                "Subject token contains multiple subject claims".to_string(),
            ));
        }

        Ok(subject.map(String::from))
    }

    fn parse_claims(
        &self,
        claims: Vec<Claim>,
        request: &ExchangeRequest,
    ) -> Result<Vec<Claim>, TokenExchangeError> {
        let owner = match first_claim_value(&claims, claim_types::CLIENT_ID) {
            Some(owner) => owner.to_string(),
            None => {
                debug!("Subject token has no client_id claim, leaving claims unchanged");
                return Ok(claims);
            }
        };

        // Same client refreshing or rescoping its own token
        if owner == request.client_id() {
            return Ok(claims);
        }

        let mut prior = claims.iter().filter(|c| c.is(claim_types::ACTOR));
        let inner_actor = match (prior.next(), prior.next()) {
            (None, _) => None,
            (Some(act), None) => {
                let inner = Actor::from_json(&act.value).map_err(|e| {
                    TokenExchangeError::MalformedActor(format!(
                        "Subject token act claim is not a valid actor: {}",
                        e
                    ))
                })?;
                Some(Box::new(inner))
            }
            (Some(_), Some(_)) => {
                return Err(TokenExchangeError::MalformedActor(
                    "Subject token contains multiple act claims".to_string(),
                ));
            }
        };

        let actor = Actor {
            client_id: Some(owner),
            inner_actor,
            ..Default::default()
        };
        let value = actor.to_json().map_err(|e| {
            TokenExchangeError::MalformedActor(format!("Failed to serialize actor: {}", e))
        })?;

        debug!(
            requester = %request.client_id(),
            actor_client_id = ?actor.client_id,
            chain_depth = actor.depth(),
            "Stamping actor claim"
        );

        let mut claims: Vec<Claim> = claims
            .into_iter()
            .filter(|c| !c.is(claim_types::ACTOR))
            .collect();
        claims.push(Claim::json(claim_types::ACTOR, value));

        Ok(claims)
    }
}
