//! Token Exchange identifiers (RFC 8693).

use serde::{Deserialize, Serialize};

/// Token exchange grant type (RFC 8693 §2.1).
pub const GRANT_TYPE_TOKEN_EXCHANGE: &str = "urn:ietf:params:oauth:grant-type:token-exchange";

/// Token request parameter names (RFC 8693 §2.1).
pub mod params {
    pub const GRANT_TYPE: &str = "grant_type";
    pub const RESOURCE: &str = "resource";
    pub const AUDIENCE: &str = "audience";
    pub const SCOPE: &str = "scope";
    pub const REQUESTED_TOKEN_TYPE: &str = "requested_token_type";
    pub const SUBJECT_TOKEN: &str = "subject_token";
    pub const SUBJECT_TOKEN_TYPE: &str = "subject_token_type";
    pub const ACTOR_TOKEN: &str = "actor_token";
    pub const ACTOR_TOKEN_TYPE: &str = "actor_token_type";
}

/// Custom token response parameter identifying the issued token's type.
pub const ISSUED_TOKEN_TYPE: &str = "issued_token_type";

/// Token type URNs (RFC 8693 §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// OAuth 2.0 access token.
    AccessToken,
    /// OAuth 2.0 refresh token.
    RefreshToken,
    /// OpenID Connect ID token.
    IdToken,
    /// Base64url-encoded SAML 1.1 assertion.
    Saml1,
    /// Base64url-encoded SAML 2.0 assertion.
    Saml2,
    /// Generic JWT (not an access token).
    Jwt,
}

impl TokenType {
    /// Get the URN for this token type.
    pub fn as_urn(&self) -> &'static str {
        match self {
            TokenType::AccessToken => "urn:ietf:params:oauth:token-type:access_token",
            TokenType::RefreshToken => "urn:ietf:params:oauth:token-type:refresh_token",
            TokenType::IdToken => "urn:ietf:params:oauth:token-type:id_token",
            TokenType::Saml1 => "urn:ietf:params:oauth:token-type:saml1",
            TokenType::Saml2 => "urn:ietf:params:oauth:token-type:saml2",
            TokenType::Jwt => "urn:ietf:params:oauth:token-type:jwt",
        }
    }

    /// Parse from URN string.
    pub fn from_urn(urn: &str) -> Option<Self> {
        match urn {
            "urn:ietf:params:oauth:token-type:access_token" => Some(TokenType::AccessToken),
            "urn:ietf:params:oauth:token-type:refresh_token" => Some(TokenType::RefreshToken),
            "urn:ietf:params:oauth:token-type:id_token" => Some(TokenType::IdToken),
            "urn:ietf:params:oauth:token-type:saml1" => Some(TokenType::Saml1),
            "urn:ietf:params:oauth:token-type:saml2" => Some(TokenType::Saml2),
            "urn:ietf:params:oauth:token-type:jwt" => Some(TokenType::Jwt),
            _ => None,
        }
    }
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_urn())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_type_urns() {
        let types = [
            TokenType::AccessToken,
            TokenType::RefreshToken,
            TokenType::IdToken,
            TokenType::Saml1,
            TokenType::Saml2,
            TokenType::Jwt,
        ];

        for t in types {
            assert!(t.as_urn().starts_with("urn:ietf:params:oauth:token-type:"));
            assert_eq!(TokenType::from_urn(t.as_urn()), Some(t));
        }
    }

    #[test]
    fn test_unknown_urn() {
        assert_eq!(TokenType::from_urn("urn:example:custom"), None);
        assert_eq!(TokenType::from_urn(GRANT_TYPE_TOKEN_EXCHANGE), None);
    }
}
