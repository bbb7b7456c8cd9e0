//! Token Exchange configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Token Exchange grant configuration (RFC 8693).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenExchangeConfig {
    /// How the requesting client is bound to the subject token.
    #[serde(default)]
    pub audience_check: AudienceCheck,

    /// Rewrite the outer request's client_id to the subject token's client
    /// after a successful exchange.
    #[serde(default)]
    pub rewrite_client_id: bool,

    /// Upper bound on a single subject token validation call.
    #[serde(default = "default_introspection_timeout")]
    pub introspection_timeout_secs: u64,

    /// Log exchange operations.
    #[serde(default)]
    pub log_exchanges: bool,
}

fn default_introspection_timeout() -> u64 {
    10
}

impl Default for TokenExchangeConfig {
    fn default() -> Self {
        Self {
            audience_check: AudienceCheck::default(),
            rewrite_client_id: false,
            introspection_timeout_secs: default_introspection_timeout(),
            log_exchanges: false,
        }
    }
}

impl TokenExchangeConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.introspection_timeout_secs == 0 {
            return Err("introspection_timeout_secs must be greater than zero".to_string());
        }

        Ok(())
    }

    /// Timeout applied to subject token validation.
    pub fn introspection_timeout(&self) -> Duration {
        Duration::from_secs(self.introspection_timeout_secs)
    }
}

/// Ownership rule binding the requester to the subject token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudienceCheck {
    /// Requester must appear in `aud` or match the token's `client_id`.
    #[default]
    AudienceOrClientId,
    /// Requester must appear in `aud`.
    AudienceOnly,
}

/// JSON configuration for dynamic reconfiguration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct TokenExchangeConfigJson {
    pub audience_check: Option<AudienceCheck>,
    pub rewrite_client_id: Option<bool>,
    pub introspection_timeout_secs: Option<u64>,
    pub log_exchanges: Option<bool>,
}

impl TokenExchangeConfigJson {
    /// Apply JSON config to existing config.
    pub fn apply_to(&self, config: &mut TokenExchangeConfig) {
        if let Some(check) = self.audience_check {
            config.audience_check = check;
        }
        if let Some(rewrite) = self.rewrite_client_id {
            config.rewrite_client_id = rewrite;
        }
        if let Some(timeout) = self.introspection_timeout_secs {
            config.introspection_timeout_secs = timeout;
        }
        if let Some(log) = self.log_exchanges {
            config.log_exchanges = log;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TokenExchangeConfig::default();
        assert_eq!(config.audience_check, AudienceCheck::AudienceOrClientId);
        assert!(!config.rewrite_client_id);
        assert_eq!(config.introspection_timeout(), Duration::from_secs(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = TokenExchangeConfig {
            introspection_timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_overlay() {
        let json: TokenExchangeConfigJson = serde_json::from_str(
            r#"{"audience-check": "audience_only", "rewrite-client-id": true}"#,
        )
        .unwrap();

        let mut config = TokenExchangeConfig::default();
        json.apply_to(&mut config);

        assert_eq!(config.audience_check, AudienceCheck::AudienceOnly);
        assert!(config.rewrite_client_id);
        // Untouched fields keep their defaults
        assert_eq!(config.introspection_timeout_secs, 10);
        assert!(!config.log_exchanges);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<TokenExchangeConfig, _> =
            serde_json::from_str(r#"{"signing_algorithm": "RS256"}"#);
        assert!(result.is_err());
    }
}
