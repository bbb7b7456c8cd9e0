//! Zentinel Token Exchange CLI
//!
//! Evaluates a token exchange request offline against a fixed table of
//! subject tokens, printing the grant outcome as JSON. Useful for checking
//! exchange configuration and delegation chains before rolling them out to
//! the agent.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

use zentinel_token_exchange::{
    ClientAuthentication, ExtensionGrantValidator, GrantResult, GrantValidationContext, Parameters,
    StaticTokenValidator, TokenExchangeConfig, TokenExchangeConfigJson,
    TokenExchangeGrantValidator, TokenRequest,
};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "zentinel-token-exchange")]
#[command(about = "Evaluate OAuth 2.0 token exchange requests")]
struct Args {
    /// Client making the exchange request
    #[arg(long, env = "EXCHANGE_CLIENT_ID")]
    client_id: String,

    /// Form-urlencoded request body ("-" reads stdin)
    #[arg(long, default_value = "-", env = "EXCHANGE_REQUEST")]
    request: String,

    /// JSON file mapping subject tokens to their claims
    #[arg(long, env = "EXCHANGE_TOKENS")]
    tokens: PathBuf,

    /// JSON token exchange configuration
    #[arg(long, env = "EXCHANGE_CONFIG")]
    config: Option<PathBuf>,

    /// Client authentication method used at the token endpoint
    #[arg(long, env = "EXCHANGE_CLIENT_AUTH")]
    client_auth: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, env = "EXCHANGE_VERBOSE")]
    verbose: bool,
}

/// Printed outcome.
#[derive(Debug, Serialize)]
struct Report {
    /// Client the host should record for the issued token.
    client_id: String,
    result: GrantResult,
}

fn load_config(path: Option<&Path>) -> Result<TokenExchangeConfig> {
    let mut config = TokenExchangeConfig::default();

    if let Some(path) = path {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {:?}", path))?;
        let json: TokenExchangeConfigJson =
            serde_json::from_str(&data).context("Failed to parse config")?;
        json.apply_to(&mut config);
    }

    config
        .validate()
        .map_err(|e| anyhow!("Token exchange config validation failed: {}", e))?;

    Ok(config)
}

fn load_tokens(path: &Path) -> Result<StaticTokenValidator> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read tokens: {:?}", path))?;
    StaticTokenValidator::from_json(&data).context("Failed to parse tokens")
}

async fn read_request(source: &str) -> Result<String> {
    if source == "-" {
        let mut body = String::new();
        tokio::io::stdin()
            .read_to_string(&mut body)
            .await
            .context("Failed to read request from stdin")?;
        Ok(body)
    } else {
        tokio::fs::read_to_string(source)
            .await
            .with_context(|| format!("Failed to read request: {}", source))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so stdout carries only the report
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(format!("{}={}", env!("CARGO_CRATE_NAME"), log_level))
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = load_config(args.config.as_deref())?;
    let tokens = load_tokens(&args.tokens)?;

    info!(
        audience_check = ?config.audience_check,
        rewrite_client_id = config.rewrite_client_id,
        subject_tokens = tokens.len(),
        "Configuration loaded"
    );

    let body = read_request(&args.request).await?;
    let raw = Parameters::from_form(body.trim()).context("Invalid request body")?;
    debug!(parameters = raw.len(), "Request parsed");

    let grant = TokenExchangeGrantValidator::from_config(&config, Arc::new(tokens));
    let mut context = GrantValidationContext::new(TokenRequest {
        client_id: args.client_id,
        raw,
        client_authentication: args.client_auth.map(|method| ClientAuthentication { method }),
    });

    grant.validate(&mut context).await;

    let result = context
        .result
        .ok_or_else(|| anyhow!("Grant produced no result"))?;
    let success = result.is_success();
    let report = Report {
        client_id: context.request.client_id,
        result,
    };

    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("Failed to serialize result")?
    );

    if !success {
        std::process::exit(1);
    }

    Ok(())
}
