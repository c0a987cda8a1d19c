//! Configuration management for the FM chain client
//!
//! Loads configuration from TOML files with environment variable substitution.

use crate::auth::PayloadEncryptor;
use crate::error::ClientResult;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub client: ClientConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub tx: TxConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Exchange API base; method names are appended verbatim
    pub base_url: String,
    /// JSON-RPC endpoint, defaults to `base_url`
    pub rpc_url: Option<String>,
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub classifier: ClassifierKind,
}

impl ClientConfig {
    /// JSON-RPC endpoint; an empty value falls back to `base_url`
    pub fn rpc_url(&self) -> &str {
        self.rpc_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .unwrap_or(&self.base_url)
    }
}

/// Which response classifier the transport applies
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierKind {
    /// `status == "success"` envelope, applied to both surfaces
    #[default]
    Status,
    /// JSON-RPC 2.0 `error` object for the node, `status` envelope for the API
    Jsonrpc,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC key for request tokens
    pub token_key: String,
    /// Base64 PKCS#1 DER RSA public key
    pub api_public_key: Option<String>,
}

impl AuthConfig {
    /// Encryptor for the configured API key, `None` when no key is set
    pub fn encryptor(&self) -> ClientResult<Option<PayloadEncryptor>> {
        self.api_public_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .map(PayloadEncryptor::from_base64_der)
            .transpose()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TxConfig {
    #[serde(default = "default_unlock_ttl")]
    pub unlock_ttl_secs: u64,
    #[serde(default = "default_block_tag")]
    pub block_tag: String,
}

impl Default for TxConfig {
    fn default() -> Self {
        Self {
            unlock_ttl_secs: default_unlock_ttl(),
            block_tag: default_block_tag(),
        }
    }
}

fn default_unlock_ttl() -> u64 {
    300
}

fn default_block_tag() -> String {
    "latest".to_string()
}

impl Settings {
    /// Load settings from the file named by `FMCHAIN_CONFIG`
    pub fn load() -> Result<Self> {
        let config_path = env::var("FMCHAIN_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config/default.toml"));

        Self::load_from(&config_path)
    }

    /// Load settings from a specific file
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        Self::from_toml(&config_str)
    }

    /// Parse settings from TOML text
    pub fn from_toml(input: &str) -> Result<Self> {
        // Substitute environment variables
        let config_str = substitute_env_vars(input);

        let settings: Settings =
            toml::from_str(&config_str).with_context(|| "Failed to parse configuration")?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.client.base_url.is_empty() {
            anyhow::bail!("client.base_url must be set");
        }

        if self.auth.token_key.is_empty() {
            anyhow::bail!("auth.token_key must be set");
        }

        if self.tx.block_tag != "latest" && self.tx.block_tag != "pending" {
            anyhow::bail!("unknown block tag {:?}", self.tx.block_tag);
        }

        if self.client.rpc_url() == self.client.base_url {
            tracing::debug!("No rpc_url configured, JSON-RPC goes to {}", self.client.base_url);
        }

        Ok(())
    }
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars(input: &str) -> String {
    lazy_static::lazy_static! {
        static ref ENV_VAR: regex::Regex =
            regex::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("static regex");
    }

    let mut result = input.to_string();
    for cap in ENV_VAR.captures_iter(input) {
        let var_name = &cap[1];
        let var_value = env::var(var_name).unwrap_or_default();
        result = result.replace(&cap[0], &var_value);
    }

    result
}
