use std::env;
use std::path::PathBuf;

use thiserror::Error;

use songdrop_ledger::DEFAULT_BURN_BATCH_SIZE;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

/// Service configuration, read once at startup. The operator credentials
/// live here and are handed to the ledger client as injected state.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub output_dir: PathBuf,
    pub assets_dir: PathBuf,
    pub pinata_base_url: String,
    pub pinata_api_key: String,
    pub pinata_api_secret: String,
    pub ledger_node_url: String,
    pub mirror_node_url: String,
    pub operator_account_id: String,
    pub operator_private_key: String,
    pub token_symbol: String,
    pub burn_batch_size: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            port: parsed("PORT", 4000)?,
            output_dir: PathBuf::from(or_default("OUTPUT_DIR", "output")),
            assets_dir: PathBuf::from(or_default("ASSETS_DIR", "assets")),
            pinata_base_url: or_default("PINATA_BASE_URL", "https://api.pinata.cloud"),
            pinata_api_key: required("PINATA_API_KEY")?,
            pinata_api_secret: required("PINATA_API_SECRET")?,
            ledger_node_url: required("LEDGER_NODE_URL")?,
            mirror_node_url: required("MIRROR_NODE_URL")?,
            operator_account_id: required("OPERATOR_ACCOUNT_ID")?,
            operator_private_key: required("OPERATOR_PRIVATE_KEY")?,
            token_symbol: or_default("TOKEN_SYMBOL", "DROP"),
            burn_batch_size: parsed("BURN_BATCH_SIZE", DEFAULT_BURN_BATCH_SIZE)?,
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn or_default(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parsed<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid(name, value)),
        Err(_) => Ok(default),
    }
}
