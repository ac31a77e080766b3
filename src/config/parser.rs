use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigResult;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Environment variable that replaces `output.database-path`
const DB_PATH_VAR: &str = "DB_PATH";

/// Environment variable that replaces `source.base-url`
const SOURCE_URL_VAR: &str = "SOURCE_URL";

/// Loads and parses a configuration file from the given path
///
/// `DB_PATH` and `SOURCE_URL` from the process environment take precedence
/// over the file's values.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content, |key| std::env::var(key).ok())
}

/// Parses configuration text, applies overrides, and validates the result
///
/// `lookup` resolves override variables; pass `|_| None` to ignore them.
pub fn parse_config<F>(content: &str, lookup: F) -> ConfigResult<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config: Config = toml::from_str(content)?;

    if let Some(db_path) = lookup(DB_PATH_VAR) {
        tracing::debug!("Database path overridden by {}", DB_PATH_VAR);
        config.output.database_path = db_path;
    }

    if let Some(base_url) = lookup(SOURCE_URL_VAR) {
        tracing::debug!("Catalog URL overridden by {}", SOURCE_URL_VAR);
        config.source.base_url = base_url;
    }

    validate(&config)?;

    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Each refresh run records this hash so runs made under different
/// configurations can be told apart.
pub fn compute_config_hash(path: &Path) -> ConfigResult<String> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> ConfigResult<(Config, String)> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}
