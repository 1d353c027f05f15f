mod file_config;

pub use file_config::{FileConfig, SourceApiConfig};

use anyhow::{bail, Result};
use std::path::PathBuf;

const DEFAULT_API_BASE_URL: &str = "https://api.spotify.com/v1";
const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub pacing_ms: u64,
    pub rank_cache_limit: usize,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub pacing_ms: u64,
    pub rank_cache_limit: usize,
    pub source_api: SourceApiSettings,
}

/// Credentials and endpoints for the upstream catalog API.
#[derive(Debug, Clone)]
pub struct SourceApiSettings {
    pub api_base_url: String,
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub timeout_secs: u64,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_path must be specified via --db-path or in config file")
            })?;

        let pacing_ms = file.pacing_ms.unwrap_or(cli.pacing_ms);
        let rank_cache_limit = file.rank_cache_limit.unwrap_or(cli.rank_cache_limit);
        if rank_cache_limit == 0 {
            bail!("rank_cache_limit must be greater than zero");
        }

        let api_file = file.source_api.unwrap_or_default();
        let source_api = SourceApiSettings {
            api_base_url: api_file
                .api_base_url
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            token_url: api_file
                .token_url
                .unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
            client_id: api_file
                .client_id
                .or_else(|| cli.client_id.clone())
                .unwrap_or_default(),
            client_secret: api_file
                .client_secret
                .or_else(|| cli.client_secret.clone())
                .unwrap_or_default(),
            timeout_secs: api_file.timeout_secs.unwrap_or(30),
        };

        Ok(Self {
            db_path,
            pacing_ms,
            rank_cache_limit,
            source_api,
        })
    }
}
