mod file_config;

pub use file_config::{DispatcherFileConfig, FileConfig, GithubFileConfig, LlmFileConfig};

use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use std::path::PathBuf;
use std::time::Duration;

/// CLI arguments that participate in config resolution; TOML values win
/// where both are present.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub admin_token: Option<String>,
    pub cache_ttl_secs: u64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_dir: PathBuf,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    /// Bearer token for the admin routes; None disables them entirely.
    pub admin_token: Option<String>,
    pub cache_ttl: Duration,
    pub github_token: Option<String>,
    pub llm: LlmSettings,
    pub dispatcher: DispatcherSettings,
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub api_key_command: Option<String>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            api_key_command: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DispatcherSettings {
    pub max_attempts: usize,
    pub retry_delay: Duration,
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay: Duration::from_secs(2),
        }
    }
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file
    /// config. TOML values override CLI values where present; secrets fall
    /// back to environment variables (GITHUB_TOKEN, LLM_API_KEY).
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;

        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let port = file.port.unwrap_or(cli.port);

        let logging_level = file
            .logging_level
            .and_then(|s| RequestsLoggingLevel::parse(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let admin_token = file.admin_token.or_else(|| cli.admin_token.clone());

        let cache_ttl = Duration::from_secs(file.cache_ttl_secs.unwrap_or(cli.cache_ttl_secs));

        let github_file = file.github.unwrap_or_default();
        let github_token = github_file
            .token
            .or_else(|| std::env::var("GITHUB_TOKEN").ok());

        let llm_file = file.llm.unwrap_or_default();
        let llm_defaults = LlmSettings::default();
        let llm = LlmSettings {
            base_url: llm_file.base_url.unwrap_or(llm_defaults.base_url),
            model: llm_file.model.unwrap_or(llm_defaults.model),
            api_key: llm_file
                .api_key
                .or_else(|| std::env::var("LLM_API_KEY").ok()),
            api_key_command: llm_file.api_key_command,
        };

        let dispatcher_file = file.dispatcher.unwrap_or_default();
        let dispatcher_defaults = DispatcherSettings::default();
        let dispatcher = DispatcherSettings {
            max_attempts: dispatcher_file
                .max_attempts
                .unwrap_or(dispatcher_defaults.max_attempts)
                .max(1),
            retry_delay: dispatcher_file
                .retry_delay_secs
                .map(Duration::from_secs)
                .unwrap_or(dispatcher_defaults.retry_delay),
        };

        Ok(Self {
            db_dir,
            port,
            logging_level,
            admin_token,
            cache_ttl,
            github_token,
            llm,
            dispatcher,
        })
    }

    pub fn directory_db_path(&self) -> PathBuf {
        self.db_dir.join("directory.db")
    }
}
