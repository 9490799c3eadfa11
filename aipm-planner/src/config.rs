//! Service configuration
//!
//! Every setting resolves env -> TOML (`~/.config/aipm/planner.toml`) ->
//! default. The LLM API key is required and fails startup with
//! remediation hints when absent.

use aipm_common::config::{load_config_table, resolve_secret, resolve_setting};
use aipm_common::{Error, Result};
use std::path::PathBuf;

/// LLM provider settings (Azure OpenAI deployment)
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub endpoint: String,
    pub api_key: String,
    pub deployment: String,
    pub api_version: String,
}

/// Full service configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub llm: LlmConfig,
}

impl Config {
    /// Load configuration from environment and the TOML config file.
    pub fn load() -> Result<Self> {
        let table = load_config_table()?;
        let table = table.as_ref();

        let host = resolve_setting("AIPM_HOST", table, "host", "0.0.0.0");
        let port_str = resolve_setting("AIPM_PORT", table, "port", "8000");
        let port: u16 = port_str
            .parse()
            .map_err(|_| Error::Config(format!("Invalid port: {}", port_str)))?;

        let default_db = dirs::data_dir()
            .map(|d| d.join("aipm").join("planner.db"))
            .unwrap_or_else(|| PathBuf::from("planner.db"));
        let database_path = PathBuf::from(resolve_setting(
            "AIPM_DATABASE_PATH",
            table,
            "database_path",
            &default_db.to_string_lossy(),
        ));

        let endpoint = resolve_setting(
            "AIPM_OPENAI_ENDPOINT",
            table,
            "openai_endpoint",
            "https://api.openai.azure.com",
        );
        let api_key = resolve_secret(
            "AIPM_OPENAI_API_KEY",
            table,
            "openai_api_key",
            "Azure OpenAI API key",
        )?;
        let deployment = resolve_setting(
            "AIPM_OPENAI_DEPLOYMENT",
            table,
            "openai_deployment",
            "gpt-35-turbo",
        );
        let api_version = resolve_setting(
            "AIPM_OPENAI_API_VERSION",
            table,
            "openai_api_version",
            "2023-05-15",
        );

        Ok(Self {
            host,
            port,
            database_path,
            llm: LlmConfig {
                endpoint,
                api_key,
                deployment,
                api_version,
            },
        })
    }
}
