//! Environment-driven configuration

use crate::runtime::RuntimeSettings;
use crate::tools::ToolSettings;
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_MODEL: &str = "gpt-4-turbo-preview";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_SERPER_ENDPOINT: &str = "https://google.serper.dev/search";
const DEFAULT_MAX_TURNS: u32 = 12;
const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 30;
const ENV_FILE: &str = ".env";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub openai_api_key: String,
    pub serper_api_key: String,
    pub model: String,
    pub openai_base_url: String,
    pub serper_endpoint: String,
    pub max_turns: u32,
    pub tool_timeout: Duration,
    /// Persist transcripts in SQLite when set; otherwise keep them in memory
    pub db_path: Option<PathBuf>,
}

impl Config {
    /// Read the process environment, falling back to `.env` in the working
    /// directory. Variable names match case-insensitively.
    pub fn from_env() -> Result<Self, ConfigError> {
        let process = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)));
        let file = std::fs::read_to_string(ENV_FILE).ok();
        let vars = merge_env(process, file.as_deref());
        Self::from_lookup(|name| vars.get(&name.to_ascii_uppercase()).cloned())
    }

    /// Build from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let host: IpAddr = parse_or(&get, "HOST", DEFAULT_HOST.parse().ok())?;
        let port: u16 = parse_or(&get, "PORT", Some(DEFAULT_PORT))?;

        let max_turns: u32 = parse_or(&get, "MAX_TURNS", Some(DEFAULT_MAX_TURNS))?;
        if max_turns == 0 {
            return Err(ConfigError::Invalid {
                name: "MAX_TURNS",
                value: "0".to_string(),
            });
        }
        let timeout_secs: u64 =
            parse_or(&get, "TOOL_TIMEOUT_SECS", Some(DEFAULT_TOOL_TIMEOUT_SECS))?;

        Ok(Self {
            listen_addr: SocketAddr::new(host, port),
            openai_api_key: required("OPENAI_API_KEY")?,
            serper_api_key: required("SERPER_API_KEY")?,
            model: get("RESEARCH_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            openai_base_url: get("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            serper_endpoint: get("SERPER_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_SERPER_ENDPOINT.to_string()),
            max_turns,
            tool_timeout: Duration::from_secs(timeout_secs),
            db_path: get("RESEARCH_DB_PATH").map(PathBuf::from),
        })
    }

    pub fn tool_settings(&self) -> ToolSettings {
        ToolSettings {
            serper_api_key: self.serper_api_key.clone(),
            serper_endpoint: self.serper_endpoint.clone(),
        }
    }

    pub fn runtime_settings(&self) -> RuntimeSettings {
        RuntimeSettings {
            max_turns: self.max_turns,
            tool_timeout: self.tool_timeout,
        }
    }
}

/// Upper-cased variable table; process values win over `.env` entries
fn merge_env(
    process: impl IntoIterator<Item = (String, String)>,
    env_file: Option<&str>,
) -> HashMap<String, String> {
    let mut vars: HashMap<String, String> = env_file
        .map(parse_env_file)
        .unwrap_or_default()
        .into_iter()
        .collect();
    for (key, value) in process {
        vars.insert(key.to_ascii_uppercase(), value);
    }
    vars
}

/// `KEY=VALUE` lines; blank lines and `#` comments are skipped, surrounding
/// quotes are removed
fn parse_env_file(contents: &str) -> Vec<(String, String)> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, value) = line.split_once('=')?;
            let value = value.trim().trim_matches('"').trim_matches('\'');
            Some((key.trim().to_ascii_uppercase(), value.to_string()))
        })
        .collect()
}

fn parse_or<T, G>(get: &G, name: &'static str, default: Option<T>) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => default.ok_or(ConfigError::Missing(name)),
    }
}
