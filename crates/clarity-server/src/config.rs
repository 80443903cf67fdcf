use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;

use clarity_ai::AiSettings;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_DATA_DIR: &str = "data";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid bind address {value:?}")]
    InvalidBindAddr { value: String },
    #[error("invalid PORT {value:?}")]
    InvalidPort { value: String },
    #[error("{key} must not be empty")]
    EmptyModel { key: &'static str },
    #[error("failed to read .env: {0}")]
    DotEnv(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub data_dir: PathBuf,
    pub ai: AiSettings,
}

impl ServerConfig {
    /// `.env` (if present) overlaid by the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut merged = HashMap::new();

        match dotenvy::dotenv_iter() {
            Ok(iter) => {
                for item in iter {
                    let (k, v) = item.map_err(|e| ConfigError::DotEnv(e.to_string()))?;
                    merged.insert(k, v);
                }
            }
            Err(e) if e.not_found() => {}
            Err(e) => return Err(ConfigError::DotEnv(e.to_string())),
        }

        merged.extend(std::env::vars());

        Self::from_kv(&merged)
    }

    pub fn from_kv(kv: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_addr = match get(kv, "CLARITY_BIND_ADDR") {
            Some(addr) => addr
                .parse()
                .map_err(|_| ConfigError::InvalidBindAddr { value: addr.to_string() })?,
            None => {
                let port = match get(kv, "PORT") {
                    Some(p) => p
                        .parse::<u16>()
                        .map_err(|_| ConfigError::InvalidPort { value: p.to_string() })?,
                    None => DEFAULT_PORT,
                };
                SocketAddr::from(([127, 0, 0, 1], port))
            }
        };

        let defaults = AiSettings::default();
        let ai = AiSettings {
            api_key: get(kv, "OPENAI_API_KEY").map(str::to_string),
            base_url: get(kv, "OPENAI_BASE_URL").map_or(defaults.base_url, str::to_string),
            approval_model: model(kv, "CLARITY_APPROVAL_MODEL", defaults.approval_model)?,
            receipt_model: model(kv, "CLARITY_RECEIPT_MODEL", defaults.receipt_model)?,
            receipt_fallback_model: model(
                kv,
                "CLARITY_RECEIPT_FALLBACK_MODEL",
                defaults.receipt_fallback_model,
            )?,
            webhook_url: get(kv, "TOOLHOUSE_AGENT_URL").map(str::to_string),
        };

        Ok(Self {
            bind_addr,
            data_dir: get(kv, "CLARITY_DATA_DIR").unwrap_or(DEFAULT_DATA_DIR).into(),
            ai,
        })
    }
}

/// Trimmed value; empty counts as unset.
fn get<'a>(kv: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    kv.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
}

/// A model name: unset falls back to the default, set-but-blank is an error.
fn model(
    kv: &HashMap<String, String>,
    key: &'static str,
    default: String,
) -> Result<String, ConfigError> {
    match kv.get(key) {
        None => Ok(default),
        Some(v) if v.trim().is_empty() => Err(ConfigError::EmptyModel { key }),
        Some(v) => Ok(v.trim().to_string()),
    }
}
