use std::env;
use std::time::Duration;

use crate::error::{GenerateError, Result};

pub const CANONICAL_MIME_TYPE: &str = "image/png";
pub const EDIT_BYTE_CEILING: usize = 4 * 1024 * 1024;
pub const EARLY_TIMEOUT_MS: u64 = 40_000;
pub const MAX_TIMEOUT_MS: u64 = 180_000;
pub const DOWNLOAD_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub canonical_mime_type: String,
    pub edit_byte_ceiling: usize,
    pub early_timeout: Duration,
    pub max_timeout: Duration,
    pub download_timeout: Duration,
    pub jimeng_api_base: String,
    pub jimeng_session_ids: Vec<String>,
    pub openai_api_base: String,
    pub openai_api_key: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            canonical_mime_type: CANONICAL_MIME_TYPE.to_string(),
            edit_byte_ceiling: EDIT_BYTE_CEILING,
            early_timeout: Duration::from_millis(EARLY_TIMEOUT_MS),
            max_timeout: Duration::from_millis(MAX_TIMEOUT_MS),
            download_timeout: Duration::from_millis(DOWNLOAD_TIMEOUT_MS),
            jimeng_api_base: "http://127.0.0.1:8000/v1".to_string(),
            jimeng_session_ids: Vec::new(),
            openai_api_base: "https://api.openai.com/v1".to_string(),
            openai_api_key: None,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(base) = api_base_env("JIMENG_API_BASE") {
            config.jimeng_api_base = base;
        }
        if let Some(base) = api_base_env("OPENAI_API_BASE") {
            config.openai_api_base = base;
        }
        config.openai_api_key = non_empty_env("OPENAI_API_KEY");
        if let Some(raw) = non_empty_env("JIMENG_SESSION_IDS") {
            config.jimeng_session_ids = parse_session_ids(&raw);
        }
        if let Some(ms) = millis_env("EASEL_EARLY_TIMEOUT_MS")? {
            config.early_timeout = ms;
        }
        if let Some(ms) = millis_env("EASEL_MAX_TIMEOUT_MS")? {
            config.max_timeout = ms;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.early_timeout.is_zero() {
            return Err(GenerateError::Config(
                "early timeout must be positive".to_string(),
            ));
        }
        if self.early_timeout >= self.max_timeout {
            return Err(GenerateError::Config(format!(
                "early timeout ({}ms) must be shorter than the transport timeout ({}ms)",
                self.early_timeout.as_millis(),
                self.max_timeout.as_millis()
            )));
        }
        if self.edit_byte_ceiling == 0 {
            return Err(GenerateError::Config(
                "edit byte ceiling must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

pub(crate) fn parse_session_ids(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for token in raw.split([',', '\n', ' ']) {
        let token = token.trim();
        if token.is_empty() || out.iter().any(|existing| existing == token) {
            continue;
        }
        out.push(token.to_string());
    }
    out
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn api_base_env(key: &str) -> Option<String> {
    non_empty_env(key)
        .map(|value| value.trim_end_matches('/').to_string())
        .filter(|value| !value.is_empty())
}

fn millis_env(key: &str) -> Result<Option<Duration>> {
    let Some(raw) = non_empty_env(key) else {
        return Ok(None);
    };
    let ms = raw
        .parse::<u64>()
        .map_err(|_| GenerateError::Config(format!("{key} must be milliseconds, got '{raw}'")))?;
    Ok(Some(Duration::from_millis(ms)))
}
