use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::warn;
use url::Url;

use crate::{
    board::FailurePolicy,
    error::{ClientError, ClientResult},
    token::TokenStore,
};

pub const DEFAULT_CONFIG_FILE: &str = "taskdeck.toml";
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub api_base_url: String,
    pub token_path: Option<PathBuf>,
    pub voice_id: Option<String>,
    pub request_timeout: Duration,
    pub failure_policy: FailurePolicy,
    pub sync_creates: bool,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            token_path: None,
            voice_id: None,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            failure_policy: FailurePolicy::default(),
            sync_creates: false,
        }
    }
}

impl ClientSettings {
    /// Configured token path, or the per-user default.
    pub fn token_store(&self) -> Option<TokenStore> {
        self.token_path
            .clone()
            .or_else(TokenStore::default_path)
            .map(TokenStore::new)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    api_base_url: Option<String>,
    token_path: Option<PathBuf>,
    voice_id: Option<String>,
    request_timeout_secs: Option<u64>,
    failure_policy: Option<FailurePolicy>,
    sync_creates: Option<bool>,
}

/// Defaults, then `taskdeck.toml` in the working directory if present, then
/// environment overrides.
pub fn load_settings() -> Result<ClientSettings> {
    let default_file = Path::new(DEFAULT_CONFIG_FILE);
    let path = default_file.exists().then_some(default_file);
    load_settings_from(path)
}

/// Like [`load_settings`] but with an explicit file, which must exist.
pub fn load_settings_from(path: Option<&Path>) -> Result<ClientSettings> {
    let mut settings = ClientSettings::default();
    if let Some(path) = path {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        apply_file_settings(&mut settings, &raw)
            .with_context(|| format!("invalid config file {}", path.display()))?;
    }
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    settings.api_base_url = normalize_base_url(&settings.api_base_url)
        .context("api base url is not usable")?;
    Ok(settings)
}

pub fn apply_file_settings(settings: &mut ClientSettings, raw: &str) -> Result<()> {
    let file: FileSettings = toml::from_str(raw)?;
    if let Some(url) = file.api_base_url {
        settings.api_base_url = url;
    }
    if let Some(path) = file.token_path {
        settings.token_path = Some(path);
    }
    if let Some(voice_id) = file.voice_id {
        settings.voice_id = Some(voice_id);
    }
    match file.request_timeout_secs {
        Some(0) => warn!("ignoring request_timeout_secs = 0"),
        Some(secs) => settings.request_timeout = Duration::from_secs(secs),
        None => {}
    }
    if let Some(policy) = file.failure_policy {
        settings.failure_policy = policy;
    }
    if let Some(sync_creates) = file.sync_creates {
        settings.sync_creates = sync_creates;
    }
    Ok(())
}

/// Unparseable values are logged and ignored.
pub fn apply_env_overrides(settings: &mut ClientSettings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(url) = lookup("TASKDECK_API_URL").or_else(|| lookup("APP__API_URL")) {
        settings.api_base_url = url;
    }
    if let Some(path) = lookup("TASKDECK_TOKEN_PATH") {
        settings.token_path = Some(PathBuf::from(path));
    }
    if let Some(voice_id) = lookup("TASKDECK_VOICE_ID") {
        settings.voice_id = Some(voice_id).filter(|v| !v.trim().is_empty());
    }
    if let Some(raw) = lookup("TASKDECK_REQUEST_TIMEOUT_SECS") {
        match raw.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => settings.request_timeout = Duration::from_secs(secs),
            _ => warn!(value = %raw, "ignoring TASKDECK_REQUEST_TIMEOUT_SECS"),
        }
    }
    if let Some(raw) = lookup("TASKDECK_FAILURE_POLICY") {
        match raw.parse::<FailurePolicy>() {
            Ok(policy) => settings.failure_policy = policy,
            Err(err) => warn!("ignoring TASKDECK_FAILURE_POLICY: {err}"),
        }
    }
    if let Some(raw) = lookup("TASKDECK_SYNC_CREATES") {
        match parse_flag(&raw) {
            Some(flag) => settings.sync_creates = flag,
            None => warn!(value = %raw, "ignoring TASKDECK_SYNC_CREATES"),
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Requires an http(s) URL and strips trailing slashes so paths can be
/// appended directly.
pub fn normalize_base_url(raw: &str) -> ClientResult<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(trimmed)
        .map_err(|e| ClientError::Config(format!("invalid api url '{trimmed}': {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ClientError::Config(format!(
            "api url '{trimmed}' must use http or https"
        )));
    }
    if url.host_str().is_none() {
        return Err(ClientError::Config(format!("api url '{trimmed}' has no host")));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
