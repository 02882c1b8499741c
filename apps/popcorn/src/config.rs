use std::{fs, path::Path};

use anyhow::{bail, Context};
use client_core::DEFAULT_OMDB_URL;
use serde::Deserialize;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub omdb_base_url: String,
    pub omdb_api_key: String,
    pub min_query_len: usize,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            omdb_base_url: DEFAULT_OMDB_URL.into(),
            omdb_api_key: String::new(),
            min_query_len: 3,
            request_timeout_secs: 10,
        }
    }
}

impl Settings {
    /// Checks the base URL and returns it without a trailing slash.
    pub fn validated_base_url(&self) -> anyhow::Result<String> {
        let raw = self.omdb_base_url.trim();
        let url = Url::parse(raw)
            .with_context(|| format!("invalid OMDb base url '{raw}'"))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("OMDb base url must be http or https, got '{}'", url.scheme());
        }
        Ok(raw.trim_end_matches('/').to_string())
    }
}

pub fn load_settings(path: &Path) -> Settings {
    let raw = fs::read_to_string(path).ok();
    load_settings_from(raw.as_deref(), |key| std::env::var(key).ok())
}

/// Defaults, then the TOML file, then the environment. Values that fail to
/// parse are skipped.
pub fn load_settings_from(
    file: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Some(raw) = file {
        if let Ok(table) = toml::from_str::<toml::Table>(raw) {
            if let Some(v) = table_value(&table, "omdb_base_url") {
                settings.omdb_base_url = v;
            }
            if let Some(v) = table_value(&table, "omdb_api_key") {
                settings.omdb_api_key = v;
            }
            if let Some(v) = table_value(&table, "min_query_len").and_then(|v| v.parse().ok()) {
                settings.min_query_len = v;
            }
            if let Some(v) =
                table_value(&table, "request_timeout_secs").and_then(|v| v.parse().ok())
            {
                settings.request_timeout_secs = v;
            }
        }
    }

    if let Some(v) = env("OMDB_BASE_URL") {
        settings.omdb_base_url = v;
    }
    if let Some(v) = env("APP__OMDB_BASE_URL") {
        settings.omdb_base_url = v;
    }

    if let Some(v) = env("OMDB_API_KEY") {
        settings.omdb_api_key = v;
    }
    if let Some(v) = env("APP__OMDB_API_KEY") {
        settings.omdb_api_key = v;
    }

    if let Some(v) = env("APP__MIN_QUERY_LEN") {
        if let Ok(parsed) = v.parse::<usize>() {
            settings.min_query_len = parsed;
        }
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }

    settings
}

fn table_value(table: &toml::Table, key: &str) -> Option<String> {
    match table.get(key)? {
        toml::Value::String(v) => Some(v.clone()),
        toml::Value::Integer(v) => Some(v.to_string()),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
