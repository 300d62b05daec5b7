use std::{collections::HashMap, fs, path::Path, time::Duration};

use anyhow::{bail, Context};
use url::Url;

use crate::api::QueryStyle;

pub const DEFAULT_CONFIG_FILE: &str = "client.toml";

#[derive(Debug, Clone)]
pub struct Settings {
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub default_page_size: u32,
    pub query_style: QueryStyle,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000/api".into(),
            api_token: None,
            default_page_size: 20,
            query_style: QueryStyle::LimitOffset,
            request_timeout_secs: 30,
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// Defaults, then `client.toml` in the working directory, then `APP__*`
/// environment variables.
pub fn load_settings() -> Settings {
    load_settings_with(Path::new(DEFAULT_CONFIG_FILE), |key| std::env::var(key).ok())
}

pub fn load_settings_with(
    config_path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(config_path) {
        match toml::from_str::<HashMap<String, toml::Value>>(&raw) {
            Ok(file_cfg) => apply_file(&mut settings, &file_cfg),
            Err(err) => tracing::warn!(
                path = %config_path.display(),
                "ignoring unparsable client config: {err}"
            ),
        }
    }

    if let Some(v) = env("API_BASE_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = env("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = env("APP__API_TOKEN") {
        settings.api_token = Some(v);
    }
    if let Some(v) = env("APP__PAGE_SIZE") {
        if let Ok(parsed) = v.parse::<u32>() {
            settings.default_page_size = parsed.max(1);
        }
    }
    if let Some(v) = env("APP__QUERY_STYLE") {
        if let Some(style) = QueryStyle::parse(&v) {
            settings.query_style = style;
        }
    }
    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }

    settings
}

fn apply_file(settings: &mut Settings, file_cfg: &HashMap<String, toml::Value>) {
    if let Some(v) = file_cfg.get("api_base_url").and_then(toml::Value::as_str) {
        settings.api_base_url = v.to_string();
    }
    if let Some(v) = file_cfg.get("api_token").and_then(toml::Value::as_str) {
        settings.api_token = Some(v.to_string());
    }
    if let Some(v) = file_cfg
        .get("page_size")
        .and_then(toml::Value::as_integer)
        .and_then(|v| u32::try_from(v).ok())
    {
        settings.default_page_size = v.max(1);
    }
    if let Some(style) = file_cfg
        .get("query_style")
        .and_then(toml::Value::as_str)
        .and_then(QueryStyle::parse)
    {
        settings.query_style = style;
    }
    if let Some(v) = file_cfg
        .get("request_timeout_secs")
        .and_then(toml::Value::as_integer)
        .and_then(|v| u64::try_from(v).ok())
    {
        settings.request_timeout_secs = v;
    }
}

pub fn normalize_base_url(raw: &str) -> anyhow::Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        bail!("api base url must not be empty");
    }
    let parsed = Url::parse(trimmed).with_context(|| format!("invalid api base url '{raw}'"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        bail!("api base url '{raw}' must use http or https");
    }
    Ok(trimmed.to_string())
}
