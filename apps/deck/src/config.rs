use std::{collections::HashMap, fs, path::Path};

use client_core::DEFAULT_SERVICE_URL;
use url::Url;

pub const SETTINGS_FILE: &str = "deck.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub service_url: String,
    pub log_filter: String,
    pub default_algorithm: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            service_url: DEFAULT_SERVICE_URL.into(),
            log_filter: "info".into(),
            default_algorithm: "K-means".into(),
        }
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();
    apply_file(&mut settings, Path::new(SETTINGS_FILE));
    apply_env(&mut settings, |key| std::env::var(key).ok());
    settings
}

fn apply_file(settings: &mut Settings, path: &Path) {
    let Ok(raw) = fs::read_to_string(path) else {
        return;
    };
    let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) else {
        return;
    };
    if let Some(v) = file_cfg.get("service_url") {
        settings.service_url = v.clone();
    }
    if let Some(v) = file_cfg.get("log_filter") {
        settings.log_filter = v.clone();
    }
    if let Some(v) = file_cfg.get("default_algorithm") {
        settings.default_algorithm = v.clone();
    }
}

fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("DECK_SERVICE_URL") {
        settings.service_url = v;
    }
    if let Some(v) = var("APP__SERVICE_URL") {
        settings.service_url = v;
    }
    if let Some(v) = var("APP__LOG_FILTER") {
        settings.log_filter = v;
    }
    if let Some(v) = var("APP__DEFAULT_ALGORITHM") {
        settings.default_algorithm = v;
    }
}

/// Trims the configured address, falls back to the default when blank and
/// assumes plain http when no scheme is given.
pub fn normalize_service_url(raw_service_url: &str) -> anyhow::Result<String> {
    let raw_service_url = raw_service_url.trim();
    if raw_service_url.is_empty() {
        return Ok(Settings::default().service_url);
    }

    let candidate = if raw_service_url.contains("://") {
        raw_service_url.to_string()
    } else {
        format!("http://{raw_service_url}")
    };
    let url = Url::parse(&candidate)
        .map_err(|e| anyhow::anyhow!("invalid service url '{raw_service_url}': {e}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        anyhow::bail!("service url '{raw_service_url}' must use http or https");
    }
    Ok(candidate)
}
