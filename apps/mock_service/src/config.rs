use std::{collections::HashMap, fs, net::SocketAddr, path::Path};

use anyhow::Context;

pub const SETTINGS_FILE: &str = "mock_service.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub bind_addr: String,
    pub simulated_delay_ms: u64,
    pub max_upload_bytes: usize,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8000".into(),
            simulated_delay_ms: 1500,
            max_upload_bytes: 256 * 1024 * 1024,
            log_filter: "info".into(),
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
    if let Some(v) = file_cfg.get("bind_addr") {
        settings.bind_addr = v.clone();
    }
    if let Some(v) = file_cfg.get("simulated_delay_ms") {
        if let Ok(parsed) = v.parse() {
            settings.simulated_delay_ms = parsed;
        }
    }
    if let Some(v) = file_cfg.get("max_upload_bytes") {
        if let Ok(parsed) = v.parse() {
            settings.max_upload_bytes = parsed;
        }
    }
    if let Some(v) = file_cfg.get("log_filter") {
        settings.log_filter = v.clone();
    }
}

fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("MOCK_SERVICE_BIND") {
        settings.bind_addr = v;
    }
    if let Some(v) = var("APP__BIND_ADDR") {
        settings.bind_addr = v;
    }
    if let Some(v) = var("APP__SIMULATED_DELAY_MS") {
        if let Ok(parsed) = v.parse() {
            settings.simulated_delay_ms = parsed;
        }
    }
    if let Some(v) = var("APP__MAX_UPLOAD_BYTES") {
        if let Ok(parsed) = v.parse() {
            settings.max_upload_bytes = parsed;
        }
    }
    if let Some(v) = var("APP__LOG_FILTER") {
        settings.log_filter = v;
    }
}

/// Parses the bind address, accepting a bare port as shorthand for loopback.
pub fn parse_bind_addr(raw_bind_addr: &str) -> anyhow::Result<SocketAddr> {
    let raw_bind_addr = raw_bind_addr.trim();
    if let Ok(port) = raw_bind_addr.parse::<u16>() {
        return Ok(SocketAddr::from(([127, 0, 0, 1], port)));
    }
    raw_bind_addr
        .parse()
        .with_context(|| format!("invalid bind address '{raw_bind_addr}'"))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
