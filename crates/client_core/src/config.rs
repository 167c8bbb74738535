use std::{collections::HashMap, fs, io, path::Path};

use anyhow::Context;
use shared::protocol::RealmCallSettings;

pub const DEFAULT_CONFIG_PATH: &str = "call_tools.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub log_filter: String,
    pub server_jitsi_server_url: Option<String>,
    pub evict_ignored_on_discard: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_filter: "info".into(),
            server_jitsi_server_url: None,
            evict_ignored_on_discard: true,
        }
    }
}

impl Settings {
    /// Fills in the server-wide Jitsi URL when the realm payload lacks one.
    pub fn apply_to(&self, realm: &mut RealmCallSettings) {
        if realm.server_jitsi_server_url.is_none() {
            realm.server_jitsi_server_url = self.server_jitsi_server_url.clone();
        }
    }
}

/// Defaults, then `path` if it exists, then environment overrides. A file
/// that exists but cannot be read or parsed is an error and applies nothing.
pub fn load_settings_from(path: &Path) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match fs::read_to_string(path) {
        Ok(raw) => {
            settings = apply_file_config(&settings, &raw)
                .with_context(|| format!("invalid config file '{}'", path.display()))?;
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", path.display()));
        }
    }

    if let Ok(v) = std::env::var("CALL_TOOLS_LOG") {
        settings.log_filter = v;
    }
    if let Ok(v) = std::env::var("APP__LOG_FILTER") {
        settings.log_filter = v;
    }

    if let Ok(v) = std::env::var("SERVER_JITSI_SERVER_URL") {
        settings.server_jitsi_server_url = Some(v);
    }
    if let Ok(v) = std::env::var("APP__SERVER_JITSI_SERVER_URL") {
        settings.server_jitsi_server_url = Some(v);
    }

    if let Ok(v) = std::env::var("APP__EVICT_IGNORED_ON_DISCARD") {
        settings.evict_ignored_on_discard = parse_flag(&v)
            .with_context(|| format!("invalid APP__EVICT_IGNORED_ON_DISCARD value '{v}'"))?;
    }

    Ok(settings)
}

fn apply_file_config(base: &Settings, raw: &str) -> anyhow::Result<Settings> {
    let mut settings = base.clone();
    let file_cfg = toml::from_str::<HashMap<String, String>>(raw)
        .context("config file must be a flat table of string values")?;

    if let Some(v) = file_cfg.get("log_filter") {
        settings.log_filter = v.clone();
    }
    if let Some(v) = file_cfg.get("server_jitsi_server_url") {
        settings.server_jitsi_server_url = Some(v.clone());
    }
    if let Some(v) = file_cfg.get("evict_ignored_on_discard") {
        settings.evict_ignored_on_discard = parse_flag(v)
            .with_context(|| format!("invalid evict_ignored_on_discard value '{v}'"))?;
    }

    Ok(settings)
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
