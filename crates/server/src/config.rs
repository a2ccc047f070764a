use std::{fs, path::Path};

use anyhow::Context;
use serde::Deserialize;
use shared::catalog::Catalog;

pub const SETTINGS_FILE: &str = "lookup.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub bind_addr: String,
    pub catalog_path: String,
    /// Extra path prefixes under which the lookup routes are also served.
    pub alias_prefixes: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8000".into(),
            catalog_path: "./data/catalog.toml".into(),
            alias_prefixes: Vec::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    bind_addr: Option<String>,
    catalog_path: Option<String>,
    alias_prefixes: Option<Vec<String>>,
}

pub fn load_settings() -> Settings {
    let file = fs::read_to_string(SETTINGS_FILE).ok();
    load_settings_from(file.as_deref(), |key| std::env::var(key).ok())
}

/// Defaults, then the settings file, then environment variables.
pub fn load_settings_from(
    file: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Some(raw) = file {
        match toml::from_str::<FileSettings>(raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.bind_addr {
                    settings.bind_addr = v;
                }
                if let Some(v) = file_cfg.catalog_path {
                    settings.catalog_path = v;
                }
                if let Some(v) = file_cfg.alias_prefixes {
                    settings.alias_prefixes = v;
                }
            }
            Err(error) => {
                tracing::warn!(%error, "ignoring unreadable {SETTINGS_FILE}");
            }
        }
    }

    if let Some(v) = env("LOOKUP_BIND") {
        settings.bind_addr = v;
    }
    if let Some(v) = env("APP__BIND_ADDR") {
        settings.bind_addr = v;
    }

    if let Some(v) = env("LOOKUP_CATALOG") {
        settings.catalog_path = v;
    }
    if let Some(v) = env("APP__CATALOG_PATH") {
        settings.catalog_path = v;
    }

    if let Some(v) = env("APP__ALIAS_PREFIXES") {
        settings.alias_prefixes = v
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
    }

    settings
}

pub fn load_catalog(path: impl AsRef<Path>) -> anyhow::Result<Catalog> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog '{}'", path.display()))?;
    Catalog::from_toml_str(&raw)
        .with_context(|| format!("failed to parse catalog '{}'", path.display()))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
