//! Config file loading

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use super::Settings;

/// Load settings from an explicit config file, or auto-discover one next to
/// the anchor directory. An explicitly provided file that fails to parse is
/// a hard error; an auto-discovered one soft-fails back to defaults with a
/// warning, so a stray half-edited config cannot brick the tool.
pub fn load_settings(anchor: &Path, config_path: Option<&Path>) -> Result<Settings> {
    let config_path_provided = config_path.is_some();

    let discovered = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => discover_config(anchor),
    };

    let Some(config_file) = discovered else {
        return Ok(Settings::default());
    };

    let content = fs::read_to_string(&config_file)
        .with_context(|| format!("Failed reading config file: {}", config_file.display()))?;

    let ext = config_file.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();

    let parsed = match ext.as_str() {
        "toml" => parse_toml_settings(&content, &config_file),
        "yaml" | "yml" => parse_yaml_settings(&content, &config_file),
        other => Err(anyhow::anyhow!(
            "Unsupported config extension '.{}' for file {}",
            other,
            config_file.display()
        )),
    };

    match parsed {
        Ok(settings) => Ok(settings),
        Err(e) => {
            if config_path_provided {
                return Err(e);
            }
            tracing::warn!(
                "Failed to parse auto-discovered config {}: {}",
                config_file.display(),
                e
            );
            Ok(Settings::default())
        }
    }
}

/// Parse TOML settings, supporting a nested [consolidator] section so the
/// tool can share a project-wide config file.
fn parse_toml_settings(content: &str, config_file: &Path) -> Result<Settings> {
    let raw: toml::Value = toml::from_str(content)
        .with_context(|| format!("Invalid TOML syntax: {}", config_file.display()))?;

    let config_val = if let Some(nested) = raw.get("consolidator") {
        nested.clone()
    } else {
        raw
    };

    config_val
        .try_into()
        .with_context(|| format!("Invalid TOML config: {}", config_file.display()))
}

/// Parse YAML settings, supporting a nested consolidator section.
fn parse_yaml_settings(content: &str, config_file: &Path) -> Result<Settings> {
    let raw: serde_yaml::Value = serde_yaml::from_str(content)
        .with_context(|| format!("Invalid YAML syntax: {}", config_file.display()))?;

    let config_val = if let Some(nested) = raw.get("consolidator") {
        nested.clone()
    } else {
        raw
    };

    serde_yaml::from_value(config_val)
        .with_context(|| format!("Invalid YAML config: {}", config_file.display()))
}

fn discover_config(anchor: &Path) -> Option<std::path::PathBuf> {
    let candidates = [
        "consolidator.toml",
        ".consolidator.toml",
        "consolidator.yml",
        ".consolidator.yml",
        "consolidator.yaml",
        ".consolidator.yaml",
    ];

    for candidate in candidates {
        let path = anchor.join(candidate);
        if path.exists() {
            return Some(path);
        }
    }

    None
}
