// Export of the resolved configuration for zapcfg
// Writes the active blocks as JSON or YAML for the scanner integration to consume

use crate::configuration::ZapConfiguration;
use crate::error::ConfigError;
use crate::models::{ApiConfig, ContextConfig, GlobalConfig, ScannerConfig, SpiderConfig};
use chrono::Local;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Everything that applies to the current target, in one serializable view
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveConfig<'a> {
    pub target: &'a str,
    pub global: Option<&'a GlobalConfig>,
    pub context: Option<&'a ContextConfig>,
    pub api: Option<&'a ApiConfig>,
    pub spider: Option<&'a SpiderConfig>,
    pub scanner: Option<&'a ScannerConfig>,
}

pub fn render_active(config: &ZapConfiguration) -> ActiveConfig<'_> {
    ActiveConfig {
        target: config.target(),
        global: config.global_config(),
        context: config.active_context_config(),
        api: config.active_api_config(),
        spider: config.active_spider_config(),
        scanner: config.active_scanner_config(),
    }
}

pub fn to_json(config: &ZapConfiguration) -> Result<String, ConfigError> {
    serde_json::to_string_pretty(&render_active(config))
        .map_err(|e| ConfigError::Export(e.to_string()))
}

pub fn to_yaml(config: &ZapConfiguration) -> Result<String, ConfigError> {
    serde_yaml::to_string(&render_active(config)).map_err(|e| ConfigError::Export(e.to_string()))
}

fn write_export(out_dir: &Path, extension: &str, body: &str) -> Result<PathBuf, ConfigError> {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S_%3f");
    let (path, mut file) = create_unique(out_dir, &format!("zapcfg_active_{}", timestamp), extension)?;
    file.write_all(body.as_bytes())
        .map_err(|e| ConfigError::io(&path, e))?;
    tracing::info!(file = %path.display(), "exported active configuration");
    Ok(path)
}

// Never truncate an earlier export: append a counter until the name is free.
fn create_unique(out_dir: &Path, stem: &str, extension: &str) -> Result<(PathBuf, File), ConfigError> {
    let mut attempt = 0u32;
    loop {
        let name = if attempt == 0 {
            format!("{}.{}", stem, extension)
        } else {
            format!("{}_{}.{}", stem, attempt, extension)
        };
        let path = out_dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(ConfigError::io(&path, e)),
        }
    }
}

pub fn export_json(config: &ZapConfiguration, out_dir: &Path) -> Result<PathBuf, ConfigError> {
    write_export(out_dir, "json", &to_json(config)?)
}

pub fn export_yaml(config: &ZapConfiguration, out_dir: &Path) -> Result<PathBuf, ConfigError> {
    write_export(out_dir, "yaml", &to_yaml(config)?)
}
