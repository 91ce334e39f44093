// Fragment loader for zapcfg
// Reads a configuration directory, merges base and overlay fragments, parses the result

use crate::configuration::ZapConfiguration;
use crate::error::ConfigError;
use crate::interpolate::{env_lookup, interpolate};
use crate::merge::merge_values;
use crate::models::{FragmentSource, ZapDocument};
use crate::sources::OsFragmentSource;
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};

const FRAGMENT_EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

type Lookup = Box<dyn Fn(&str) -> Option<String>>;

/// Loads [`ZapConfiguration`]s from a [`FragmentSource`].
pub struct ConfigLoader<S: FragmentSource = OsFragmentSource> {
    source: S,
    lookup: Lookup,
}

impl ConfigLoader<OsFragmentSource> {
    /// Loader over the real filesystem and process environment
    pub fn new() -> Self {
        Self::with_source(OsFragmentSource)
    }
}

impl Default for ConfigLoader<OsFragmentSource> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: FragmentSource> ConfigLoader<S> {
    pub fn with_source(source: S) -> Self {
        Self {
            source,
            lookup: Box::new(env_lookup),
        }
    }

    /// Replace the environment used for `${NAME}` placeholders
    pub fn with_env_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + 'static,
    {
        self.lookup = Box::new(lookup);
        self
    }

    /// Fragment files of `dir` in merge order: base fragments by file name, then overlays by file name.
    pub fn fragments(&self, dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
        if !self.source.is_dir(dir) {
            return Err(ConfigError::MissingDirectory {
                path: dir.to_path_buf(),
            });
        }
        Ok(order_fragments(self.source.list(dir)?))
    }

    /// Merge every fragment of `dir` into one typed document
    pub fn load_document(&self, dir: &Path) -> Result<(ZapDocument, Vec<PathBuf>), ConfigError> {
        let fragments = self.fragments(dir)?;
        if fragments.is_empty() {
            tracing::info!(dir = %dir.display(), "no configuration fragments found, using empty configuration");
        }

        let mut merged = Value::Mapping(Mapping::new());
        for path in &fragments {
            tracing::debug!(fragment = %path.display(), "merging configuration fragment");
            let fragment = self.parse_fragment(path)?;
            merge_values(&mut merged, fragment);
        }
        interpolate(&mut merged, &self.lookup);

        let document: ZapDocument = serde_yaml::from_value(merged).map_err(ConfigError::Schema)?;
        Ok((document, fragments))
    }

    /// Load `dir` and resolve the active configuration for `target`.
    pub fn load(
        &self,
        dir: impl AsRef<Path>,
        target: &str,
        forced_context: Option<&str>,
    ) -> Result<ZapConfiguration, ConfigError> {
        let dir = dir.as_ref();
        let (document, fragments) = self.load_document(dir)?;
        tracing::info!(
            dir = %dir.display(),
            fragments = fragments.len(),
            url = target,
            "loaded scan configuration"
        );
        ZapConfiguration::from_document(dir, target, document, fragments, forced_context)
    }

    fn parse_fragment(&self, path: &Path) -> Result<Value, ConfigError> {
        let bytes = self.source.read(path)?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Mapping(Mapping::new()));
        }
        let value: Value = serde_yaml::from_slice(&bytes).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        match value {
            Value::Mapping(_) => Ok(value),
            Value::Null => Ok(Value::Mapping(Mapping::new())),
            _ => Err(ConfigError::NotAMapping {
                path: path.to_path_buf(),
            }),
        }
    }
}

fn is_fragment(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(false, |ext| {
            FRAGMENT_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

fn is_overlay(path: &Path) -> bool {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map_or(false, |stem| stem.to_ascii_lowercase().contains("overlay"))
}

fn order_fragments(files: Vec<PathBuf>) -> Vec<PathBuf> {
    let (mut overlays, mut base): (Vec<PathBuf>, Vec<PathBuf>) =
        files.into_iter().filter(|p| is_fragment(p)).partition(|p| is_overlay(p));
    base.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    overlays.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    base.extend(overlays);
    base
}
