// Resolved scan configuration for zapcfg
// Picks the context, spider, scanner and api blocks that apply to one target

use crate::error::ConfigError;
use crate::loader::ConfigLoader;
use crate::models::{
    url_has_prefix, ApiConfig, ContextConfig, GlobalConfig, ScannerConfig, SpiderConfig,
    ZapDocument,
};
use std::path::{Path, PathBuf};

/// Blocks that are attached to a context by name or to a target by URL
trait ContextBound {
    fn block_name(&self) -> &str;
    fn context(&self) -> Option<&str>;
    fn url(&self) -> Option<&str>;
    fn user(&self) -> Option<&str> {
        None
    }
}

impl ContextBound for SpiderConfig {
    fn block_name(&self) -> &str {
        &self.name
    }
    fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }
    fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }
    fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }
}

impl ContextBound for ScannerConfig {
    fn block_name(&self) -> &str {
        &self.name
    }
    fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }
    fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }
    fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }
}

impl ContextBound for ApiConfig {
    fn block_name(&self) -> &str {
        &self.name
    }
    fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }
    fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }
}

/// The merged configuration of one directory, bound to one target URL.
///
/// Built once per run and read-only afterwards. Accessors returning `Option`
/// yield `None` when no fragment declares a matching block; that is not an error.
#[derive(Debug, Clone)]
pub struct ZapConfiguration {
    config_dir: PathBuf,
    target: String,
    fragments: Vec<PathBuf>,
    document: ZapDocument,
    active_context: Option<usize>,
}

impl ZapConfiguration {
    /// Load `config_dir` from disk and bind it to `target`
    pub fn load(config_dir: impl AsRef<Path>, target: &str) -> Result<Self, ConfigError> {
        ConfigLoader::new().load(config_dir, target, None)
    }

    /// Like [`ZapConfiguration::load`], but selects the context by name instead of by URL
    pub fn load_with_context(
        config_dir: impl AsRef<Path>,
        target: &str,
        context: &str,
    ) -> Result<Self, ConfigError> {
        ConfigLoader::new().load(config_dir, target, Some(context))
    }

    pub(crate) fn from_document(
        config_dir: &Path,
        target: &str,
        mut document: ZapDocument,
        fragments: Vec<PathBuf>,
        forced_context: Option<&str>,
    ) -> Result<Self, ConfigError> {
        for context in &mut document.contexts {
            context.compile_scope()?;
        }

        let active_context = match forced_context {
            Some(name) => Some(
                document
                    .contexts
                    .iter()
                    .position(|c| c.name == name)
                    .ok_or_else(|| ConfigError::UnknownContext(name.to_string()))?,
            ),
            None => document.contexts.iter().position(|c| {
                c.url
                    .as_deref()
                    .map_or(false, |prefix| url_has_prefix(target, prefix))
            }),
        };

        let config = Self {
            config_dir: config_dir.to_path_buf(),
            target: target.to_string(),
            fragments,
            document,
            active_context,
        };
        config.warn_dangling_references();
        match config.active_context_config() {
            Some(ctx) => tracing::debug!(context = %ctx.name, "active context selected"),
            None => tracing::debug!(url = %config.target, "no context matches target"),
        }
        Ok(config)
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Fragment files in the order they were merged
    pub fn fragments(&self) -> &[PathBuf] {
        &self.fragments
    }

    pub fn document(&self) -> &ZapDocument {
        &self.document
    }

    pub fn global_config(&self) -> Option<&GlobalConfig> {
        self.document.global.as_ref()
    }

    pub fn contexts(&self) -> &[ContextConfig] {
        &self.document.contexts
    }

    pub fn spiders(&self) -> &[SpiderConfig] {
        &self.document.spiders
    }

    pub fn scanners(&self) -> &[ScannerConfig] {
        &self.document.scanners
    }

    pub fn apis(&self) -> &[ApiConfig] {
        &self.document.apis
    }

    pub fn context_by_name(&self, name: &str) -> Option<&ContextConfig> {
        self.document.contexts.iter().find(|c| c.name == name)
    }

    pub fn spider_by_name(&self, name: &str) -> Option<&SpiderConfig> {
        by_name(&self.document.spiders, name)
    }

    pub fn scanner_by_name(&self, name: &str) -> Option<&ScannerConfig> {
        by_name(&self.document.scanners, name)
    }

    pub fn api_by_name(&self, name: &str) -> Option<&ApiConfig> {
        by_name(&self.document.apis, name)
    }

    /// Context selected by name (when forced) or by target URL prefix
    pub fn active_context_config(&self) -> Option<&ContextConfig> {
        self.active_context.map(|idx| &self.document.contexts[idx])
    }

    /// Spider settings for the current target, or `None` if no fragment declares one
    pub fn active_spider_config(&self) -> Option<&SpiderConfig> {
        self.active_block(&self.document.spiders)
    }

    pub fn active_scanner_config(&self) -> Option<&ScannerConfig> {
        self.active_block(&self.document.scanners)
    }

    pub fn active_api_config(&self) -> Option<&ApiConfig> {
        self.active_block(&self.document.apis)
    }

    // With an active context only blocks bound to it qualify; otherwise the block URL must cover the target.
    fn active_block<'a, T: ContextBound>(&self, blocks: &'a [T]) -> Option<&'a T> {
        match self.active_context_config() {
            Some(ctx) => blocks.iter().find(|b| b.context() == Some(ctx.name.as_str())),
            None => blocks.iter().find(|b| {
                b.url()
                    .map_or(false, |prefix| url_has_prefix(&self.target, prefix))
            }),
        }
    }

    fn warn_dangling_references(&self) {
        self.warn_block_refs("spider", &self.document.spiders);
        self.warn_block_refs("scanner", &self.document.scanners);
        self.warn_block_refs("api", &self.document.apis);
    }

    fn warn_block_refs<T: ContextBound>(&self, kind: &str, blocks: &[T]) {
        for block in blocks {
            let Some(context_name) = block.context() else {
                continue;
            };
            match self.context_by_name(context_name) {
                None => tracing::warn!(
                    kind,
                    block = block.block_name(),
                    context = context_name,
                    "block references an undeclared context"
                ),
                Some(ctx) => {
                    if let Some(user) = block.user() {
                        if ctx.user_by_name(user).is_none() {
                            tracing::warn!(
                                kind,
                                block = block.block_name(),
                                user,
                                "block references a user its context does not declare"
                            );
                        }
                    }
                }
            }
        }
    }
}

fn by_name<'a, T: ContextBound>(blocks: &'a [T], name: &str) -> Option<&'a T> {
    blocks.iter().find(|b| b.block_name() == name)
}
