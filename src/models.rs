// Core data models and traits for zapcfg
// Typed schema for the YAML fragments, parsed strictly with serde

use crate::error::ConfigError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

/// Root of a merged configuration document.
///
/// Every top-level section is optional; an empty directory yields `ZapDocument::default()`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ZapDocument {
    #[serde(default)]
    pub global: Option<GlobalConfig>,
    #[serde(default)]
    pub contexts: Vec<ContextConfig>,
    #[serde(default)]
    pub apis: Vec<ApiConfig>,
    #[serde(default)]
    pub spiders: Vec<SpiderConfig>,
    #[serde(default)]
    pub scanners: Vec<ScannerConfig>,
}

/// Settings applied to the scanner session as a whole
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GlobalConfig {
    pub session_name: Option<String>,
    #[serde(default)]
    pub addon_install: Vec<String>,
    pub addon_update: Option<bool>,
    pub proxy: Option<ProxyConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProxyConfig {
    #[serde(default)]
    pub enabled: bool,
    pub address: Option<String>,
    pub port: Option<u16>,
    #[serde(default)]
    pub skip_proxy_addresses: Vec<String>,
}

/// A scan context: the target application and how to authenticate against it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ContextConfig {
    pub name: String,
    pub url: Option<String>,
    #[serde(default)]
    pub include_paths: Vec<String>,
    #[serde(default)]
    pub exclude_paths: Vec<String>,
    pub technology: Option<TechnologyConfig>,
    pub authentication: Option<AuthenticationConfig>,
    #[serde(default)]
    pub users: Vec<UserConfig>,
    pub session: Option<SessionConfig>,
    #[serde(skip)]
    scope: ScopePatterns,
}

#[derive(Debug, Clone, Default)]
struct ScopePatterns {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl ContextConfig {
    /// Compile `includePaths` / `excludePaths` into anchored regexes.
    ///
    /// Patterns follow the scanner's convention of matching the whole URL.
    pub(crate) fn compile_scope(&mut self) -> Result<(), ConfigError> {
        let compile = |patterns: &[String]| -> Result<Vec<Regex>, ConfigError> {
            patterns
                .iter()
                .map(|p| {
                    Regex::new(&format!("^(?:{})$", p)).map_err(|source| {
                        ConfigError::InvalidPattern {
                            context: self.name.clone(),
                            pattern: p.clone(),
                            source,
                        }
                    })
                })
                .collect()
        };
        let include = compile(&self.include_paths)?;
        let exclude = compile(&self.exclude_paths)?;
        self.scope = ScopePatterns { include, exclude };
        Ok(())
    }

    /// Whether `url` belongs to this context.
    ///
    /// Without include patterns the context URL acts as the include prefix.
    /// Exclusions always win.
    pub fn is_in_scope(&self, url: &str) -> bool {
        let included = if self.scope.include.is_empty() {
            self.url
                .as_deref()
                .map_or(false, |prefix| url_has_prefix(url, prefix))
        } else {
            self.scope.include.iter().any(|re| re.is_match(url))
        };
        included && !self.scope.exclude.iter().any(|re| re.is_match(url))
    }

    pub fn user_by_name(&self, name: &str) -> Option<&UserConfig> {
        self.users.iter().find(|u| u.name == name)
    }

    /// The user marked `forced: true`, if any
    pub fn forced_user(&self) -> Option<&UserConfig> {
        self.users.iter().find(|u| u.forced)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TechnologyConfig {
    #[serde(default)]
    pub included: Vec<String>,
    #[serde(default)]
    pub excluded: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthenticationType {
    Manual,
    BasicAuth,
    FormBased,
    JsonBased,
    ScriptBased,
}

impl fmt::Display for AuthenticationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthenticationType::Manual => write!(f, "manual"),
            AuthenticationType::BasicAuth => write!(f, "basic-auth"),
            AuthenticationType::FormBased => write!(f, "form-based"),
            AuthenticationType::JsonBased => write!(f, "json-based"),
            AuthenticationType::ScriptBased => write!(f, "script-based"),
        }
    }
}

/// Authentication method of a context.
///
/// Only the sub-section named by `type` is consulted by the scanner; the
/// others may be present so overlays can switch methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthenticationConfig {
    #[serde(rename = "type")]
    pub kind: AuthenticationType,
    #[serde(rename = "basic-auth")]
    pub basic_auth: Option<BasicAuthConfig>,
    #[serde(rename = "form-based")]
    pub form_based: Option<RequestAuthConfig>,
    #[serde(rename = "json-based")]
    pub json_based: Option<RequestAuthConfig>,
    #[serde(rename = "script-based")]
    pub script_based: Option<ScriptConfig>,
    pub verification: Option<VerificationConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BasicAuthConfig {
    pub hostname: String,
    pub realm: Option<String>,
    pub port: Option<u16>,
}

/// Shared shape of form-based and JSON-based login requests
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RequestAuthConfig {
    pub login_request_url: String,
    pub login_request_data: Option<String>,
    pub login_page_url: Option<String>,
}

/// A script registered with the scanner (authentication or session handling)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ScriptConfig {
    pub name: String,
    pub script_engine: Option<String>,
    pub script_file_name: Option<String>,
    pub script_description: Option<String>,
    #[serde(default)]
    pub script_arguments: std::collections::BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VerificationConfig {
    pub is_logged_in_indicator: Option<String>,
    pub is_logged_out_indicator: Option<String>,
    pub poll_url: Option<String>,
    pub poll_frequency: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UserConfig {
    pub name: String,
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default)]
    pub forced: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionType {
    CookieBasedSessionManagement,
    HttpAuthSessionManagement,
    ScriptBasedSessionManagement,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SessionConfig {
    #[serde(rename = "type")]
    pub kind: SessionType,
    pub script_based_session_management: Option<ScriptConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiFormat {
    Openapi,
    Soap,
    Graphql,
}

/// API definition to import before spidering
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ApiConfig {
    pub name: String,
    pub context: Option<String>,
    pub format: ApiFormat,
    pub url: Option<String>,
    pub api_file: Option<String>,
    pub host_override: Option<String>,
}

/// Which spider implementation the scanner should run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpiderKind {
    /// Traditional link-following spider
    Http,
    /// Browser-driven spider for JavaScript-heavy applications
    Ajax,
}

/// Crawl settings for one target
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SpiderConfig {
    pub name: String,
    pub context: Option<String>,
    pub user: Option<String>,
    pub url: Option<String>,
    #[serde(default)]
    pub ajax: bool,
    /// Maximum crawl time in minutes, 0 means unlimited
    pub max_duration: Option<u32>,
    pub max_depth: Option<u32>,
    pub max_children: Option<u32>,
    pub thread_count: Option<u32>,
    pub accept_cookies: Option<bool>,
    pub parse_robots_txt: Option<bool>,
    pub parse_sitemap_xml: Option<bool>,
    pub user_agent: Option<String>,
    pub request_wait_time: Option<u32>,
    #[serde(default)]
    pub exclude_paths: Vec<String>,
    pub fail_if_found_urls_less_than: Option<u32>,
    pub warn_if_found_urls_less_than: Option<u32>,

    // AJAX spider only
    pub browser_id: Option<String>,
    pub max_crawl_states: Option<u32>,
    pub event_wait: Option<u32>,
    pub reload_wait: Option<u32>,
    pub click_default_elems: Option<bool>,
    pub click_elems_once: Option<bool>,
    pub random_inputs: Option<bool>,
    #[serde(default)]
    pub elements: Vec<String>,
}

impl SpiderConfig {
    pub fn kind(&self) -> SpiderKind {
        if self.ajax {
            SpiderKind::Ajax
        } else {
            SpiderKind::Http
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AttackStrength {
    Default,
    Low,
    Medium,
    High,
    Insane,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertThreshold {
    Off,
    Default,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ScannerRule {
    pub id: u32,
    pub name: Option<String>,
    pub strength: Option<AttackStrength>,
    pub threshold: Option<AlertThreshold>,
}

/// Active scan settings for one target
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ScannerConfig {
    pub name: String,
    pub context: Option<String>,
    pub url: Option<String>,
    pub user: Option<String>,
    pub policy: Option<String>,
    pub default_policy: Option<String>,
    pub max_rule_duration_in_mins: Option<u32>,
    pub max_scan_duration_in_mins: Option<u32>,
    pub thread_per_host: Option<u32>,
    pub delay_in_ms: Option<u32>,
    pub max_children: Option<u32>,
    pub recurse: Option<bool>,
    pub in_scope_only: Option<bool>,
    #[serde(rename = "handleAntiCSRFTokens")]
    pub handle_anti_csrf_tokens: Option<bool>,
    pub scan_headers_all_requests: Option<bool>,
    #[serde(default)]
    pub rules: Vec<ScannerRule>,
}

/// Check whether `target` lives under `prefix`.
///
/// Scheme, host and port are compared after URL normalisation, paths by
/// segment with trailing slashes ignored. Unparseable input falls back to a
/// plain string prefix test.
pub fn url_has_prefix(target: &str, prefix: &str) -> bool {
    let (Ok(target_url), Ok(prefix_url)) = (Url::parse(target), Url::parse(prefix)) else {
        return target.starts_with(prefix);
    };
    if target_url.scheme() != prefix_url.scheme()
        || target_url.host_str() != prefix_url.host_str()
        || target_url.port_or_known_default() != prefix_url.port_or_known_default()
    {
        return false;
    }
    let base = prefix_url.path().trim_end_matches('/');
    let path = target_url.path();
    base.is_empty()
        || path.trim_end_matches('/') == base
        || path.starts_with(&format!("{}/", base))
}

/// Filesystem seam for the loader.
///
/// The loader never touches `std::fs` directly so tests can run against
/// in-memory fragments.
pub trait FragmentSource {
    /// Whether `path` exists and is a directory
    fn is_dir(&self, path: &Path) -> bool;

    /// Files directly inside `dir`, in any order
    fn list(&self, dir: &Path) -> Result<Vec<PathBuf>, ConfigError>;

    /// Raw bytes of one fragment; decoding is left to the YAML parser
    fn read(&self, path: &Path) -> Result<Vec<u8>, ConfigError>;
}
