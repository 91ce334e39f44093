// Environment placeholder expansion for zapcfg
// Replaces ${NAME} in string values before the typed parse

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde_yaml::Value;

lazy_static! {
    static ref PLACEHOLDER: Regex = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap();
}

/// Expand `${NAME}` placeholders in every string of `value`.
///
/// Keys are left untouched. Unknown names stay as written so the problem is
/// visible in the exported configuration.
pub fn interpolate<F>(value: &mut Value, lookup: &F)
where
    F: Fn(&str) -> Option<String>,
{
    match value {
        Value::String(s) => {
            if let Some(expanded) = expand(s, lookup) {
                *s = expanded;
            }
        }
        Value::Mapping(map) => {
            for (_, v) in map.iter_mut() {
                interpolate(v, lookup);
            }
        }
        Value::Sequence(seq) => {
            for v in seq.iter_mut() {
                interpolate(v, lookup);
            }
        }
        Value::Tagged(tagged) => interpolate(&mut tagged.value, lookup),
        _ => {}
    }
}

fn expand<F>(s: &str, lookup: &F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    if !s.contains("${") {
        return None;
    }
    let expanded = PLACEHOLDER.replace_all(s, |caps: &Captures| match lookup(&caps[1]) {
        Some(v) => v,
        None => {
            tracing::warn!(variable = &caps[1], "unresolved placeholder left in configuration");
            caps[0].to_string()
        }
    });
    Some(expanded.into_owned())
}

/// Lookup backed by the process environment
pub fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}
