//! Inline value templates.
//!
//! Every string in a fragment is rewritten in three steps:
//!
//! 1. `${NAME}` is replaced by `NAME` from the environment snapshot (empty if unset).
//! 2. `$(path)` is replaced by the contents of that file (empty if it isn't a
//!    regular file). Relative paths are taken from the working directory.
//! 3. If the whole string is then `kind:rest`, it is cast:
//!
//! | Prefix | Result |
//! |--------|--------|
//! | `boolean:` | `true` (the remainder is never empty) |
//! | `number:` | the remainder as a number; blank is `0` |
//! | `string:` | the remainder, unchanged |
//! | `json:` | the remainder parsed as JSON |
//! | `regex:` | the remainder compiled as a regular expression |

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::env::EnvMap;
use crate::error::RcfigError;
use crate::value::{Mapping, Value};

static ENV_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("valid regex"));
static FILE_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\(([^)]+)\)").expect("valid regex"));
static CAST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^(boolean|number|string|json|regex):(.+)$").expect("valid regex")
});

/// Applies templates against a fixed environment snapshot and working directory.
#[derive(Debug, Clone, Copy)]
pub struct Templater<'a> {
    env: &'a EnvMap,
    cwd: &'a Path,
}

impl<'a> Templater<'a> {
    pub fn new(env: &'a EnvMap, cwd: &'a Path) -> Self {
        Self { env, cwd }
    }

    /// Template every string in `fragment`, in place.
    pub fn apply_mapping(&self, fragment: &mut Mapping) -> Result<(), RcfigError> {
        for (key, value) in fragment.iter_mut() {
            self.apply(value, key)?;
        }
        Ok(())
    }

    /// Template `value` and everything below it. `path` names `value` in errors.
    pub fn apply(&self, value: &mut Value, path: &str) -> Result<(), RcfigError> {
        match value {
            Value::String(s) => {
                let rendered = self.render(s, path)?;
                *value = rendered;
            }
            Value::Sequence(items) => {
                for (i, item) in items.iter_mut().enumerate() {
                    self.apply(item, &format!("{path}.{i}"))?;
                }
            }
            Value::Mapping(map) => {
                for (key, item) in map.iter_mut() {
                    self.apply(item, &format!("{path}.{key}"))?;
                }
            }
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::Regex(_) => {}
        }
        Ok(())
    }

    /// Template a single string.
    pub fn render(&self, raw: &str, path: &str) -> Result<Value, RcfigError> {
        let with_env = ENV_REFERENCE.replace_all(raw, |caps: &Captures| {
            self.env.get(&caps[1]).cloned().unwrap_or_default()
        });
        let with_files = FILE_REFERENCE.replace_all(&with_env, |caps: &Captures| {
            self.read_include(&caps[1])
        });

        if let Some(caps) = CAST.captures(&with_files) {
            return cast(&caps[1], &caps[2], path);
        }
        Ok(Value::String(with_files.into_owned()))
    }

    fn read_include(&self, path: &str) -> String {
        let path = self.cwd.join(path);
        if !path.is_file() {
            return String::new();
        }
        fs::read_to_string(&path).unwrap_or_else(|e| {
            tracing::debug!(path = %path.display(), error = %e, "included file unreadable");
            String::new()
        })
    }
}

fn cast(kind: &str, rest: &str, path: &str) -> Result<Value, RcfigError> {
    let invalid = |reason: String| RcfigError::TemplateCast {
        key: path.to_string(),
        cast: kind.to_string(),
        reason,
    };

    match kind {
        "boolean" => Ok(Value::Bool(!rest.is_empty())),
        "number" => {
            let trimmed = rest.trim();
            if trimmed.is_empty() {
                return Ok(Value::Number(0.0));
            }
            trimmed
                .parse::<f64>()
                .map(Value::Number)
                .map_err(|e| invalid(format!("`{trimmed}` is not a number ({e})")))
        }
        "json" => serde_json::from_str::<serde_json::Value>(rest)
            .map(Value::from)
            .map_err(|e| invalid(e.to_string())),
        "regex" => Regex::new(rest)
            .map(Value::Regex)
            .map_err(|e| invalid(e.to_string())),
        _ => Ok(Value::String(rest.to_string())),
    }
}
