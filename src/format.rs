//! Config file formats: detection and parsing.
//!
//! A file whose extension names a format is parsed by that format alone and a
//! failure is fatal. Files without one (`~/.myapprc`, `/etc/myapp/config`) are
//! sniffed: shallow syntactic cues pick a likely format, which only decides the
//! *order* parsers are tried in. The first parser to produce a non-empty
//! mapping wins.

use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::ini;
use crate::value::{Mapping, Value};

static LINE_COMMENT_SLASHES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"//[^\n]*").expect("valid regex"));
static LINE_COMMENT_SEMICOLON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r";[^\n]*").expect("valid regex"));
static LINE_COMMENT_HASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#[^\n]*").expect("valid regex"));
static INI_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(?:\[[^\]\s]+\]|[^\s=]+[ \t]*=[ \t]*\S)").expect("valid regex")
});
static YAML_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[^:\n]+:").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Ini,
    Yaml,
    /// Only used for explicitly named `.toml` files; never sniffed.
    Toml,
}

impl Format {
    /// The format named by a path's extension, if any.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Format::Json),
            "ini" => Some(Format::Ini),
            "yaml" | "yml" => Some(Format::Yaml),
            "toml" => Some(Format::Toml),
            _ => None,
        }
    }

    /// Parse `text` as this format. The document must be a mapping.
    pub fn parse(self, text: &str) -> Result<Mapping, String> {
        let value = match self {
            Format::Json => serde_json::from_str::<serde_json::Value>(text)
                .map(Value::from)
                .map_err(|e| e.to_string())?,
            Format::Ini => return ini::parse(text),
            Format::Yaml => serde_yaml::from_str::<serde_yaml::Value>(text)
                .map(Value::from)
                .map_err(|e| e.to_string())?,
            Format::Toml => toml::from_str::<toml::Table>(text)
                .map(|table| Value::from(toml::Value::Table(table)))
                .map_err(|e| e.to_string())?,
        };
        match value {
            Value::Mapping(map) => Ok(map),
            other => Err(format!("expected a mapping at the top level, found `{other}`")),
        }
    }

    /// Parsers to try, in order, once this format has been guessed.
    fn trial_order(self) -> &'static [Format] {
        match self {
            Format::Json => &[Format::Json, Format::Ini, Format::Yaml],
            Format::Ini => &[Format::Ini, Format::Json, Format::Yaml],
            Format::Yaml => &[Format::Yaml, Format::Json, Format::Ini],
            Format::Toml => &[Format::Toml],
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Json => f.write_str("JSON"),
            Format::Ini => f.write_str("INI"),
            Format::Yaml => f.write_str("YAML"),
            Format::Toml => f.write_str("TOML"),
        }
    }
}

/// Guess the format of unlabeled text. First match wins: JSON, INI, YAML.
pub fn sniff(text: &str) -> Option<Format> {
    let text = text.trim_start();

    if LINE_COMMENT_SLASHES
        .replace_all(text, "")
        .trim_start()
        .starts_with('{')
    {
        return Some(Format::Json);
    }
    if INI_SHAPE.is_match(LINE_COMMENT_SEMICOLON.replace_all(text, "").trim_start()) {
        return Some(Format::Ini);
    }
    if YAML_SHAPE.is_match(LINE_COMMENT_HASH.replace_all(text, "").trim_start()) {
        return Some(Format::Yaml);
    }
    None
}

/// Parse text whose format isn't known from its file name.
///
/// Returns `None` when nothing could make sense of it: no format was sniffed,
/// or every parser in the chain failed. A chain in which the only successes
/// were empty mappings yields an empty mapping, as does blank text.
pub fn parse_unlabeled(text: &str) -> Option<Mapping> {
    if text.trim().is_empty() {
        return Some(Mapping::new());
    }
    let Some(guess) = sniff(text) else {
        tracing::debug!("no format cues found in unlabeled config");
        return None;
    };

    let mut parsed_empty = false;
    for &format in guess.trial_order() {
        match format.parse(text) {
            Ok(data) if !data.is_empty() => return Some(data),
            Ok(_) => parsed_empty = true,
            Err(message) => tracing::debug!(%format, %message, "parser trial failed"),
        }
    }
    parsed_empty.then(Mapping::new)
}
