//! Command-line flags as a config fragment.
//!
//! Flags are not declared up front: any `--name` on the command line becomes a
//! config key. The tokenizer understands
//!
//! | Argument | Result |
//! |----------|--------|
//! | `--port=8080` / `--port 8080` | `port = "8080"` |
//! | `--verbose` | `verbose = true` |
//! | `--no-color` | `color = false` |
//! | `-vx` | `v = true`, `x = true` |
//! | `-o out.txt` | `o = "out.txt"` |
//! | `--` | everything after it is positional |
//!
//! Values that look like negative numbers (`-5`) are positional rather than
//! short flags. A flag given more than once collects its values in order.
//! Splitting arguments into these shapes is left to `clap_lex`; only the
//! value attachment is done here.
//!
//! Flag names map to config paths the way env var names do: `--db--pool-size`
//! and `--db__pool_size` both set `db.poolSize`.

use std::ffi::{OsStr, OsString};
use std::path::PathBuf;
use std::sync::LazyLock;

use clap_lex::{ArgCursor, RawArgs};
use regex::{Captures, Regex};

use crate::assign::assign;
use crate::env::parse_value;
use crate::value::{Mapping, Value};

static NESTING_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__|--").expect("valid regex"));
static WORD_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[_-](\w)").expect("valid regex"));

/// A tokenized argument vector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedArgs {
    /// Raw flag names (without dashes) to their values, in command-line
    /// order: `Bool`, `String`, or a `Sequence` of those for repeated flags.
    pub flags: Mapping,
    pub positional: Vec<String>,
}

impl ParsedArgs {
    /// Tokenize `args` (without the program name).
    pub fn parse<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let raw = RawArgs::new(args);
        let mut cursor = raw.cursor();
        let mut parsed = ParsedArgs::default();

        while let Some(arg) = raw.next(&mut cursor) {
            if arg.is_escape() {
                parsed
                    .positional
                    .extend(raw.remaining(&mut cursor).map(lossy));
            } else if let Some((name, inline)) = arg.to_long() {
                let Ok(name) = name else {
                    parsed.positional.push(lossy(arg.to_value_os()));
                    continue;
                };
                if let Some(value) = inline {
                    parsed.set(name, Value::String(lossy(value)));
                } else if let Some(name) = name.strip_prefix("no-") {
                    parsed.set(name, Value::Bool(false));
                } else {
                    let value = take_value(&raw, &mut cursor);
                    parsed.set(name, value);
                }
            } else if arg.is_stdio() || arg.is_negative_number() {
                parsed.positional.push(lossy(arg.to_value_os()));
            } else if let Some(mut shorts) = arg.to_short() {
                let mut letters = Vec::new();
                while let Some(letter) = shorts.next_flag() {
                    letters.extend(letter.ok());
                }
                if let Some((last, rest)) = letters.split_last() {
                    for letter in rest {
                        parsed.set(&letter.to_string(), Value::Bool(true));
                    }
                    let value = take_value(&raw, &mut cursor);
                    parsed.set(&last.to_string(), value);
                }
            } else {
                parsed.positional.push(lossy(arg.to_value_os()));
            }
        }

        parsed
    }

    fn set(&mut self, name: &str, value: Value) {
        if name.is_empty() {
            return;
        }
        match self.flags.get_mut(name) {
            None => {
                self.flags.insert(name.to_string(), value);
            }
            Some(Value::Sequence(items)) => items.push(value),
            Some(existing) => {
                let first = std::mem::take(existing);
                *existing = Value::Sequence(vec![first, value]);
            }
        }
    }

    /// The path given with `--config`, if any. The last one wins when repeated.
    pub fn config_path(&self) -> Option<PathBuf> {
        match self.flags.get("config")? {
            Value::String(path) => Some(PathBuf::from(path)),
            Value::Sequence(items) => {
                items.iter().rev().find_map(Value::as_str).map(PathBuf::from)
            }
            _ => None,
        }
    }
}

/// The next argument as the current flag's value, or `true` when there is
/// none or it looks like another flag (including `-` and `-5`).
fn take_value(raw: &RawArgs, cursor: &mut ArgCursor) -> Value {
    match raw.peek_os(cursor).and_then(OsStr::to_str) {
        Some(next) if !next.starts_with('-') => {
            let value = Value::String(next.to_string());
            raw.next_os(cursor);
            value
        }
        _ => Value::Bool(true),
    }
}

fn lossy(arg: &OsStr) -> String {
    arg.to_string_lossy().into_owned()
}

/// Build the flag fragment: every flag, path-assigned under its converted name.
pub fn flags_to_table(args: &ParsedArgs, parse_values: bool) -> Mapping {
    let mut table = Mapping::new();
    for (name, value) in &args.flags {
        let path = flag_to_path(name);
        if path.is_empty() {
            continue;
        }
        assign(&mut table, &path, coerce(value.clone(), parse_values));
    }
    table
}

/// `DB--POOL-SIZE` -> `db.poolSize`.
pub fn flag_to_path(name: &str) -> String {
    let nested = NESTING_SEPARATOR.replace_all(&name.to_lowercase(), ".").into_owned();
    WORD_SEPARATOR
        .replace_all(&nested, |caps: &Captures| caps[1].to_uppercase())
        .into_owned()
}

fn coerce(value: Value, parse_values: bool) -> Value {
    match value {
        Value::String(s) if parse_values => parse_value(&s),
        Value::Sequence(items) => Value::Sequence(
            items
                .into_iter()
                .map(|item| coerce(item, parse_values))
                .collect(),
        ),
        other => other,
    }
}
