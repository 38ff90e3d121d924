//! INI parsing.
//!
//! The dialect accepted here:
//!
//! ```ini
//! ; comment            (also `# comment`)
//! name = value
//! quoted = "with \"escapes\""
//! flag = true          ; true / false / null are typed, everything else is a string
//! list[] = a
//! list[] = b
//!
//! [database.primary]   ; dotted headers nest: database -> primary
//! url = pg://db
//! ```
//!
//! Anything else is an error, which lets the format sniffer fall through to
//! another parser instead of silently accepting YAML as INI.

use crate::assign::mapping_at;
use crate::value::{Mapping, Value};

pub fn parse(text: &str) -> Result<Mapping, String> {
    let mut root = Mapping::new();
    let mut section: Vec<String> = Vec::new();

    for (index, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        let line_no = index + 1;
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') {
            section = parse_header(line)
                .ok_or_else(|| format!("line {line_no}: malformed section header `{line}`"))?;
            // Create the section even if it ends up empty.
            mapping_at(&mut root, &segments(&section));
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            return Err(format!(
                "line {line_no}: expected `key = value` or `[section]`, found `{line}`"
            ));
        };
        let key = unquote(raw_key.trim()).unwrap_or_else(|| raw_key.trim().to_string());
        if key.is_empty() || key == "[]" {
            return Err(format!("line {line_no}: missing key before `=`"));
        }

        let value = parse_value(raw_value);
        let target = mapping_at(&mut root, &segments(&section));
        match key.strip_suffix("[]") {
            Some(list_key) => push_item(target, list_key, value),
            None => {
                target.insert(key, value);
            }
        }
    }

    Ok(root)
}

/// `[a.b] ; trailing comment` -> `["a", "b"]`.
fn parse_header(line: &str) -> Option<Vec<String>> {
    let end = line.find(']')?;
    let rest = line[end + 1..].trim();
    if !(rest.is_empty() || rest.starts_with(';') || rest.starts_with('#')) {
        return None;
    }
    let name = line[1..end].trim();
    if name.is_empty() {
        return None;
    }
    Some(name.split('.').map(|s| s.trim().to_string()).collect())
}

fn segments(section: &[String]) -> Vec<&str> {
    section.iter().map(String::as_str).collect()
}

fn push_item(target: &mut Mapping, key: &str, value: Value) {
    let slot = target
        .entry(key.to_string())
        .or_insert_with(|| Value::Sequence(Vec::new()));
    match slot {
        Value::Sequence(items) => items.push(value),
        other => {
            let previous = std::mem::take(other);
            *other = Value::Sequence(vec![previous, value]);
        }
    }
}

fn parse_value(raw: &str) -> Value {
    let raw = raw.trim();
    if let Some(s) = unquote(raw) {
        return Value::String(s);
    }
    let bare = strip_comment(raw);
    if let Some(s) = unquote(bare) {
        return Value::String(s);
    }
    match bare {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null" => Value::Null,
        other => Value::String(other.to_string()),
    }
}

fn strip_comment(raw: &str) -> &str {
    raw.find(|c| c == ';' || c == '#')
        .map_or(raw, |i| &raw[..i])
        .trim()
}

/// The contents of a fully quoted string. Double quotes honour JSON escapes.
fn unquote(raw: &str) -> Option<String> {
    if raw.len() < 2 {
        return None;
    }
    // Both quote characters are ASCII, so slicing them off stays on char boundaries.
    if raw.starts_with('"') && raw.ends_with('"') {
        let inner = &raw[1..raw.len() - 1];
        return Some(serde_json::from_str::<String>(raw).unwrap_or_else(|_| inner.to_string()));
    }
    if raw.starts_with('\'') && raw.ends_with('\'') {
        return Some(raw[1..raw.len() - 1].to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::mapping;
    use serde_json::json;

    #[test]
    fn flat_assignments() {
        let parsed = parse("c3 = c3\nport=8080\n").unwrap();
        assert_eq!(parsed, mapping(json!({"c3": "c3", "port": "8080"})));
    }

    #[test]
    fn sections_nest_on_dots() {
        let parsed = parse("top = 1\n[database]\nurl = pg://\n[database.replica]\nurl = pg://r\n")
            .unwrap();
        assert_eq!(
            parsed,
            mapping(json!({
                "top": "1",
                "database": {"url": "pg://", "replica": {"url": "pg://r"}}
            }))
        );
    }

    #[test]
    fn empty_section_is_kept() {
        let parsed = parse("[empty]\n").unwrap();
        assert_eq!(parsed, mapping(json!({"empty": {}})));
    }

    #[test]
    fn comments_and_blank_lines_are_ignored() {
        let text = "; leading\n# hash\n\nkey = value ; trailing\n[s] # header comment\nx = y\n";
        let parsed = parse(text).unwrap();
        assert_eq!(parsed, mapping(json!({"key": "value", "s": {"x": "y"}})));
    }

    #[test]
    fn typed_literals() {
        let parsed = parse("a = true\nb = false\nc = null\nd = 42\n").unwrap();
        assert_eq!(
            parsed,
            mapping(json!({"a": true, "b": false, "c": null, "d": "42"}))
        );
    }

    #[test]
    fn quoted_values_keep_specials() {
        let parsed = parse("a = \"x ; not a comment\"\nb = 'true'\nc = \"tab\\there\"\n").unwrap();
        assert_eq!(
            parsed,
            mapping(json!({"a": "x ; not a comment", "b": "true", "c": "tab\there"}))
        );
    }

    #[test]
    fn array_keys_collect() {
        let parsed = parse("hosts[] = a\nhosts[] = b\n").unwrap();
        assert_eq!(parsed, mapping(json!({"hosts": ["a", "b"]})));
    }

    #[test]
    fn array_key_after_scalar_keeps_scalar() {
        let parsed = parse("hosts = a\nhosts[] = b\n").unwrap();
        assert_eq!(parsed, mapping(json!({"hosts": ["a", "b"]})));
    }

    #[test]
    fn empty_value_is_empty_string() {
        let parsed = parse("blank =\n").unwrap();
        assert_eq!(parsed, mapping(json!({"blank": ""})));
    }

    #[test]
    fn yaml_is_rejected() {
        let err = parse("c2: c2\n").unwrap_err();
        assert!(err.contains("line 1"));
    }

    #[test]
    fn malformed_header_is_rejected() {
        assert!(parse("[unterminated\n").is_err());
        assert!(parse("[]\n").is_err());
        assert!(parse("[a] trailing\n").is_err());
    }

    #[test]
    fn missing_key_is_rejected() {
        assert!(parse("= value\n").is_err());
    }
}
