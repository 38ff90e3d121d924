use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::assign::assign;
use crate::value::{Mapping, Value};

/// An owned snapshot of environment variables.
pub type EnvMap = BTreeMap<String, String>;

static UNDERSCORE_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_(\w)").expect("valid regex"));

/// Build a fragment from the environment variables that belong to `app_name`.
///
/// A variable belongs to the app when its name starts with `{app_name}__`,
/// compared case-insensitively. The rest of the name is lower-cased, `__`
/// separates nesting levels and `_x` camel-cases to `X`:
///
/// | Env var | Config key |
/// |---------|------------|
/// | `MYAPP__HOST` | `host` |
/// | `MYAPP__DATABASE__POOL_SIZE` | `database.poolSize` |
///
/// With `unset`, every consumed variable is removed from `env` afterwards, so
/// later reads of the same snapshot no longer see it.
pub fn env_to_table(app_name: &str, env: &mut EnvMap, parse_values: bool, unset: bool) -> Mapping {
    let mut table = Mapping::new();
    let keys: Vec<String> = env
        .keys()
        .filter(|key| belongs_to_app(app_name, key))
        .cloned()
        .collect();

    for key in keys {
        let path = env_key_to_path(app_name, &key);
        if path.is_empty() {
            continue;
        }
        let raw = if unset {
            env.remove(&key)
        } else {
            env.get(&key).cloned()
        };
        if let Some(raw) = raw {
            let value = if parse_values {
                parse_value(&raw)
            } else {
                Value::String(raw)
            };
            assign(&mut table, &path, value);
        }
    }

    table
}

fn belongs_to_app(app_name: &str, key: &str) -> bool {
    let prefix = format!("{}__", app_name.to_lowercase());
    key.to_lowercase().starts_with(&prefix)
}

/// `MYAPP__DATABASE__POOL_SIZE` -> `database.poolSize`.
fn env_key_to_path(app_name: &str, key: &str) -> String {
    let rest: String = key.chars().skip(app_name.chars().count() + 2).collect();
    camel_case(&rest.to_lowercase().replace("__", "."))
}

/// Replace every `_x` with `X`.
pub(crate) fn camel_case(s: &str) -> String {
    UNDERSCORE_WORD
        .replace_all(s, |caps: &Captures| caps[1].to_uppercase())
        .into_owned()
}

/// Coerce a raw env or flag string.
///
/// `"null"`, `"true"`, `"false"` and `"NaN"` become the matching value;
/// all-digit strings that round-trip through a number unchanged become
/// numbers (so `"8080"` does, `"007"` doesn't); everything else stays a string.
pub(crate) fn parse_value(s: &str) -> Value {
    const MAX_SAFE: u64 = 9_007_199_254_740_992;

    match s {
        "null" => return Value::Null,
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "NaN" => return Value::Number(f64::NAN),
        _ => {}
    }
    if !s.is_empty()
        && s.bytes().all(|b| b.is_ascii_digit())
        && let Ok(n) = s.parse::<u64>()
        && n <= MAX_SAFE
        && n.to_string() == s
    {
        return Value::Number(n as f64);
    }
    Value::String(s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{env, mapping};
    use serde_json::json;

    fn table(app: &str, pairs: &[(&str, &str)]) -> Mapping {
        env_to_table(app, &mut env(pairs), true, false)
    }

    #[test]
    fn simple_key() {
        let table = table("myapp", &[("MYAPP__HOST", "0.0.0.0")]);
        assert_eq!(table, mapping(json!({"host": "0.0.0.0"})));
    }

    #[test]
    fn nested_key() {
        let table = table("myapp", &[("MYAPP__DATABASE__URL", "postgres://db")]);
        assert_eq!(table, mapping(json!({"database": {"url": "postgres://db"}})));
    }

    #[test]
    fn single_underscore_camel_cases() {
        let table = table("myapp", &[("MYAPP__DATABASE__POOL_SIZE", "10")]);
        assert_eq!(table, mapping(json!({"database": {"poolSize": 10}})));
    }

    #[test]
    fn prefix_is_case_insensitive() {
        let table = table("MyApp", &[("myapp__host", "a"), ("MYAPP__PORT", "1")]);
        assert_eq!(table, mapping(json!({"host": "a", "port": 1})));
    }

    #[test]
    fn numeric_segment_builds_sequence() {
        let table = table("app", &[("APP__HOSTS__0", "a"), ("APP__HOSTS__1", "b")]);
        assert_eq!(table, mapping(json!({"hosts": ["a", "b"]})));
    }

    #[test]
    fn huge_index_is_a_plain_key() {
        let table = table(
            "app",
            &[
                ("APP__LIST__18446744073709551615", "x"),
                ("APP__OTHER__9999999999999", "y"),
            ],
        );
        assert_eq!(
            table,
            mapping(json!({
                "list": {"18446744073709551615": "x"},
                "other": {"9999999999999": "y"}
            }))
        );
    }

    #[test]
    fn no_matching_prefix_ignored() {
        let table = table("myapp", &[("OTHER__HOST", "x"), ("HOME", "/home/u")]);
        assert!(table.is_empty());
    }

    #[test]
    fn bare_prefix_ignored() {
        let table = table("myapp", &[("MYAPP__", "x"), ("MYAPP", "y")]);
        assert!(table.is_empty());
    }

    #[test]
    fn prefix_with_single_underscore_not_matched() {
        let table = table("myapp", &[("MYAPP_HOST", "x")]);
        assert!(table.is_empty());
    }

    #[test]
    fn values_are_coerced() {
        let table = table(
            "app",
            &[
                ("APP__A", "null"),
                ("APP__B", "true"),
                ("APP__C", "false"),
                ("APP__D", "8080"),
                ("APP__E", "007"),
                ("APP__F", "1.5"),
                ("APP__G", "hello world"),
            ],
        );
        assert_eq!(
            table,
            mapping(json!({
                "a": null, "b": true, "c": false, "d": 8080,
                "e": "007", "f": "1.5", "g": "hello world"
            }))
        );
    }

    #[test]
    fn nan_is_coerced() {
        let table = table("app", &[("APP__RATIO", "NaN")]);
        assert!(table["ratio"].as_f64().unwrap().is_nan());
    }

    #[test]
    fn parse_values_off_keeps_strings() {
        let table = env_to_table("app", &mut env(&[("APP__PORT", "8080")]), false, false);
        assert_eq!(table, mapping(json!({"port": "8080"})));
    }

    #[test]
    fn unset_removes_consumed_keys_only() {
        let mut vars = env(&[("APP__PORT", "1"), ("APP__", "x"), ("PATH", "/bin")]);
        let table = env_to_table("app", &mut vars, true, true);
        assert_eq!(table, mapping(json!({"port": 1})));
        assert!(!vars.contains_key("APP__PORT"));
        assert!(vars.contains_key("APP__"));
        assert!(vars.contains_key("PATH"));

        // A second read of the same snapshot no longer sees the variable.
        assert!(env_to_table("app", &mut vars, true, true).is_empty());
    }

    #[test]
    fn keep_by_default() {
        let mut vars = env(&[("APP__PORT", "1")]);
        env_to_table("app", &mut vars, true, false);
        assert!(vars.contains_key("APP__PORT"));
    }

    #[test]
    fn camel_case_conversion() {
        assert_eq!(camel_case("pool_size"), "poolSize");
        assert_eq!(camel_case("a_b_c"), "aBC");
        assert_eq!(camel_case("trailing_"), "trailing_");
    }
}
