//! YAML utilities using yaml-rust2
//!
//! Parsing converts to serde_json::Value for typed deserialization. Writing
//! goes the other way through yaml-rust2's emitter in compact block style.

use serde_json::{Map, Number, Value};
use thiserror::Error;
use yaml_rust2::yaml::Hash;
use yaml_rust2::{Yaml, YamlEmitter, YamlLoader};

/// Failure to read or write a YAML document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum YamlError {
    /// The scanner or parser rejected the input
    #[error("{0}")]
    Syntax(String),
    /// Well-formed YAML with no JSON-compatible equivalent
    #[error("unsupported YAML: {0}")]
    Unsupported(String),
    /// The emitter failed to write a document
    #[error("failed to write YAML: {0}")]
    Emit(String),
}

/// Separator written between documents of a multi-document stream
pub const DOCUMENT_SEPARATOR: &str = "---\n";

// =============================================================================
// Parsing
// =============================================================================

/// Parse the first document of `input`. Empty input yields `Value::Null`.
pub fn parse_yaml(input: &str) -> Result<Value, YamlError> {
    load(input)?
        .into_iter()
        .next()
        .map_or(Ok(Value::Null), into_json)
}

/// Parse every `---`-separated document of `input`
pub fn parse_yaml_multi(input: &str) -> Result<Vec<Value>, YamlError> {
    load(input)?.into_iter().map(into_json).collect()
}

fn load(input: &str) -> Result<Vec<Yaml>, YamlError> {
    YamlLoader::load_from_str(input).map_err(|e| YamlError::Syntax(e.to_string()))
}

fn into_json(yaml: Yaml) -> Result<Value, YamlError> {
    Ok(match yaml {
        Yaml::Null => Value::Null,
        Yaml::Boolean(b) => Value::Bool(b),
        Yaml::Integer(i) => Value::from(i),
        Yaml::Real(text) => text
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| YamlError::Unsupported(format!("float {}", text)))?,
        Yaml::String(s) => Value::String(s),
        Yaml::Array(items) => {
            Value::Array(items.into_iter().map(into_json).collect::<Result<_, _>>()?)
        }
        Yaml::Hash(entries) => {
            let mut map = Map::with_capacity(entries.len());
            for (key, value) in entries {
                map.insert(key_string(key)?, into_json(value)?);
            }
            Value::Object(map)
        }
        Yaml::Alias(_) => return Err(YamlError::Unsupported("alias".to_string())),
        Yaml::BadValue => return Err(YamlError::Unsupported("bad value".to_string())),
    })
}

/// Mapping keys become strings; collections as keys are rejected
fn key_string(key: Yaml) -> Result<String, YamlError> {
    match key {
        Yaml::String(s) | Yaml::Real(s) => Ok(s),
        Yaml::Integer(i) => Ok(i.to_string()),
        Yaml::Boolean(b) => Ok(b.to_string()),
        Yaml::Null => Ok("null".to_string()),
        other => Err(YamlError::Unsupported(format!("mapping key {:?}", other))),
    }
}

// =============================================================================
// Writing
// =============================================================================

/// Write a single document as block-style YAML.
///
/// Keys keep map order and sequences are indented under their key. A string
/// is quoted whenever a plain scalar would read back as another type. The
/// output carries no document marker and ends with a newline.
pub fn to_yaml_string(value: &Value) -> Result<String, YamlError> {
    let mut out = String::new();
    {
        let mut emitter = YamlEmitter::new(&mut out);
        emitter.compact(true);
        emitter
            .dump(&from_json(value))
            .map_err(|e| YamlError::Emit(e.to_string()))?;
    }
    if out.starts_with(DOCUMENT_SEPARATOR) {
        out.replace_range(..DOCUMENT_SEPARATOR.len(), "");
    }
    out.push('\n');
    Ok(out)
}

fn from_json(value: &Value) -> Yaml {
    match value {
        Value::Null => Yaml::Null,
        Value::Bool(b) => Yaml::Boolean(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Yaml::Integer(i),
            None => Yaml::Real(n.to_string()),
        },
        Value::String(s) => Yaml::String(s.clone()),
        Value::Array(items) => Yaml::Array(items.iter().map(from_json).collect()),
        Value::Object(map) => Yaml::Hash(
            map.iter()
                .map(|(k, v)| (Yaml::String(k.clone()), from_json(v)))
                .collect::<Hash>(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    // =========================================================================
    // Story: Parsing
    // =========================================================================

    #[test]
    fn test_parse_yaml_simple() {
        let result = parse_yaml("name: test\nvalue: 42").unwrap();
        assert_eq!(result["name"], "test");
        assert_eq!(result["value"], 42);
    }

    #[test]
    fn test_parse_yaml_nested() {
        let yaml = r#"
app-name: n8n
env:
  N8N_PORT: "3008"
  GENERIC_TIMEZONE: UTC
"#;
        let result = parse_yaml(yaml).unwrap();
        assert_eq!(result["app-name"], "n8n");
        assert_eq!(result["env"]["N8N_PORT"], "3008");
    }

    #[test]
    fn test_parse_yaml_multi_doc() {
        let results = parse_yaml_multi("name: first\n---\nname: second\n").unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[1]["name"], "second");
    }

    #[test]
    fn test_parse_yaml_empty() {
        assert_eq!(parse_yaml("").unwrap(), Value::Null);
    }

    #[test]
    fn test_parse_yaml_invalid() {
        assert!(parse_yaml("not: valid: yaml: {{").is_err());
    }

    #[test]
    fn test_parse_yaml_boolean() {
        let result = parse_yaml("enabled: true\ndisabled: false").unwrap();
        assert_eq!(result["enabled"], true);
        assert_eq!(result["disabled"], false);
    }

    // =========================================================================
    // Story: Writing
    // =========================================================================

    #[test]
    fn story_nested_maps_indent_two_spaces() {
        let value = json!({
            "apiVersion": "v1",
            "kind": "Namespace",
            "metadata": { "name": "n8n" }
        });
        assert_eq!(
            to_yaml_string(&value).unwrap(),
            "apiVersion: v1\nkind: Namespace\nmetadata:\n  name: n8n\n"
        );
    }

    #[test]
    fn story_sequences_indent_under_key() {
        let value = json!({
            "resources": ["namespace.yaml", "service.yaml"],
            "ports": [{ "name": "http", "port": 3008 }]
        });
        assert_eq!(
            to_yaml_string(&value).unwrap(),
            "resources:\n  - namespace.yaml\n  - service.yaml\nports:\n  - name: http\n    port: 3008\n"
        );
    }

    #[test]
    fn story_nested_sequence_of_maps() {
        let value = json!({
            "containers": [{
                "name": "n8n",
                "envFrom": [{ "configMapRef": { "name": "n8n-config" } }]
            }]
        });
        let expected = "\
containers:
  - name: n8n
    envFrom:
      - configMapRef:
          name: n8n-config
";
        assert_eq!(to_yaml_string(&value).unwrap(), expected);
    }

    #[test]
    fn story_empty_collections_use_flow_style() {
        let value = json!({ "emptyDir": {}, "args": [] });
        assert_eq!(to_yaml_string(&value).unwrap(), "emptyDir: {}\nargs: []\n");
    }

    #[rstest]
    #[case::numeric("3008", "\"3008\"")]
    #[case::float("1.5", "\"1.5\"")]
    #[case::bool_word("true", "\"true\"")]
    #[case::yaml11_bool("on", "\"on\"")]
    #[case::null_word("null", "\"null\"")]
    #[case::empty("", "\"\"")]
    #[case::leading_indicator("*wild", "\"*wild\"")]
    #[case::colon_space("a: b", "\"a: b\"")]
    #[case::clock("12:30", "\"12:30\"")]
    #[case::hex("0x1F", "\"0x1F\"")]
    #[case::newline("a\nb", "\"a\\nb\"")]
    #[case::quote_inside("say \"hi\": now", "\"say \\\"hi\\\": now\"")]
    #[case::infinity(".inf", "\".inf\"")]
    #[case::negative_infinity("-.inf", "\"-.inf\"")]
    #[case::not_a_number(".nan", "\".nan\"")]
    #[case::image("docker.n8n.io/n8nio/n8n:1.118.2", "\"docker.n8n.io/n8nio/n8n:1.118.2\"")]
    #[case::quantity("1Gi", "1Gi")]
    #[case::millicores("500m", "500m")]
    #[case::path("/home/node/.n8n", "/home/node/.n8n")]
    #[case::timezone("Europe/Berlin", "Europe/Berlin")]
    #[case::dotted_key("app.kubernetes.io/name", "app.kubernetes.io/name")]
    fn test_scalar_quoting(#[case] input: &str, #[case] expected: &str) {
        let yaml = to_yaml_string(&json!({ "value": input })).unwrap();
        assert_eq!(yaml, format!("value: {}\n", expected));
    }

    #[test]
    fn story_written_yaml_parses_back() {
        let value = json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": { "name": "n8n-config", "labels": { "app": "n8n" } },
            "data": {
                "N8N_PORT": "3008",
                "N8N_SECURE_COOKIE": "false",
                "EMPTY": "",
                "NOTE": "a: b # c",
                "LIMIT": ".inf",
                "FLOOR": "-.inf",
                "RATIO": ".nan"
            },
            "list": [1, true, null, "x", [2, 3]]
        });
        let parsed = parse_yaml(&to_yaml_string(&value).unwrap()).unwrap();
        assert_eq!(parsed, value);
    }
}
