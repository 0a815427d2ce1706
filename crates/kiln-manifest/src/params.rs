//! Parameter sets: the caller-supplied values templates are filled from
//!
//! A [`ParameterSet`] is a flat, read-only mapping from hyphenated parameter
//! names (`app-name`, `storage-size`) to string, integer or boolean values.
//! Keys carrying a family prefix (`env.N8N_PORT`, `secret.DB_PASSWORD`) feed
//! the ConfigMap and Secret data maps.

use std::collections::BTreeMap;
use std::fmt;

use kiln_common::template::{contains_template_syntax, TemplateContext};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

/// Key prefix of parameters that become ConfigMap `data` entries
pub const ENV_FAMILY: &str = "env.";

/// Key prefix of parameters that become Secret `stringData` entries
pub const SECRET_FAMILY: &str = "secret.";

const DOCUMENT: &str = "<document>";

/// A single parameter value
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// String value
    Str(String),
}

impl ParamValue {
    /// Human-readable description used in type-mismatch errors
    pub fn describe(&self) -> String {
        match self {
            Self::Bool(b) => format!("boolean {}", b),
            Self::Int(i) => format!("integer {}", i),
            Self::Str(s) => format!("string {:?}", s),
        }
    }

    /// Parse a command-line override: integer, then boolean, then string.
    pub fn parse_loose(raw: &str) -> Self {
        if let Ok(i) = raw.parse::<i64>() {
            return Self::Int(i);
        }
        match raw {
            "true" => Self::Bool(true),
            "false" => Self::Bool(false),
            _ => Self::Str(raw.to_string()),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for ParamValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for ParamValue {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<u16> for ParamValue {
    fn from(i: u16) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Caller-supplied parameters for one render
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ParameterSet {
    values: BTreeMap<String, ParamValue>,
}

impl ParameterSet {
    /// Create an empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from key/value pairs, rejecting duplicate keys
    pub fn from_pairs<K, V, I>(pairs: I) -> Result<Self>
    where
        K: Into<String>,
        V: Into<ParamValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut set = Self::new();
        for (key, value) in pairs {
            set.insert(key, value)?;
        }
        Ok(set)
    }

    /// Build a set from a parsed YAML/JSON mapping.
    ///
    /// Top-level scalars become parameters. A nested mapping is flattened one
    /// level with a dot, so `env: {N8N_PORT: 3008}` becomes `env.N8N_PORT`.
    /// Null is treated as absent. Sequences, floats and deeper nesting are
    /// rejected.
    pub fn from_value(value: &Value) -> Result<Self> {
        let map = match value {
            Value::Object(map) => map,
            Value::Null => return Ok(Self::new()),
            other => {
                return Err(Error::invalid_parameter(
                    DOCUMENT,
                    format!("expected a mapping of parameters, got {}", json_type(other)),
                ))
            }
        };

        let mut set = Self::new();
        for (key, value) in map {
            match value {
                Value::Null => {}
                Value::Object(family) => {
                    for (sub_key, sub_value) in family {
                        let name = format!("{}.{}", key, sub_key);
                        if let Some(v) = scalar_from_json(&name, sub_value)? {
                            set.insert(name, v)?;
                        }
                    }
                }
                other => {
                    if let Some(v) = scalar_from_json(key, other)? {
                        set.insert(key.clone(), v)?;
                    }
                }
            }
        }
        Ok(set)
    }

    /// Insert a parameter. Fails on a duplicate key or on a value carrying
    /// template syntax.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Result<()> {
        let key = key.into();
        let value = check_value(&key, value.into())?;
        if key.trim().is_empty() || key.ends_with('.') {
            return Err(Error::invalid_parameter(key, "parameter name is empty"));
        }
        if self.values.contains_key(&key) {
            return Err(Error::DuplicateParameter { name: key });
        }
        self.check_alias(&key)?;
        self.values.insert(key, value);
        Ok(())
    }

    /// Builder form of [`ParameterSet::insert`]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Result<Self> {
        self.insert(key, value)?;
        Ok(self)
    }

    /// Replace (or add) a parameter. Used for explicit overrides layered on
    /// top of a loaded document.
    pub fn set_override(
        &mut self,
        key: impl Into<String>,
        value: impl Into<ParamValue>,
    ) -> Result<Option<ParamValue>> {
        let key = key.into();
        let value = check_value(&key, value.into())?;
        self.check_alias(&key)?;
        Ok(self.values.insert(key, value))
    }

    /// Templates see `-` as `_`, so `app-name` and `app_name` would be the same
    /// variable. A second spelling of an existing key is rejected.
    fn check_alias(&self, key: &str) -> Result<()> {
        if key.contains('.') {
            return Ok(());
        }
        let variable = key.replace('-', "_");
        match self
            .values
            .keys()
            .find(|k| k.as_str() != key && !k.contains('.') && k.replace('-', "_") == variable)
        {
            Some(existing) => Err(Error::invalid_parameter(
                key,
                format!("names the same template variable as '{}'", existing),
            )),
            None => Ok(()),
        }
    }

    /// Look up a parameter
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }

    /// Whether a parameter is present
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Whether `trigger` is satisfied. A family prefix (ending in `.`) needs
    /// at least one member; any other name needs the exact key.
    pub fn is_present(&self, trigger: &str) -> bool {
        if trigger.ends_with('.') {
            self.family(trigger).next().is_some()
        } else {
            self.contains(trigger)
        }
    }

    /// Members of a family, keyed by the suffix after the prefix
    pub fn family<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (&'a str, &'a ParamValue)> {
        self.values
            .iter()
            .filter_map(move |(k, v)| k.strip_prefix(prefix).map(|suffix| (suffix, v)))
    }

    /// Iterate over all parameters in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// All parameter names in key order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Number of parameters
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Template context exposing every parameter under its own name
    pub fn template_context(&self) -> TemplateContext {
        let mut ctx = TemplateContext::new();
        for (key, value) in &self.values {
            match value {
                ParamValue::Bool(b) => ctx.insert(key.clone(), *b),
                ParamValue::Int(i) => ctx.insert(key.clone(), *i),
                ParamValue::Str(s) => ctx.insert(key.clone(), s.as_str()),
            }
        }
        ctx
    }
}

fn check_value(key: &str, value: ParamValue) -> Result<ParamValue> {
    match value {
        ParamValue::Str(s) if contains_template_syntax(&s) => Err(Error::invalid_parameter(
            key,
            format!("value cannot contain template syntax: '{}'", s),
        )),
        other => Ok(other),
    }
}

fn scalar_from_json(key: &str, value: &Value) -> Result<Option<ParamValue>> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(ParamValue::Bool(*b))),
        Value::String(s) => Ok(Some(ParamValue::Str(s.clone()))),
        Value::Number(n) => n.as_i64().map(|i| Some(ParamValue::Int(i))).ok_or_else(|| {
            Error::invalid_parameter(key, format!("only integers are supported, got {}", n))
        }),
        other => Err(Error::invalid_parameter(
            key,
            format!(
                "expected a string, integer or boolean, got {}",
                json_type(other)
            ),
        )),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}
