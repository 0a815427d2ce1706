//! Variables visible to `${...}` expressions

use std::collections::BTreeMap;

use minijinja::Value;

/// Template variables keyed by their hyphenated parameter names
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    vars: BTreeMap<String, Value>,
}

impl TemplateContext {
    /// An empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Define or replace a variable
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.vars.insert(name.into(), value.into());
    }

    /// Builder form of [`TemplateContext::insert`]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// The minijinja root object. Keys use underscores to match the
    /// identifiers the engine rewrites expressions to.
    pub(crate) fn to_value(&self) -> Value {
        self.vars
            .iter()
            .map(|(name, value)| (name.replace('-', "_"), value.clone()))
            .collect()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for TemplateContext {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut ctx = Self::new();
        for (name, value) in iter {
            ctx.insert(name, value);
        }
        ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_object_uses_underscored_keys() {
        let ctx = TemplateContext::new().with("app-name", "n8n");
        let root = ctx.to_value();
        assert_eq!(
            root.get_attr("app_name").unwrap().as_str(),
            Some("n8n")
        );
        assert!(root.get_attr("app-name").unwrap().is_undefined());
    }

    #[test]
    fn test_later_insert_replaces() {
        let ctx: TemplateContext = [("port", 3008), ("port", 5678)].into_iter().collect();
        assert_eq!(ctx.to_value().get_attr("port").unwrap().to_string(), "5678");
    }
}
