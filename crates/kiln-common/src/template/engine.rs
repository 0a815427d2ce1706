//! `${...}` rendering
//!
//! minijinja reads `app-name` as `app` minus `name`, so every expression is
//! rewritten to underscored identifiers before rendering. Quoted strings
//! inside an expression keep their hyphens. `$${` renders a literal `${`.

use minijinja::syntax::SyntaxConfig;
use minijinja::{Environment, UndefinedBehavior};

use super::context::TemplateContext;
use super::error::TemplateError;
use super::filters;

const OPEN: &str = "${";
const CLOSE: char = '}';
const ESCAPED_OPEN: &str = "$${";
/// Stand-in for `$${` while the template is rendered
const ESCAPE_MARK: &str = "\u{0}kiln:open\u{0}";

/// Renders `${...}` templates with strict undefined handling
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    /// Build an engine with `${ }` variables, `{% %}` blocks and `{# #}`
    /// comments
    pub fn new() -> Result<Self, TemplateError> {
        let syntax = SyntaxConfig::builder()
            .variable_delimiters(OPEN, "}")
            .block_delimiters("{%", "%}")
            .comment_delimiters("{#", "#}")
            .build()
            .map_err(|e| TemplateError::Syntax(e.to_string()))?;

        let mut env = Environment::new();
        env.set_syntax(syntax);
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        filters::register(&mut env);
        Ok(Self { env })
    }

    /// Render `template` against `ctx`. Any undefined variable is an error.
    pub fn render(&self, template: &str, ctx: &TemplateContext) -> Result<String, TemplateError> {
        let source = map_expressions(&hide_escapes(template), underscore_identifiers);
        let rendered = self.env.render_str(&source, ctx.to_value())?;
        Ok(rendered.replace(ESCAPE_MARK, OPEN))
    }
}

/// Whether `value` holds anything the engine would interpret
pub fn contains_template_syntax(value: &str) -> bool {
    value.contains(OPEN) || value.contains("{%")
}

/// Root variable of every `${...}` expression, deduplicated in order of first
/// appearance and in the hyphenated form. Escaped `$${...}` is skipped.
pub fn referenced_identifiers(template: &str) -> Vec<String> {
    let hidden = hide_escapes(template);
    let mut found: Vec<String> = Vec::new();
    for expression in expressions(&hidden) {
        let root = leading_identifier(expression);
        if !root.is_empty() && !found.iter().any(|f| f == root) {
            found.push(root.to_string());
        }
    }
    found
}

fn hide_escapes(template: &str) -> String {
    template.replace(ESCAPED_OPEN, ESCAPE_MARK)
}

/// Bodies of the `${...}` expressions of a template
fn expressions(template: &str) -> impl Iterator<Item = &str> {
    template
        .split(OPEN)
        .skip(1)
        .filter_map(|chunk| chunk.split_once(CLOSE).map(|(body, _)| body))
}

/// Rewrite each expression body with `f`, leaving literal text untouched
fn map_expressions(template: &str, f: impl Fn(&str) -> String) -> String {
    let mut chunks = template.split(OPEN);
    let mut out = chunks.next().unwrap_or_default().to_string();
    for chunk in chunks {
        out.push_str(OPEN);
        match chunk.split_once(CLOSE) {
            Some((body, rest)) => {
                out.push_str(&f(body));
                out.push(CLOSE);
                out.push_str(rest);
            }
            None => out.push_str(chunk),
        }
    }
    out
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn leading_identifier(expression: &str) -> &str {
    let trimmed = expression.trim_start();
    let end = trimmed
        .find(|c: char| !(is_identifier_char(c) || c == '-'))
        .unwrap_or(trimmed.len());
    &trimmed[..end]
}

/// `a-b` becomes `a_b` wherever the hyphen sits between identifier
/// characters outside a string literal
fn underscore_identifiers(expression: &str) -> String {
    let chars: Vec<char> = expression.chars().collect();
    let mut quote: Option<char> = None;
    let mut out = String::with_capacity(expression.len());

    for (i, &c) in chars.iter().enumerate() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c == '-' => {
                let joins = i > 0
                    && is_identifier_char(chars[i - 1])
                    && chars.get(i + 1).is_some_and(|n| is_identifier_char(*n));
                if joins {
                    out.push('_');
                    continue;
                }
            }
            None => {}
        }
        out.push(c);
    }
    out
}
