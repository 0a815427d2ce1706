//! Filters usable inside `${...}`: `default`, `lower`, `upper` and
//! `dns_label`

use minijinja::{Environment, Value};

/// Longest name a DNS-1123 label may have
const MAX_LABEL_LEN: usize = 63;

pub(super) fn register(env: &mut Environment<'static>) {
    env.add_filter("default", default_filter);
    env.add_filter("lower", lower);
    env.add_filter("upper", upper);
    env.add_filter("dns_label", dns_label);
}

/// `${x | default("fallback")}`; `none` counts as missing
fn default_filter(value: Value, fallback: Value) -> Value {
    if value.is_undefined() || value.is_none() {
        fallback
    } else {
        value
    }
}

fn lower(value: &str) -> String {
    value.to_lowercase()
}

fn upper(value: &str) -> String {
    value.to_uppercase()
}

/// Fold an arbitrary string into a DNS-1123 label: lowercase, every run of
/// other characters collapsed to one '-', trimmed and cut to 63 chars.
fn dns_label(value: &str) -> String {
    let mut label = String::with_capacity(value.len());
    for c in value.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            label.push(c);
        } else if !label.ends_with('-') {
            label.push('-');
        }
    }
    let label = label.trim_matches('-');
    label[..label.len().min(MAX_LABEL_LEN)]
        .trim_end_matches('-')
        .to_string()
}
