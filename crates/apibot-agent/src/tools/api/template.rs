//! `{param}` placeholder rendering for URLs, headers, query params, and bodies.
//!
//! URL values are percent-encoded; everything else is substituted verbatim.

use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder regex is valid"))
}

/// Names of every placeholder in `template`, in order of appearance.
pub fn placeholders(template: &str) -> Vec<String> {
    placeholder_re()
        .captures_iter(template)
        .map(|c| c[1].to_string())
        .collect()
}

/// Text form of an argument: strings raw, everything else as JSON.
fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn substitute(
    template: &str,
    args: &HashMap<String, Value>,
    encode: impl Fn(String) -> String,
) -> String {
    placeholder_re()
        .replace_all(template, |caps: &regex::Captures<'_>| match args.get(&caps[1]) {
            Some(v) => encode(as_text(v)),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Substitute known placeholders; unknown ones are left as-is.
pub fn render_str(template: &str, args: &HashMap<String, Value>) -> String {
    substitute(template, args, |text| text)
}

/// Like [`render_str`], but each value is percent-encoded so it stays
/// inside the URL component it was placed in (`/`, `?`, `#` included).
pub fn render_url(template: &str, args: &HashMap<String, Value>) -> String {
    substitute(template, args, |text| urlencoding::encode(&text).into_owned())
}

/// Render a JSON template recursively.
///
/// A string consisting of exactly one placeholder takes the argument's
/// value with its JSON type intact.
pub fn render_value(template: &Value, args: &HashMap<String, Value>) -> Value {
    match template {
        Value::String(s) => {
            if let Some(caps) = placeholder_re().captures(s) {
                if caps[0].len() == s.len() {
                    if let Some(v) = args.get(&caps[1]) {
                        return v.clone();
                    }
                }
            }
            Value::String(render_str(s, args))
        }
        Value::Array(items) => Value::Array(items.iter().map(|v| render_value(v, args)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), render_value(v, args)))
                .collect(),
        ),
        other => other.clone(),
    }
}
