//! Dot-path extraction from JSON response bodies.
//!
//! A path like `list.1.v` walks mappings by key and sequences by index.
//! Anything that doesn't resolve is left out of the result.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One step of a [`DotPath`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DotPathError {
    #[error("path is empty")]
    Empty,
    #[error("segment {0} is empty")]
    EmptySegment(usize),
    #[error("segment '{0}' contains whitespace")]
    Whitespace(String),
    #[error("segment '{0}' is a negative index")]
    NegativeIndex(String),
    #[error("segment '{0}' is an index too large to address")]
    IndexOverflow(String),
}

/// A parsed, non-empty sequence of path segments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DotPath(Vec<Segment>);

impl DotPath {
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    /// Walk `value`, returning the addressed node if every step resolves.
    ///
    /// An index segment applied to a mapping falls back to a key lookup, so
    /// numeric-keyed objects stay reachable.
    pub fn resolve<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        self.0.iter().try_fold(value, |node, segment| match (segment, node) {
            (Segment::Index(i), Value::Array(items)) => items.get(*i),
            (Segment::Index(i), Value::Object(map)) => map.get(&i.to_string()),
            (Segment::Key(k), Value::Object(map)) => map.get(k),
            _ => None,
        })
    }
}

impl FromStr for DotPath {
    type Err = DotPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(DotPathError::Empty);
        }

        s.split('.')
            .enumerate()
            .map(|(pos, raw)| {
                if raw.is_empty() {
                    return Err(DotPathError::EmptySegment(pos));
                }
                if raw.chars().any(char::is_whitespace) {
                    return Err(DotPathError::Whitespace(raw.to_string()));
                }
                if raw.bytes().all(|b| b.is_ascii_digit()) {
                    return raw
                        .parse::<usize>()
                        .map(Segment::Index)
                        .map_err(|_| DotPathError::IndexOverflow(raw.to_string()));
                }
                if let Some(digits) = raw.strip_prefix('-') {
                    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                        return Err(DotPathError::NegativeIndex(raw.to_string()));
                    }
                }
                Ok(Segment::Key(raw.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(DotPath)
    }
}

impl fmt::Display for DotPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            match segment {
                Segment::Key(k) => f.write_str(k)?,
                Segment::Index(n) => write!(f, "{n}")?,
            }
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────
// Output mapping
// ─────────────────────────────────────────────

/// An output mapping with every path parsed up front.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OutputMapping {
    fields: Vec<(String, DotPath)>,
}

impl OutputMapping {
    /// Parse every path, reporting the first `(field, path)` that fails.
    pub fn compile(mapping: &BTreeMap<String, String>) -> Result<Self, (String, String)> {
        let fields = mapping
            .iter()
            .map(|(field, path)| {
                path.parse::<DotPath>()
                    .map(|p| (field.clone(), p))
                    .map_err(|_| (field.clone(), path.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { fields })
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Build the output object; fields whose path doesn't resolve are omitted.
    pub fn apply(&self, response: &Value) -> Map<String, Value> {
        self.fields
            .iter()
            .filter_map(|(field, path)| path.resolve(response).map(|v| (field.clone(), v.clone())))
            .collect()
    }
}

/// Extract `mapping`'s fields from `response`.
///
/// Unresolvable and unparsable paths are omitted rather than failing.
pub fn extract(response: &Value, mapping: &BTreeMap<String, String>) -> Map<String, Value> {
    mapping
        .iter()
        .filter_map(|(field, path)| {
            let path = path.parse::<DotPath>().ok()?;
            path.resolve(response).map(|v| (field.clone(), v.clone()))
        })
        .collect()
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mapping(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_missing_key_is_omitted() {
        let response = json!({"a": {"b": 1}});
        let out = extract(&response, &mapping(&[("x", "a.b"), ("y", "a.c")]));
        assert_eq!(Value::Object(out), json!({"x": 1}));
    }

    #[test]
    fn test_index_into_sequence() {
        let response = json!({"list": [{"v": 5}, {"v": 6}]});
        let out = extract(&response, &mapping(&[("second", "list.1.v")]));
        assert_eq!(Value::Object(out), json!({"second": 6}));
    }

    #[test]
    fn test_index_out_of_range_is_omitted() {
        let response = json!({"list": [1]});
        let out = extract(&response, &mapping(&[("x", "list.3")]));
        assert!(out.is_empty());
    }

    #[test]
    fn test_wrong_container_type_is_omitted() {
        let response = json!({"a": "scalar", "list": [1, 2]});
        let out = extract(&response, &mapping(&[("x", "a.b"), ("y", "list.key")]));
        assert!(out.is_empty());
    }

    #[test]
    fn test_numeric_key_on_mapping() {
        let response = json!({"years": {"2024": "leap"}});
        let out = extract(&response, &mapping(&[("y", "years.2024")]));
        assert_eq!(out["y"], "leap");
    }

    #[test]
    fn test_non_scalar_values_pass_through() {
        let response = json!({"a": {"b": [1, 2], "c": {"d": null}}});
        let out = extract(&response, &mapping(&[("list", "a.b"), ("obj", "a.c")]));
        assert_eq!(out["list"], json!([1, 2]));
        assert_eq!(out["obj"], json!({"d": null}));
    }

    #[test]
    fn test_extract_is_idempotent() {
        let response = json!({"a": {"b": 1}, "list": [{"v": 5}, {"v": 6}]});
        let map = mapping(&[("x", "a.b"), ("v", "list.0.v"), ("gone", "nope")]);
        assert_eq!(extract(&response, &map), extract(&response, &map));
    }

    #[test]
    fn test_parse_segments() {
        let path: DotPath = "data.items.0.name".parse().unwrap();
        assert_eq!(
            path.segments(),
            &[
                Segment::Key("data".into()),
                Segment::Key("items".into()),
                Segment::Index(0),
                Segment::Key("name".into()),
            ]
        );
        assert_eq!(path.to_string(), "data.items.0.name");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!("".parse::<DotPath>(), Err(DotPathError::Empty));
        assert_eq!("a..b".parse::<DotPath>(), Err(DotPathError::EmptySegment(1)));
        assert_eq!(".a".parse::<DotPath>(), Err(DotPathError::EmptySegment(0)));
        assert!(matches!("a.b c".parse::<DotPath>(), Err(DotPathError::Whitespace(_))));
        assert!(matches!("list.-1".parse::<DotPath>(), Err(DotPathError::NegativeIndex(_))));
    }

    #[test]
    fn test_compiled_mapping_matches_extract() {
        let map = mapping(&[("x", "a.b"), ("y", "a.c")]);
        let compiled = OutputMapping::compile(&map).unwrap();
        let response = json!({"a": {"b": true}});
        assert_eq!(compiled.apply(&response), extract(&response, &map));
    }

    #[test]
    fn test_compile_reports_bad_field() {
        let map = mapping(&[("ok", "a"), ("bad", "a..b")]);
        assert_eq!(
            OutputMapping::compile(&map),
            Err(("bad".to_string(), "a..b".to_string()))
        );
    }
}
