#![forbid(unsafe_code)]

//! Markdown front-matter metadata.
//!
//! Only the leading metadata block is interpreted here; rendering markdown to
//! markup is left to the host. A front-matter block is a `---` line, any
//! number of `key: value` lines and a closing `---` line:
//!
//! ```text
//! ---
//! title: Getting started
//! tags: [intro, setup]
//! ---
//! # Getting started
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

const FENCE: &str = "---";

/// Metadata attached to a markdown document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkdownMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(alias = "createdAt")]
    pub created_at: Option<String>,
    #[serde(alias = "updatedAt")]
    pub updated_at: Option<String>,
    pub author: Option<String>,
    pub tags: Vec<String>,
    /// Keys without a dedicated field.
    pub extra: BTreeMap<String, Value>,
}

impl MarkdownMetadata {
    /// Build from an explicit key/value map, such as the `metadata` field of
    /// a structured markdown record.
    #[must_use]
    pub fn from_map(map: &BTreeMap<String, Value>) -> Self {
        let mut meta = Self::default();
        for (key, value) in map {
            meta.insert(key, value.clone());
        }
        meta
    }

    /// Whether no field carries a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn insert(&mut self, key: &str, value: Value) {
        match key {
            "title" => self.title = as_text(&value),
            "description" => self.description = as_text(&value),
            "created_at" | "createdAt" => self.created_at = as_text(&value),
            "updated_at" | "updatedAt" => self.updated_at = as_text(&value),
            "author" => self.author = as_text(&value),
            "tags" => {
                self.tags = match &value {
                    Value::Array(items) => items
                        .iter()
                        .map(|v| match v {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        })
                        .collect(),
                    Value::String(s) => vec![s.clone()],
                    _ => Vec::new(),
                };
            }
            _ => {
                self.extra.insert(key.to_string(), value);
            }
        }
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Split a document into its front-matter lines and the remaining body.
fn split_front_matter(content: &str) -> Option<(Vec<&str>, &str)> {
    let trimmed = content.trim_start();
    let mut rest = trimmed.strip_prefix(FENCE)?;
    rest = rest.strip_prefix('\r').unwrap_or(rest);
    rest = rest.strip_prefix('\n')?;

    let mut lines = Vec::new();
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        offset += line.len();
        let bare = line.trim_end_matches(['\r', '\n']);
        if bare.trim_end() == FENCE {
            return Some((lines, &rest[offset..]));
        }
        lines.push(bare);
    }
    None
}

/// Extract front-matter metadata; documents without a block yield an empty
/// [`MarkdownMetadata`].
#[must_use]
pub fn markdown_metadata(content: &str) -> MarkdownMetadata {
    let mut meta = MarkdownMetadata::default();
    let Some((lines, _)) = split_front_matter(content) else {
        return meta;
    };
    for line in lines {
        let Some((key, raw)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() || key.starts_with('#') {
            continue;
        }
        meta.insert(key, parse_scalar_or_list(raw.trim()));
    }
    meta
}

/// The document body with any front-matter block removed.
#[must_use]
pub fn strip_front_matter(content: &str) -> &str {
    match split_front_matter(content) {
        Some((_, body)) => body.trim_start_matches(['\r', '\n']),
        None => content,
    }
}

fn parse_scalar_or_list(raw: &str) -> Value {
    if let Some(inner) = raw.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
        return Value::Array(
            inner
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(parse_scalar)
                .collect(),
        );
    }
    parse_scalar(raw)
}

fn parse_scalar(raw: &str) -> Value {
    let unquoted = raw
        .strip_prefix('"')
        .and_then(|r| r.strip_suffix('"'))
        .or_else(|| raw.strip_prefix('\'').and_then(|r| r.strip_suffix('\'')));
    if let Some(s) = unquoted {
        return Value::String(s.to_string());
    }
    match raw {
        "" | "null" | "~" => Value::Null,
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => serde_json::from_str::<serde_json::Number>(raw)
            .map(Value::Number)
            .unwrap_or_else(|_| Value::String(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DOC: &str = "---\ntitle: Getting started\ndescription: \"First steps: install\"\ncreatedAt: 2024-01-05\nauthor: Ada\ntags: [intro, 'setup']\ndraft: true\norder: 3\n---\n\n# Getting started\n";

    #[test]
    fn front_matter_fields() {
        let meta = markdown_metadata(DOC);
        assert_eq!(meta.title.as_deref(), Some("Getting started"));
        assert_eq!(meta.description.as_deref(), Some("First steps: install"));
        assert_eq!(meta.created_at.as_deref(), Some("2024-01-05"));
        assert_eq!(meta.author.as_deref(), Some("Ada"));
        assert_eq!(meta.tags, vec!["intro".to_string(), "setup".to_string()]);
        assert_eq!(meta.extra.get("draft"), Some(&json!(true)));
        assert_eq!(meta.extra.get("order"), Some(&json!(3)));
    }

    #[test]
    fn body_without_front_matter() {
        assert_eq!(strip_front_matter(DOC), "# Getting started\n");
        assert_eq!(strip_front_matter("# Plain"), "# Plain");
    }

    #[test]
    fn no_block_means_empty_metadata() {
        assert!(markdown_metadata("# Title\n---\nnot: metadata").is_empty());
        assert!(markdown_metadata("").is_empty());
    }

    #[test]
    fn unterminated_block_is_ignored() {
        let doc = "---\ntitle: Open\n# Body";
        assert!(markdown_metadata(doc).is_empty());
        assert_eq!(strip_front_matter(doc), doc);
    }

    #[test]
    fn crlf_line_endings() {
        let meta = markdown_metadata("---\r\ntitle: Win\r\n---\r\nbody");
        assert_eq!(meta.title.as_deref(), Some("Win"));
        assert_eq!(
            strip_front_matter("---\r\ntitle: Win\r\n---\r\nbody"),
            "body"
        );
    }

    #[test]
    fn explicit_map_conversion() {
        let map: BTreeMap<String, Value> = [
            ("title".to_string(), json!("Doc")),
            ("updatedAt".to_string(), json!("2024-02-01")),
            ("tags".to_string(), json!(["a", 1])),
            ("lang".to_string(), json!("fr")),
        ]
        .into_iter()
        .collect();
        let meta = MarkdownMetadata::from_map(&map);
        assert_eq!(meta.title.as_deref(), Some("Doc"));
        assert_eq!(meta.updated_at.as_deref(), Some("2024-02-01"));
        assert_eq!(meta.tags, vec!["a".to_string(), "1".to_string()]);
        assert_eq!(meta.extra.get("lang"), Some(&json!("fr")));
    }
}
