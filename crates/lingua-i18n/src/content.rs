#![forbid(unsafe_code)]

//! The dictionary content tree.
//!
//! [`ContentNode`] is a closed tagged union: primitives, per-locale
//! translation records, markdown records, element descriptors and the two
//! composites (maps and lists). Dictionaries are authored as JSON; the
//! conversion from [`serde_json::Value`] recognises the `nodeType`
//! discriminator and treats every other object as a plain map.
//!
//! ```json
//! {
//!   "title": { "nodeType": "translation", "translation": { "en": "Hi", "fr": "Salut" } },
//!   "intro": { "nodeType": "markdown", "content": "# Welcome" },
//!   "cta":   { "nodeType": "element", "tag": "strong", "children": ["Go"] }
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};

use crate::locale::Locale;

/// Discriminator for non-primitive content records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeType {
    Translation,
    Markdown,
    Element,
}

impl NodeType {
    /// Canonical name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Translation => "Translation",
            Self::Markdown => "Markdown",
            Self::Element => "Element",
        }
    }

    /// Parse a discriminator, ignoring ASCII case.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        [Self::Translation, Self::Markdown, Self::Element]
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scalar content.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Null,
    Bool(bool),
    Text(String),
    Number(Number),
    BigInt(i128),
}

impl Primitive {
    /// Strings, numbers and big integers are rendered as translatable text;
    /// booleans and null are not.
    #[must_use]
    pub fn is_renderable(&self) -> bool {
        matches!(self, Self::Text(_) | Self::Number(_) | Self::BigInt(_))
    }

    /// Display form used when the value lands in a view.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
            Self::BigInt(n) => n.to_string(),
        }
    }
}

/// Structured markdown record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MarkdownContent {
    pub content: String,
    pub metadata: Option<BTreeMap<String, Value>>,
}

/// Embedded UI element descriptor.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ElementNode {
    pub tag: String,
    pub props: BTreeMap<String, Value>,
    pub children: Vec<ContentNode>,
}

impl ElementNode {
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn prop(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn child(mut self, child: impl Into<ContentNode>) -> Self {
        self.children.push(child.into());
        self
    }
}

/// A node of dictionary content.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentNode {
    Primitive(Primitive),
    /// Per-locale variants, resolved by the content store.
    Translation(BTreeMap<Locale, ContentNode>),
    Markdown(MarkdownContent),
    Element(ElementNode),
    Map(BTreeMap<String, ContentNode>),
    List(Vec<ContentNode>),
}

impl ContentNode {
    #[must_use]
    pub fn text(s: impl Into<String>) -> Self {
        Self::Primitive(Primitive::Text(s.into()))
    }

    #[must_use]
    pub fn null() -> Self {
        Self::Primitive(Primitive::Null)
    }

    #[must_use]
    pub fn markdown(content: impl Into<String>) -> Self {
        Self::Markdown(MarkdownContent {
            content: content.into(),
            metadata: None,
        })
    }

    /// Translation record from `(locale, content)` pairs.
    #[must_use]
    pub fn translation<L, C>(entries: impl IntoIterator<Item = (L, C)>) -> Self
    where
        L: Into<Locale>,
        C: Into<ContentNode>,
    {
        Self::Translation(
            entries
                .into_iter()
                .map(|(l, c)| (l.into(), c.into()))
                .collect(),
        )
    }

    /// Map from `(key, content)` pairs.
    #[must_use]
    pub fn map<K, C>(entries: impl IntoIterator<Item = (K, C)>) -> Self
    where
        K: Into<String>,
        C: Into<ContentNode>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, c)| (k.into(), c.into()))
                .collect(),
        )
    }

    /// The discriminator of a record node, `None` for primitives and
    /// composites.
    #[must_use]
    pub fn node_type(&self) -> Option<NodeType> {
        match self {
            Self::Translation(_) => Some(NodeType::Translation),
            Self::Markdown(_) => Some(NodeType::Markdown),
            Self::Element(_) => Some(NodeType::Element),
            Self::Primitive(_) | Self::Map(_) | Self::List(_) => None,
        }
    }

    /// Child at `key` of a map node.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ContentNode> {
        match self {
            Self::Map(map) => map.get(key),
            _ => None,
        }
    }
}

impl From<&str> for ContentNode {
    fn from(value: &str) -> Self {
        Self::text(value)
    }
}

impl From<String> for ContentNode {
    fn from(value: String) -> Self {
        Self::text(value)
    }
}

impl From<i64> for ContentNode {
    fn from(value: i64) -> Self {
        Self::Primitive(Primitive::Number(value.into()))
    }
}

impl From<i128> for ContentNode {
    fn from(value: i128) -> Self {
        Self::Primitive(Primitive::BigInt(value))
    }
}

impl From<bool> for ContentNode {
    fn from(value: bool) -> Self {
        Self::Primitive(Primitive::Bool(value))
    }
}

impl From<ElementNode> for ContentNode {
    fn from(value: ElementNode) -> Self {
        Self::Element(value)
    }
}

impl From<MarkdownContent> for ContentNode {
    fn from(value: MarkdownContent) -> Self {
        Self::Markdown(value)
    }
}

impl From<Vec<ContentNode>> for ContentNode {
    fn from(value: Vec<ContentNode>) -> Self {
        Self::List(value)
    }
}

impl From<Value> for ContentNode {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::null(),
            Value::Bool(b) => Self::Primitive(Primitive::Bool(b)),
            Value::Number(n) => Self::Primitive(Primitive::Number(n)),
            Value::String(s) => Self::text(s),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => from_object(map),
        }
    }
}

impl<'de> Deserialize<'de> for ContentNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from)
    }
}

fn from_object(mut map: Map<String, Value>) -> ContentNode {
    let node_type = map
        .get("nodeType")
        .and_then(Value::as_str)
        .and_then(NodeType::parse);

    match node_type {
        Some(NodeType::Translation) => {
            if let Some(Value::Object(entries)) = map.remove("translation") {
                return ContentNode::Translation(
                    entries
                        .into_iter()
                        .map(|(locale, v)| (Locale::new(locale), ContentNode::from(v)))
                        .collect(),
                );
            }
        }
        Some(NodeType::Markdown) => {
            let body = map
                .get("content")
                .or_else(|| map.get("markdown"))
                .and_then(Value::as_str)
                .map(str::to_string);
            if let Some(content) = body {
                let metadata = match map.remove("metadata") {
                    Some(Value::Object(meta)) => Some(meta.into_iter().collect()),
                    _ => None,
                };
                return ContentNode::Markdown(MarkdownContent { content, metadata });
            }
        }
        Some(NodeType::Element) => {
            if let Some(Value::String(tag)) = map.remove("tag") {
                let props = match map.remove("props") {
                    Some(Value::Object(props)) => props.into_iter().collect(),
                    _ => BTreeMap::new(),
                };
                let children = match map.remove("children") {
                    Some(Value::Array(items)) => items.into_iter().map(ContentNode::from).collect(),
                    Some(Value::Null) | None => Vec::new(),
                    Some(single) => vec![ContentNode::from(single)],
                };
                return ContentNode::Element(ElementNode {
                    tag,
                    props,
                    children,
                });
            }
        }
        None => {}
    }

    // Unknown or malformed records are plain maps.
    ContentNode::Map(
        map.into_iter()
            .map(|(k, v)| (k, ContentNode::from(v)))
            .collect(),
    )
}

/// One step of a [`KeyPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyPathSegment {
    Key(String),
    Index(usize),
}

/// Location of a node inside a dictionary, starting with the dictionary key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct KeyPath(Vec<KeyPathSegment>);

impl KeyPath {
    #[must_use]
    pub fn root(dictionary_key: impl Into<String>) -> Self {
        Self(vec![KeyPathSegment::Key(dictionary_key.into())])
    }

    #[must_use]
    pub fn key(&self, key: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.0.push(KeyPathSegment::Key(key.into()));
        next
    }

    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        let mut next = self.clone();
        next.0.push(KeyPathSegment::Index(index));
        next
    }

    #[must_use]
    pub fn segments(&self) -> &[KeyPathSegment] {
        &self.0
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                KeyPathSegment::Key(k) if i == 0 => f.write_str(k)?,
                KeyPathSegment::Key(k) => write!(f, ".{k}")?,
                KeyPathSegment::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn node_type_parse_is_case_insensitive() {
        assert_eq!(NodeType::parse("markdown"), Some(NodeType::Markdown));
        assert_eq!(NodeType::parse("Translation"), Some(NodeType::Translation));
        assert_eq!(NodeType::parse("ELEMENT"), Some(NodeType::Element));
        assert_eq!(NodeType::parse("enumeration"), None);
    }

    #[test]
    fn json_records_are_recognised() {
        let node = ContentNode::from(json!({
            "title": { "nodeType": "translation", "translation": { "en": "Hi", "fr": "Salut" } },
            "intro": { "nodeType": "markdown", "content": "# Welcome", "metadata": { "title": "W" } },
            "cta": { "nodeType": "element", "tag": "strong", "props": { "class": "x" }, "children": "Go" },
            "count": 3,
            "flags": [true, null]
        }));

        let ContentNode::Map(map) = &node else {
            panic!("expected a map, got {node:?}");
        };
        assert_eq!(
            map["title"],
            ContentNode::translation([("en", "Hi"), ("fr", "Salut")])
        );
        match &map["intro"] {
            ContentNode::Markdown(md) => {
                assert_eq!(md.content, "# Welcome");
                assert_eq!(
                    md.metadata.as_ref().map(|m| m["title"].clone()),
                    Some(json!("W"))
                );
            }
            other => panic!("expected markdown, got {other:?}"),
        }
        assert_eq!(
            map["cta"],
            ContentNode::Element(ElementNode::new("strong").prop("class", "x").child("Go"))
        );
        assert_eq!(map["count"], ContentNode::from(3i64));
        assert_eq!(
            map["flags"],
            ContentNode::List(vec![ContentNode::from(true), ContentNode::null()])
        );
    }

    #[test]
    fn markdown_field_alias() {
        let node = ContentNode::from(json!({ "nodeType": "markdown", "markdown": "*x*" }));
        assert_eq!(node, ContentNode::markdown("*x*"));
    }

    #[test]
    fn malformed_records_fall_back_to_maps() {
        let node = ContentNode::from(json!({ "nodeType": "markdown", "content": 5 }));
        assert_eq!(node.node_type(), None);
        assert!(node.get("content").is_some());

        let unknown = ContentNode::from(json!({ "nodeType": "enumeration", "x": 1 }));
        assert!(matches!(unknown, ContentNode::Map(_)));
    }

    #[test]
    fn deserialize_via_serde() {
        let node: ContentNode = serde_json::from_str(r#"["a", 1]"#).expect("valid json");
        assert_eq!(
            node,
            ContentNode::List(vec![ContentNode::text("a"), ContentNode::from(1i64)])
        );
    }

    #[test]
    fn primitive_rendering() {
        assert!(Primitive::Text("a".into()).is_renderable());
        assert!(Primitive::BigInt(1).is_renderable());
        assert!(!Primitive::Bool(true).is_renderable());
        assert!(!Primitive::Null.is_renderable());
        let max = Primitive::BigInt(170_141_183_460_469_231_731_687_303_715_884_105_727);
        assert_eq!(max.to_text().len(), 39);
        assert_eq!(Primitive::Null.to_text(), "");
    }

    #[test]
    fn key_path_display() {
        let path = KeyPath::root("home").key("items").index(2).key("label");
        assert_eq!(path.to_string(), "home.items[2].label");
        assert_eq!(path.segments().len(), 4);
    }
}
