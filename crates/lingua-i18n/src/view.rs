#![forbid(unsafe_code)]

//! Render tree produced by the plugin chain.
//!
//! [`Rendered`] mirrors the shape of the content tree: maps and lists stay
//! maps and lists, leaves matched by a plugin become [`View`]s, and leaves no
//! plugin claimed are carried through untouched as [`Rendered::Content`].

use std::collections::BTreeMap;

use serde_json::Value;

use crate::content::{ContentNode, KeyPath};
use crate::locale::Locale;
use crate::markdown::{MarkdownMetadata, strip_front_matter};

/// A renderable UI node.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    /// Renders nothing. Produced when a plugin cannot handle a node it
    /// claimed.
    Empty,
    Text(String),
    Element(ElementView),
    Markdown(MarkdownView),
    Selector(SelectorView),
    Edited(EditedView),
}

/// A rebuilt element descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementView {
    pub tag: String,
    pub props: BTreeMap<String, Value>,
    pub children: Vec<Rendered>,
}

/// Markdown source plus its metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkdownView {
    pub source: String,
    pub metadata: MarkdownMetadata,
}

impl MarkdownView {
    /// The source without its front-matter block.
    #[must_use]
    pub fn body(&self) -> &str {
        strip_front_matter(&self.source)
    }
}

/// Content-selector wrapper placed around editable values.
///
/// Inactive selectors render their child as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorView {
    pub dictionary_key: String,
    pub key_path: KeyPath,
    pub active: bool,
    pub child: Box<View>,
}

/// Edited-content renderer: the value as resolved for `locale`.
#[derive(Debug, Clone, PartialEq)]
pub struct EditedView {
    pub dictionary_key: String,
    pub key_path: KeyPath,
    pub locale: Locale,
    pub child: Box<View>,
}

impl View {
    #[must_use]
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Concatenated visible text.
    #[must_use]
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.write_text(&mut out);
        out
    }

    fn write_text(&self, out: &mut String) {
        match self {
            Self::Empty => {}
            Self::Text(s) => out.push_str(s),
            Self::Element(el) => {
                for child in &el.children {
                    child.write_text(out);
                }
            }
            Self::Markdown(md) => out.push_str(md.body()),
            Self::Selector(sel) => sel.child.write_text(out),
            Self::Edited(edit) => edit.child.write_text(out),
        }
    }
}

/// Output of a dictionary resolution pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    View(View),
    /// A node no plugin claimed, passed through unchanged.
    Content(ContentNode),
    Map(BTreeMap<String, Rendered>),
    List(Vec<Rendered>),
}

impl Default for Rendered {
    fn default() -> Self {
        Self::View(View::Empty)
    }
}

impl From<View> for Rendered {
    fn from(view: View) -> Self {
        Self::View(view)
    }
}

impl Rendered {
    /// Entry `key` of a rendered map.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Rendered> {
        match self {
            Self::Map(map) => map.get(key),
            _ => None,
        }
    }

    /// Follow a dotted path of map keys, e.g. `"hero.title"`.
    #[must_use]
    pub fn at(&self, path: &str) -> Option<&Rendered> {
        path.split('.')
            .filter(|segment| !segment.is_empty())
            .try_fold(self, |node, segment| match node {
                Self::List(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => node.get(segment),
            })
    }

    #[must_use]
    pub fn as_view(&self) -> Option<&View> {
        match self {
            Self::View(view) => Some(view),
            _ => None,
        }
    }

    /// Whether this is the empty sentinel.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::View(View::Empty))
    }

    /// Concatenated visible text of the subtree.
    ///
    /// Passthrough primitives contribute their display form; other
    /// passthrough content contributes nothing.
    #[must_use]
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.write_text(&mut out);
        out
    }

    fn write_text(&self, out: &mut String) {
        match self {
            Self::View(view) => view.write_text(out),
            Self::Content(ContentNode::Primitive(p)) => out.push_str(&p.to_text()),
            Self::Content(_) => {}
            Self::Map(map) => {
                for value in map.values() {
                    value.write_text(out);
                }
            }
            Self::List(items) => {
                for item in items {
                    item.write_text(out);
                }
            }
        }
    }
}
