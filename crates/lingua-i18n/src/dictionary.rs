#![forbid(unsafe_code)]

//! Dictionaries, the content store seam and the dictionary accessor.
//!
//! The accessor asks a [`ContentStore`] for the locale-specific content of a
//! dictionary, then walks the tree through a [`PluginChain`] built from the
//! default plugins plus any caller extras. The input dictionary is never
//! modified; the store hands back an owned tree.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::config::IntlayerConfig;
use crate::content::ContentNode;
use crate::error::ConfigError;
use crate::locale::Locale;
use crate::plugin::{Plugin, PluginChain, PluginContext};
use crate::view::Rendered;

/// A named content tree.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Dictionary {
    pub key: String,
    pub content: ContentNode,
}

impl Dictionary {
    #[must_use]
    pub fn new(key: impl Into<String>, content: impl Into<ContentNode>) -> Self {
        Self {
            key: key.into(),
            content: content.into(),
        }
    }
}

/// What to resolve: a dictionary value or the key of a stored one.
#[derive(Debug, Clone, Copy)]
pub enum DictionarySource<'a> {
    Dictionary(&'a Dictionary),
    Key(&'a str),
}

impl DictionarySource<'_> {
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            DictionarySource::Dictionary(dictionary) => &dictionary.key,
            DictionarySource::Key(key) => key,
        }
    }
}

impl<'a> From<&'a Dictionary> for DictionarySource<'a> {
    fn from(value: &'a Dictionary) -> Self {
        DictionarySource::Dictionary(value)
    }
}

impl<'a> From<&'a str> for DictionarySource<'a> {
    fn from(value: &'a str) -> Self {
        DictionarySource::Key(value)
    }
}

/// Resolves raw, locale-specific content.
///
/// Implementations report an unknown dictionary as `None` rather than
/// failing; callers do not handle errors from the store.
pub trait ContentStore {
    fn content(&self, source: DictionarySource<'_>, locale: &Locale) -> Option<ContentNode>;
}

/// Store over dictionaries held in memory.
///
/// Translation records resolve to the requested locale, then its language
/// prefix, then the store default, then the first entry.
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    dictionaries: BTreeMap<String, Dictionary>,
    default_locale: Locale,
}

impl InMemoryStore {
    #[must_use]
    pub fn new(default_locale: Locale) -> Self {
        Self {
            dictionaries: BTreeMap::new(),
            default_locale,
        }
    }

    #[must_use]
    pub fn from_config(config: &IntlayerConfig) -> Self {
        Self::new(config.default_locale())
    }

    /// Add or replace a dictionary.
    pub fn insert(&mut self, dictionary: Dictionary) -> Option<Dictionary> {
        self.dictionaries.insert(dictionary.key.clone(), dictionary)
    }

    #[must_use]
    pub fn with_dictionary(mut self, dictionary: Dictionary) -> Self {
        self.insert(dictionary);
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Dictionary> {
        self.dictionaries.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.dictionaries.keys().map(String::as_str)
    }

    /// Load a JSON array of `{ "key": ..., "content": ... }` objects.
    pub fn from_json_str(default_locale: Locale, s: &str) -> Result<Self, serde_json::Error> {
        let dictionaries: Vec<Dictionary> = serde_json::from_str(s)?;
        Ok(dictionaries
            .into_iter()
            .fold(Self::new(default_locale), Self::with_dictionary))
    }

    pub fn from_json_file(
        default_locale: Locale,
        path: impl AsRef<Path>,
    ) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(Self::from_json_str(default_locale, &content)?)
    }

    fn resolve(&self, node: &ContentNode, locale: &Locale) -> ContentNode {
        match node {
            ContentNode::Translation(entries) => {
                let picked = entries
                    .get(locale.as_str())
                    .or_else(|| entries.get(locale.language()))
                    .or_else(|| entries.get(self.default_locale.as_str()))
                    .or_else(|| entries.values().next());
                match picked {
                    Some(variant) => self.resolve(variant, locale),
                    None => ContentNode::null(),
                }
            }
            ContentNode::Map(map) => ContentNode::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.resolve(v, locale)))
                    .collect(),
            ),
            ContentNode::List(items) => {
                ContentNode::List(items.iter().map(|v| self.resolve(v, locale)).collect())
            }
            ContentNode::Element(el) => {
                let mut el = el.clone();
                el.children = el.children.iter().map(|c| self.resolve(c, locale)).collect();
                ContentNode::Element(el)
            }
            ContentNode::Primitive(_) | ContentNode::Markdown(_) => node.clone(),
        }
    }
}

impl ContentStore for InMemoryStore {
    fn content(&self, source: DictionarySource<'_>, locale: &Locale) -> Option<ContentNode> {
        let dictionary = match source {
            DictionarySource::Dictionary(dictionary) => dictionary,
            DictionarySource::Key(key) => self.dictionaries.get(key)?,
        };
        Some(self.resolve(&dictionary.content, locale))
    }
}

/// Walk a content tree: dispatch each node through `chain`, descending into
/// maps and lists no plugin claimed.
#[must_use]
pub fn transform_tree(node: ContentNode, chain: &PluginChain, ctx: &PluginContext) -> Rendered {
    match chain.try_dispatch(node, ctx) {
        Ok(rendered) => rendered,
        Err(ContentNode::Map(map)) => Rendered::Map(
            map.into_iter()
                .map(|(key, child)| {
                    let child_ctx = ctx.key(&key);
                    (key, transform_tree(child, chain, &child_ctx))
                })
                .collect(),
        ),
        Err(ContentNode::List(items)) => Rendered::List(
            items
                .into_iter()
                .enumerate()
                .map(|(i, child)| transform_tree(child, chain, &ctx.index(i)))
                .collect(),
        ),
        Err(other) => Rendered::Content(other),
    }
}

/// Resolve `source` for `locale` and render it through the default plugins
/// followed by `extra_plugins`.
///
/// An unknown dictionary renders as the empty sentinel.
#[must_use]
pub fn get_content(
    store: &dyn ContentStore,
    source: DictionarySource<'_>,
    locale: &Locale,
    extra_plugins: &[Plugin],
    editor_enabled: bool,
) -> Rendered {
    let Some(raw) = store.content(source, locale) else {
        debug!(dictionary = source.key(), %locale, "dictionary not found");
        return Rendered::default();
    };
    let chain = PluginChain::with_defaults().extend(extra_plugins.iter().cloned());
    let ctx = PluginContext::new(source.key(), locale.clone()).with_editor(editor_enabled);
    transform_tree(raw, &chain, &ctx)
}

/// Render a dictionary value for `locale`.
#[must_use]
pub fn get_dictionary(
    dictionary: &Dictionary,
    locale: &Locale,
    extra_plugins: &[Plugin],
    store: &dyn ContentStore,
) -> Rendered {
    let source = DictionarySource::Dictionary(dictionary);
    get_content(store, source, locale, extra_plugins, false)
}

/// Render the stored dictionary `key` for `locale`.
#[must_use]
pub fn get_intlayer(
    key: &str,
    locale: &Locale,
    extra_plugins: &[Plugin],
    store: &dyn ContentStore,
) -> Rendered {
    get_content(store, key.into(), locale, extra_plugins, false)
}
