#![forbid(unsafe_code)]

//! First-match content plugin chain.
//!
//! A [`PluginChain`] is an ordered list of [`Plugin`]s. Dispatching a node
//! asks each plugin in registration order whether it can handle the node;
//! the first one that says yes transforms it and no other plugin sees it.
//! A node nobody claims comes back untouched as [`Rendered::Content`].
//!
//! # Default order
//!
//! | # | Plugin | Claims |
//! |---|--------|--------|
//! | 1 | [`Plugin::IntlayerNode`] | strings, numbers, big integers |
//! | 2 | [`Plugin::Element`] | element descriptors |
//! | 3 | [`Plugin::MarkdownString`] | strings |
//! | 4 | [`Plugin::Markdown`] | structured markdown records |
//!
//! Because the chain is first-match, the markdown-string plugin never sees a
//! string while the intlayer-node plugin precedes it. Chains built without
//! the defaults (or with a different order) can still use it.
//!
//! # Degradation
//!
//! `transform` re-checks the node shape. A plugin handed a node it cannot
//! render returns [`View::Empty`] and logs a warning instead of failing the
//! whole tree.

use std::fmt;
use std::rc::Rc;

use tracing::{trace, warn};

use crate::content::{ContentNode, ElementNode, KeyPath, MarkdownContent, Primitive};
use crate::dictionary::transform_tree;
use crate::locale::Locale;
use crate::markdown::{MarkdownMetadata, markdown_metadata};
use crate::view::{EditedView, ElementView, MarkdownView, Rendered, SelectorView, View};

/// Per-node information handed to a plugin.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginContext {
    pub dictionary_key: String,
    pub key_path: KeyPath,
    pub locale: Locale,
    /// Whether content selectors should be interactive.
    pub editor_enabled: bool,
}

impl PluginContext {
    /// Context for the root of dictionary `dictionary_key`.
    #[must_use]
    pub fn new(dictionary_key: impl Into<String>, locale: Locale) -> Self {
        let dictionary_key = dictionary_key.into();
        Self {
            key_path: KeyPath::root(dictionary_key.clone()),
            dictionary_key,
            locale,
            editor_enabled: false,
        }
    }

    #[must_use]
    pub fn with_editor(mut self, enabled: bool) -> Self {
        self.editor_enabled = enabled;
        self
    }

    /// Context for map entry `key` below this node.
    #[must_use]
    pub fn key(&self, key: &str) -> Self {
        Self {
            key_path: self.key_path.key(key),
            ..self.clone()
        }
    }

    /// Context for list item `index` below this node.
    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        Self {
            key_path: self.key_path.index(index),
            ..self.clone()
        }
    }
}

type Predicate = Rc<dyn Fn(&ContentNode) -> bool>;
type Transform = Rc<dyn Fn(ContentNode, &PluginContext, &PluginChain) -> Rendered>;

/// A caller-supplied plugin.
#[derive(Clone)]
pub struct CustomPlugin {
    id: String,
    can_handle: Predicate,
    transform: Transform,
}

impl CustomPlugin {
    pub fn new(
        id: impl Into<String>,
        can_handle: impl Fn(&ContentNode) -> bool + 'static,
        transform: impl Fn(ContentNode, &PluginContext, &PluginChain) -> Rendered + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            can_handle: Rc::new(can_handle),
            transform: Rc::new(transform),
        }
    }
}

impl fmt::Debug for CustomPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomPlugin")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// A classify-and-transform rule.
#[derive(Debug, Clone)]
pub enum Plugin {
    /// Translatable primitives, wrapped in editor decoration.
    IntlayerNode,
    /// Element descriptors, rebuilt with their children rendered.
    Element,
    /// Raw strings rendered as markdown.
    MarkdownString,
    /// Structured markdown records.
    Markdown,
    Custom(CustomPlugin),
}

impl Plugin {
    /// The built-in plugins in their default order.
    #[must_use]
    pub fn defaults() -> Vec<Plugin> {
        vec![
            Plugin::IntlayerNode,
            Plugin::Element,
            Plugin::MarkdownString,
            Plugin::Markdown,
        ]
    }

    pub fn custom(
        id: impl Into<String>,
        can_handle: impl Fn(&ContentNode) -> bool + 'static,
        transform: impl Fn(ContentNode, &PluginContext, &PluginChain) -> Rendered + 'static,
    ) -> Self {
        Plugin::Custom(CustomPlugin::new(id, can_handle, transform))
    }

    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Plugin::IntlayerNode => "intlayer-node-plugin",
            Plugin::Element => "element-node-plugin",
            Plugin::MarkdownString => "markdown-string-plugin",
            Plugin::Markdown => "markdown-plugin",
            Plugin::Custom(custom) => &custom.id,
        }
    }

    /// Classification predicate. Pure.
    #[must_use]
    pub fn can_handle(&self, node: &ContentNode) -> bool {
        match self {
            Plugin::IntlayerNode => {
                matches!(node, ContentNode::Primitive(p) if p.is_renderable())
            }
            Plugin::Element => matches!(node, ContentNode::Element(_)),
            Plugin::MarkdownString => matches!(node, ContentNode::Primitive(Primitive::Text(_))),
            Plugin::Markdown => matches!(node, ContentNode::Markdown(_)),
            Plugin::Custom(custom) => (custom.can_handle)(node),
        }
    }

    /// Replace `node` with its rendered form.
    #[must_use]
    pub fn transform(
        &self,
        node: ContentNode,
        ctx: &PluginContext,
        chain: &PluginChain,
    ) -> Rendered {
        match (self, node) {
            (Plugin::IntlayerNode, ContentNode::Primitive(p)) if p.is_renderable() => {
                Rendered::View(editor_wrapped(ctx, View::Text(p.to_text())))
            }
            (Plugin::Element, ContentNode::Element(el)) => {
                Rendered::View(selector(ctx, View::Element(render_element(el, ctx, chain))))
            }
            (Plugin::MarkdownString, ContentNode::Primitive(Primitive::Text(source))) => {
                let metadata = markdown_metadata(&source);
                Rendered::View(View::Markdown(MarkdownView { source, metadata }))
            }
            (Plugin::Markdown, ContentNode::Markdown(md)) => Rendered::View(render_markdown(md)),
            (Plugin::Custom(custom), node) => (custom.transform)(node, ctx, chain),
            (plugin, node) => {
                warn!(
                    plugin = plugin.id(),
                    key_path = %ctx.key_path,
                    node_type = ?node.node_type(),
                    "plugin cannot render node; rendering nothing"
                );
                Rendered::View(View::Empty)
            }
        }
    }
}

fn selector(ctx: &PluginContext, child: View) -> View {
    View::Selector(SelectorView {
        dictionary_key: ctx.dictionary_key.clone(),
        key_path: ctx.key_path.clone(),
        active: ctx.editor_enabled,
        child: Box::new(child),
    })
}

fn editor_wrapped(ctx: &PluginContext, child: View) -> View {
    selector(
        ctx,
        View::Edited(EditedView {
            dictionary_key: ctx.dictionary_key.clone(),
            key_path: ctx.key_path.clone(),
            locale: ctx.locale.clone(),
            child: Box::new(child),
        }),
    )
}

fn render_element(el: ElementNode, ctx: &PluginContext, chain: &PluginChain) -> ElementView {
    let children = el
        .children
        .into_iter()
        .enumerate()
        .map(|(i, child)| {
            let child_ctx = ctx.index(i);
            match child {
                ContentNode::Element(nested) => {
                    Rendered::View(View::Element(render_element(nested, &child_ctx, chain)))
                }
                other => transform_tree(other, chain, &child_ctx),
            }
        })
        .collect();
    ElementView {
        tag: el.tag,
        props: el.props,
        children,
    }
}

fn render_markdown(md: MarkdownContent) -> View {
    let metadata = match &md.metadata {
        Some(explicit) => MarkdownMetadata::from_map(explicit),
        None => markdown_metadata(&md.content),
    };
    View::Markdown(MarkdownView {
        source: md.content,
        metadata,
    })
}

/// Ordered, first-match plugin list.
#[derive(Debug, Clone, Default)]
pub struct PluginChain {
    plugins: Vec<Plugin>,
}

impl PluginChain {
    /// An empty chain: every node passes through.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in plugins in default order.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            plugins: Plugin::defaults(),
        }
    }

    /// Append a plugin after every registered one.
    #[must_use]
    pub fn push(mut self, plugin: Plugin) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Append several plugins, keeping their order.
    #[must_use]
    pub fn extend(mut self, plugins: impl IntoIterator<Item = Plugin>) -> Self {
        self.plugins.extend(plugins);
        self
    }

    #[must_use]
    pub fn plugins(&self) -> &[Plugin] {
        &self.plugins
    }

    /// Transform with the first matching plugin, or hand the node back when
    /// none matches.
    pub fn try_dispatch(
        &self,
        node: ContentNode,
        ctx: &PluginContext,
    ) -> Result<Rendered, ContentNode> {
        match self.plugins.iter().find(|p| p.can_handle(&node)) {
            Some(plugin) => {
                trace!(plugin = plugin.id(), key_path = %ctx.key_path, "plugin matched");
                Ok(plugin.transform(node, ctx, self))
            }
            None => Err(node),
        }
    }

    /// Transform with the first matching plugin; unmatched nodes pass
    /// through unchanged. Does not recurse.
    #[must_use]
    pub fn dispatch(&self, node: ContentNode, ctx: &PluginContext) -> Rendered {
        self.try_dispatch(node, ctx).unwrap_or_else(Rendered::Content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn ctx() -> PluginContext {
        PluginContext::new("app", Locale::new("en"))
    }

    fn tagged(id: &'static str) -> Plugin {
        Plugin::custom(id, |_| true, move |_, _, _| Rendered::View(View::text(id)))
    }

    #[test]
    fn first_match_wins() {
        let chain = PluginChain::new().push(tagged("first")).push(tagged("second"));
        let out = chain.dispatch(ContentNode::text("x"), &ctx());
        assert_eq!(out, Rendered::View(View::text("first")));
    }

    #[test]
    fn later_plugins_are_not_consulted_after_a_match() {
        let probes = Rc::new(Cell::new(0u32));
        let probes_clone = Rc::clone(&probes);
        let chain = PluginChain::new().push(tagged("first")).push(Plugin::custom(
            "probe",
            move |_| {
                probes_clone.set(probes_clone.get() + 1);
                true
            },
            |_, _, _| Rendered::default(),
        ));
        let _ = chain.dispatch(ContentNode::text("x"), &ctx());
        assert_eq!(probes.get(), 0);
    }

    #[test]
    fn unmatched_node_passes_through_unchanged() {
        let node = ContentNode::map([("a", ContentNode::from(true))]);
        let out = PluginChain::with_defaults().dispatch(node.clone(), &ctx());
        assert_eq!(out, Rendered::Content(node.clone()));
        assert_eq!(
            PluginChain::new().try_dispatch(node.clone(), &ctx()),
            Err(node)
        );
    }

    #[test]
    fn primitive_gets_editor_decoration() {
        let out = PluginChain::with_defaults()
            .dispatch(ContentNode::text("Hello"), &ctx().key("title"));
        let Rendered::View(View::Selector(sel)) = out else {
            panic!("expected selector, got {out:?}");
        };
        assert!(!sel.active);
        assert_eq!(sel.key_path.to_string(), "app.title");
        let View::Edited(edited) = *sel.child else {
            panic!("expected edited renderer");
        };
        assert_eq!(edited.locale, "en");
        assert_eq!(*edited.child, View::text("Hello"));
    }

    #[test]
    fn editor_flag_activates_selector() {
        let out = PluginChain::with_defaults()
            .dispatch(ContentNode::from(7i64), &ctx().with_editor(true));
        assert!(matches!(
            out,
            Rendered::View(View::Selector(SelectorView { active: true, .. }))
        ));
        assert_eq!(out.plain_text(), "7");
    }

    #[test]
    fn markdown_string_is_shadowed_by_default_order() {
        let out = PluginChain::with_defaults().dispatch(ContentNode::text("# Title"), &ctx());
        assert!(matches!(out, Rendered::View(View::Selector(_))));

        let markdown_first = PluginChain::new()
            .push(Plugin::MarkdownString)
            .push(Plugin::IntlayerNode);
        let out = markdown_first.dispatch(ContentNode::text("---\ntitle: T\n---\n# Title"), &ctx());
        let Rendered::View(View::Markdown(md)) = out else {
            panic!("expected markdown, got {out:?}");
        };
        assert_eq!(md.metadata.title.as_deref(), Some("T"));
        assert_eq!(md.body(), "# Title");
    }

    #[test]
    fn structured_markdown_prefers_explicit_metadata() {
        let node = ContentNode::Markdown(MarkdownContent {
            content: "---\ntitle: FromBody\n---\ntext".into(),
            metadata: Some(
                [("title".to_string(), serde_json::json!("Explicit"))]
                    .into_iter()
                    .collect(),
            ),
        });
        let out = PluginChain::with_defaults().dispatch(node, &ctx());
        let Rendered::View(View::Markdown(md)) = out else {
            panic!("expected markdown");
        };
        assert_eq!(md.metadata.title.as_deref(), Some("Explicit"));

        let body = ContentNode::markdown("---\ntitle: FromBody\n---\ntext");
        let out = PluginChain::with_defaults().dispatch(body, &ctx());
        let Rendered::View(View::Markdown(md)) = out else {
            panic!("expected markdown");
        };
        assert_eq!(md.metadata.title.as_deref(), Some("FromBody"));
    }

    #[test]
    fn element_children_are_rendered_recursively() {
        let node = ContentNode::Element(
            ElementNode::new("p")
                .prop("class", "lead")
                .child("Hello ")
                .child(ElementNode::new("strong").child("world")),
        );
        let out = PluginChain::with_defaults().dispatch(node, &ctx().key("intro"));
        let Rendered::View(View::Selector(sel)) = &out else {
            panic!("expected selector");
        };
        let View::Element(el) = sel.child.as_ref() else {
            panic!("expected element");
        };
        assert_eq!(el.tag, "p");
        assert_eq!(el.props.get("class"), Some(&serde_json::json!("lead")));
        assert_eq!(el.children.len(), 2);
        assert!(matches!(
            &el.children[1],
            Rendered::View(View::Element(inner)) if inner.tag == "strong"
        ));
        assert_eq!(out.plain_text(), "Hello world");
    }

    #[test]
    fn mismatched_transform_degrades_to_empty() {
        let chain = PluginChain::with_defaults();
        for plugin in Plugin::defaults() {
            let out = plugin.transform(ContentNode::from(true), &ctx(), &chain);
            assert!(out.is_empty(), "{} should degrade", plugin.id());
        }
    }

    #[test]
    fn booleans_and_null_are_not_claimed() {
        let chain = PluginChain::with_defaults();
        let ctx = ctx();
        assert!(chain.try_dispatch(ContentNode::from(false), &ctx).is_err());
        assert!(chain.try_dispatch(ContentNode::null(), &ctx).is_err());
    }

    #[test]
    fn extras_run_after_defaults() {
        let bools = Plugin::custom(
            "bools",
            |n| matches!(n, ContentNode::Primitive(Primitive::Bool(_))),
            |_, _, _| Rendered::View(View::text("flag")),
        );
        let chain = PluginChain::with_defaults().extend([bools, tagged("catch-all")]);
        assert_eq!(chain.plugins().len(), 6);
        assert_eq!(
            chain.dispatch(ContentNode::from(true), &ctx()),
            Rendered::View(View::text("flag"))
        );
        assert!(matches!(
            chain.dispatch(ContentNode::text("s"), &ctx()),
            Rendered::View(View::Selector(_))
        ));
    }
}
