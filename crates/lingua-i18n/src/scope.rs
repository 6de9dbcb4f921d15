#![forbid(unsafe_code)]

//! Application runtime and the provider scope tree.
//!
//! An [`I18nRuntime`] is built once per application root from the static
//! configuration, a content store and a persistence backend. Scopes form an
//! explicit tree below it: [`Scope::provide`] opens a child scope carrying a
//! [`LocaleContext`], and [`Scope::inject`] finds the nearest one walking
//! towards the root. Nothing is global; two runtimes never share state.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use lingua_reactive::Observable;

use crate::config::IntlayerConfig;
use crate::dictionary::{ContentStore, Dictionary};
use crate::persistence::LocalePersistence;
use crate::provider::{IntlayerProvider, LocaleContext};

struct RuntimeInner {
    config: Rc<IntlayerConfig>,
    store: Rc<dyn ContentStore>,
    persistence: Rc<dyn LocalePersistence>,
    changed_content: Observable<BTreeMap<String, Dictionary>>,
}

/// Per-application collaborators. Clones share everything.
#[derive(Clone)]
pub struct I18nRuntime {
    inner: Rc<RuntimeInner>,
}

impl fmt::Debug for I18nRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("I18nRuntime")
            .field("config", &self.inner.config)
            .field(
                "changed_content",
                &self.inner.changed_content.with(|c| c.keys().cloned().collect::<Vec<_>>()),
            )
            .finish_non_exhaustive()
    }
}

impl I18nRuntime {
    pub fn new(
        config: IntlayerConfig,
        store: impl ContentStore + 'static,
        persistence: impl LocalePersistence + 'static,
    ) -> Self {
        Self::from_shared(Rc::new(config), Rc::new(store), Rc::new(persistence))
    }

    pub fn from_shared(
        config: Rc<IntlayerConfig>,
        store: Rc<dyn ContentStore>,
        persistence: Rc<dyn LocalePersistence>,
    ) -> Self {
        Self {
            inner: Rc::new(RuntimeInner {
                config,
                store,
                persistence,
                changed_content: Observable::new(BTreeMap::new()),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &IntlayerConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn store(&self) -> &Rc<dyn ContentStore> {
        &self.inner.store
    }

    #[must_use]
    pub fn persistence(&self) -> &Rc<dyn LocalePersistence> {
        &self.inner.persistence
    }

    /// A provider wired to this runtime's configuration and persistence.
    #[must_use]
    pub fn provider(&self) -> IntlayerProvider {
        let config = Rc::clone(&self.inner.config);
        IntlayerProvider::new(config, Rc::clone(&self.inner.persistence))
    }

    /// Root of the scope tree; it carries no locale context.
    #[must_use]
    pub fn root_scope(&self) -> Scope {
        Scope {
            node: Rc::new(ScopeNode {
                runtime: self.clone(),
                parent: None,
                context: None,
            }),
        }
    }

    /// Edited dictionaries that take precedence over the store, keyed by
    /// dictionary key.
    #[must_use]
    pub fn changed_content(&self) -> &Observable<BTreeMap<String, Dictionary>> {
        &self.inner.changed_content
    }

    /// Preview `dictionary` in place of the stored one with the same key.
    pub fn set_changed_content(&self, dictionary: Dictionary) {
        self.inner.changed_content.update(|changed| {
            changed.insert(dictionary.key.clone(), dictionary);
        });
    }

    /// Drop the preview for `key`, if any.
    pub fn clear_changed_content(&self, key: &str) {
        self.inner.changed_content.update(|changed| {
            changed.remove(key);
        });
    }
}

struct ScopeNode {
    runtime: I18nRuntime,
    parent: Option<Scope>,
    context: Option<LocaleContext>,
}

/// A node of the provider scope tree.
#[derive(Clone)]
pub struct Scope {
    node: Rc<ScopeNode>,
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("depth", &self.depth())
            .field("context", &self.node.context)
            .finish()
    }
}

impl Scope {
    #[must_use]
    pub fn runtime(&self) -> &I18nRuntime {
        &self.node.runtime
    }

    /// A child scope that inherits everything.
    #[must_use]
    pub fn child(&self) -> Scope {
        self.descend(None)
    }

    /// A child scope that provides `context` to its descendants.
    #[must_use]
    pub fn provide(&self, context: LocaleContext) -> Scope {
        self.descend(Some(context))
    }

    /// Build a provider context and provide it in a child scope.
    #[must_use]
    pub fn mount(&self, provider: IntlayerProvider) -> Scope {
        self.provide(provider.create())
    }

    /// The nearest provided context, walking towards the root.
    #[must_use]
    pub fn inject(&self) -> Option<LocaleContext> {
        let mut scope = Some(self);
        while let Some(current) = scope {
            if let Some(context) = &current.node.context {
                return Some(context.clone());
            }
            scope = current.node.parent.as_ref();
        }
        None
    }

    /// The nearest context, or a detached default one.
    #[must_use]
    pub fn inject_or_default(&self) -> LocaleContext {
        self.inject()
            .unwrap_or_else(|| LocaleContext::detached(self.runtime().config()))
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        std::iter::successors(self.node.parent.as_ref(), |s| s.node.parent.as_ref()).count()
    }

    fn descend(&self, context: Option<LocaleContext>) -> Scope {
        Scope {
            node: Rc::new(ScopeNode {
                runtime: self.node.runtime.clone(),
                parent: Some(self.clone()),
                context,
            }),
        }
    }
}
