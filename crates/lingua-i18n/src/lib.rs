#![forbid(unsafe_code)]

//! Reactive internationalization bindings for lingua.
//!
//! Holds the active locale in reactive state shared through an explicit
//! provider [`Scope`], resolves dictionary content for that locale, and runs
//! the resolved content through an ordered chain of transform [`Plugin`]s
//! that turn primitives, markdown and element descriptors into renderable
//! [`View`]s.
//!
//! # How it fits in the system
//!
//! ```text
//! use_intlayer(key) ─► ContentStore (raw, locale-specific tree)
//!                           │
//!                           ▼
//!                   transform_tree ─► PluginChain::dispatch (first match wins)
//!                           │
//!                           ▼
//!                   Computed<Rendered>  ◄── Observable<Locale> (LocaleContext)
//! ```
//!
//! The dictionary engine, cookie storage and the host UI are collaborators
//! behind the [`ContentStore`] and [`LocalePersistence`] traits.

pub mod config;
pub mod content;
pub mod dictionary;
pub mod error;
pub mod hooks;
pub mod locale;
pub mod markdown;
pub mod persistence;
pub mod plugin;
pub mod provider;
pub mod scope;
pub mod view;

pub use config::{EditorConfig, IntlayerConfig, InternationalizationConfig, MiddlewareConfig};
pub use content::{
    ContentNode, ElementNode, KeyPath, KeyPathSegment, MarkdownContent, NodeType, Primitive,
};
pub use dictionary::{
    ContentStore, Dictionary, DictionarySource, InMemoryStore, get_content, get_dictionary,
    get_intlayer, transform_tree,
};
pub use error::{ConfigError, I18nError, PersistenceError};
pub use hooks::{
    LocaleCookie, UseLocale, try_use_intlayer_context, use_dictionary, use_intlayer,
    use_intlayer_context, use_locale, use_locale_cookie,
};
pub use locale::{DEFAULT_LOCALE_LIST, FALLBACK_LOCALE, Locale, resolve_locale};
pub use markdown::{MarkdownMetadata, markdown_metadata, strip_front_matter};
pub use persistence::{
    CookieAttributes, CookieJar, CookieJarPersistence, FilePersistence, LocalePersistence,
    MemoryPersistence, SameSite,
};
pub use plugin::{CustomPlugin, Plugin, PluginChain, PluginContext};
pub use provider::{
    InitialLocaleSource, IntlayerProvider, LocaleCallback, LocaleContext, ProviderProps,
    SetLocaleOutcome,
};
pub use scope::{I18nRuntime, Scope};
pub use view::{EditedView, ElementView, MarkdownView, Rendered, SelectorView, View};
