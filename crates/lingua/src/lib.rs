#![forbid(unsafe_code)]

//! lingua public facade crate.
//!
//! Re-exports the reactive primitives and the i18n bindings, and offers
//! [`Lingua`], a builder that wires configuration, a content store and a
//! persistence backend into an [`I18nRuntime`].
//!
//! ```rust,ignore
//! use lingua::prelude::*;
//!
//! let runtime = Lingua::from_toml_file("intlayer.toml")?
//!     .with_dictionary(Dictionary::new("home", home_content))
//!     .build();
//! let scope = runtime.root_scope().mount(runtime.provider().with_locale("fr-CA"));
//! let home = use_intlayer(&scope, "home", None);
//! ```

use std::path::Path;
use std::rc::Rc;

use tracing::debug;

// --- Re-exports -------------------------------------------------------------

pub use lingua_i18n::{
    ContentNode, ContentStore, CookieJar, CookieJarPersistence, Dictionary, FilePersistence,
    I18nRuntime, InMemoryStore, IntlayerConfig, IntlayerProvider, Locale, LocaleContext,
    LocalePersistence, MemoryPersistence, Plugin, PluginChain, Rendered, Scope, View,
    resolve_locale,
};
pub use lingua_reactive::{Computed, Observable, Subscription};

pub use lingua_i18n as i18n;
pub use lingua_reactive as reactive;

// --- Errors -----------------------------------------------------------------

/// Top-level error type for lingua setup.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] lingua_i18n::ConfigError),
    #[error(transparent)]
    I18n(#[from] lingua_i18n::I18nError),
}

/// Standard result type for lingua APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Builder ----------------------------------------------------------------

/// Assembles an [`I18nRuntime`].
///
/// Without explicit collaborators the runtime gets an [`InMemoryStore`]
/// holding the dictionaries added here and a [`CookieJarPersistence`] named
/// after the configured cookie.
pub struct Lingua {
    config: IntlayerConfig,
    dictionaries: Vec<Dictionary>,
    store: Option<Rc<dyn ContentStore>>,
    persistence: Option<Rc<dyn LocalePersistence>>,
}

impl Lingua {
    #[must_use]
    pub fn new(config: IntlayerConfig) -> Self {
        Self {
            config,
            dictionaries: Vec::new(),
            store: None,
            persistence: None,
        }
    }

    /// Load and validate a TOML configuration file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(IntlayerConfig::from_toml_file(path)?.validated()?))
    }

    /// Load and validate a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(IntlayerConfig::from_json_file(path)?.validated()?))
    }

    /// Add a dictionary to the default in-memory store.
    ///
    /// Ignored when a custom store is set with [`Self::with_store`].
    #[must_use]
    pub fn with_dictionary(mut self, dictionary: Dictionary) -> Self {
        self.dictionaries.push(dictionary);
        self
    }

    #[must_use]
    pub fn with_store(mut self, store: impl ContentStore + 'static) -> Self {
        self.store = Some(Rc::new(store));
        self
    }

    #[must_use]
    pub fn with_persistence(mut self, persistence: impl LocalePersistence + 'static) -> Self {
        self.persistence = Some(Rc::new(persistence));
        self
    }

    #[must_use]
    pub fn config(&self) -> &IntlayerConfig {
        &self.config
    }

    #[must_use]
    pub fn build(self) -> I18nRuntime {
        let store: Rc<dyn ContentStore> = match self.store {
            Some(store) => store,
            None => {
                let empty = InMemoryStore::from_config(&self.config);
                Rc::new(
                    self.dictionaries
                        .into_iter()
                        .fold(empty, InMemoryStore::with_dictionary),
                )
            }
        };
        let persistence: Rc<dyn LocalePersistence> = match self.persistence {
            Some(persistence) => persistence,
            None => {
                let jar = CookieJar::new();
                Rc::new(CookieJarPersistence::from_config(&self.config, jar))
            }
        };
        debug!(
            default_locale = %self.config.default_locale(),
            locales = self.config.locales().len(),
            "lingua runtime built"
        );
        I18nRuntime::from_shared(Rc::new(self.config), store, persistence)
    }
}

// --- Prelude ----------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Computed, ContentNode, Dictionary, Error, I18nRuntime, IntlayerConfig, Lingua, Locale,
        LocaleContext, Observable, Plugin, Rendered, Result, Scope, View,
    };

    pub use lingua_i18n::{
        get_dictionary, get_intlayer, use_dictionary, use_intlayer, use_intlayer_context,
        use_locale,
    };

    pub use crate::{i18n, reactive};
}
