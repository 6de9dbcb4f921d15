#![forbid(unsafe_code)]

//! The locale provider and the context it shares with its descendants.
//!
//! [`IntlayerProvider`] picks the initial locale and builds a
//! [`LocaleContext`]: a cheap, clonable handle to one reactive locale cell.
//! Every clone reads and writes the same cell, so a `set_locale` anywhere in
//! the subtree is seen by every consumer.
//!
//! # Initial locale
//!
//! The first value present wins:
//!
//! 1. the `locale` prop,
//! 2. the persisted locale (cookie),
//! 3. the `default_locale` prop,
//! 4. the configured default locale,
//! 5. [`FALLBACK_LOCALE`](crate::FALLBACK_LOCALE).
//!
//! The pick is then mapped onto the configured locale list with
//! [`resolve_locale`], so a requested `fr-CA` becomes `fr` when only `fr` is
//! available. With no configured locales the pick resolves to
//! [`FALLBACK_LOCALE`](crate::FALLBACK_LOCALE); `set_locale` still accepts
//! any locale afterwards.
//!
//! # Setting the locale
//!
//! [`LocaleContext::set_locale`] is a no-op for the current locale, logs and
//! ignores a locale outside the available set, and otherwise updates the cell
//! and persists the choice. A `set_locale` override supplied through
//! [`ProviderProps`] replaces all of that: the context hands the request to
//! the override and changes nothing itself.

use std::fmt;
use std::rc::Rc;

use lingua_reactive::{Observable, Subscription};
use tracing::{debug, error};

use crate::config::IntlayerConfig;
use crate::error::I18nError;
use crate::locale::{Locale, resolve_locale};
use crate::persistence::{LocalePersistence, MemoryPersistence, persist};

/// Callback receiving a locale.
pub type LocaleCallback = Rc<dyn Fn(&Locale)>;

/// What a successful [`LocaleContext::try_set_locale`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetLocaleOutcome {
    /// Already the active locale.
    Unchanged,
    /// The locale cell was updated and the choice persisted.
    Changed,
    /// Handed to the provider's override callback.
    Delegated,
}

/// Which input decided the initial locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitialLocaleSource {
    Prop,
    Persisted,
    DefaultProp,
    Config,
    Fallback,
}

/// Caller-supplied provider inputs.
#[derive(Clone, Default)]
pub struct ProviderProps {
    pub locale: Option<Locale>,
    pub default_locale: Option<Locale>,
    /// Replaces the built-in setter entirely.
    pub set_locale: Option<LocaleCallback>,
    pub disable_editor: bool,
}

impl fmt::Debug for ProviderProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderProps")
            .field("locale", &self.locale)
            .field("default_locale", &self.default_locale)
            .field("set_locale", &self.set_locale.is_some())
            .field("disable_editor", &self.disable_editor)
            .finish()
    }
}

struct ContextInner {
    locale: Observable<Locale>,
    available: Vec<Locale>,
    default_locale: Locale,
    persistence: Rc<dyn LocalePersistence>,
    override_setter: Option<LocaleCallback>,
    disable_editor: bool,
}

/// Shared handle to the active locale of one provider scope.
#[derive(Clone)]
pub struct LocaleContext {
    inner: Rc<ContextInner>,
}

impl fmt::Debug for LocaleContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocaleContext")
            .field("locale", &self.inner.locale.get())
            .field("available", &self.inner.available)
            .field("overridden", &self.inner.override_setter.is_some())
            .field("disable_editor", &self.inner.disable_editor)
            .finish()
    }
}

impl LocaleContext {
    /// Context used when no provider is in scope: the configured default
    /// locale and a setter that does nothing.
    #[must_use]
    pub fn detached(config: &IntlayerConfig) -> Self {
        let noop: LocaleCallback = Rc::new(|_| {});
        Self {
            inner: Rc::new(ContextInner {
                locale: Observable::new(config.default_locale()),
                available: config.locales().to_vec(),
                default_locale: config.default_locale(),
                persistence: Rc::new(MemoryPersistence::new()),
                override_setter: Some(noop),
                disable_editor: false,
            }),
        }
    }

    /// The active locale.
    #[must_use]
    pub fn locale(&self) -> Locale {
        self.inner.locale.get()
    }

    /// The reactive cell behind [`Self::locale`].
    #[must_use]
    pub fn observable(&self) -> &Observable<Locale> {
        &self.inner.locale
    }

    #[must_use]
    pub fn available_locales(&self) -> &[Locale] {
        &self.inner.available
    }

    #[must_use]
    pub fn default_locale(&self) -> &Locale {
        &self.inner.default_locale
    }

    #[must_use]
    pub fn disable_editor(&self) -> bool {
        self.inner.disable_editor
    }

    #[must_use]
    pub fn is_overridden(&self) -> bool {
        self.inner.override_setter.is_some()
    }

    /// Call `callback` with each new active locale.
    pub fn subscribe(&self, callback: impl Fn(&Locale) + 'static) -> Subscription {
        self.inner.locale.subscribe(callback)
    }

    /// Request a locale change; failures are logged, never returned.
    pub fn set_locale(&self, locale: impl Into<Locale>) {
        if let Err(err) = self.try_set_locale(locale) {
            log_rejected(&err);
        }
    }

    /// Request a locale change and report what happened.
    pub fn try_set_locale(
        &self,
        locale: impl Into<Locale>,
    ) -> Result<SetLocaleOutcome, I18nError> {
        let locale = locale.into();
        let inner = &self.inner;

        if let Some(setter) = &inner.override_setter {
            setter(&locale);
            return Ok(SetLocaleOutcome::Delegated);
        }

        if inner.locale.with(|current| *current == locale) {
            return Ok(SetLocaleOutcome::Unchanged);
        }

        if !inner.available.is_empty() && !inner.available.contains(&locale) {
            return Err(I18nError::LocaleNotAvailable {
                locale,
                available: inner.available.clone(),
            });
        }

        inner.locale.set(locale.clone());
        persist(inner.persistence.as_ref(), &locale);
        debug!(%locale, "locale changed");
        Ok(SetLocaleOutcome::Changed)
    }
}

/// Log a failed locale change at `error`, with the rejected locale and the
/// available set as fields.
pub(crate) fn log_rejected(err: &I18nError) {
    match err {
        I18nError::LocaleNotAvailable { locale, available } => {
            error!(locale = %locale, available = ?available, "{err}");
        }
        other => error!(error = %other, "{other}"),
    }
}

/// Builds a [`LocaleContext`].
pub struct IntlayerProvider {
    config: Rc<IntlayerConfig>,
    persistence: Rc<dyn LocalePersistence>,
    props: ProviderProps,
}

impl IntlayerProvider {
    /// A provider with no props: the initial locale comes from persistence,
    /// then the configuration.
    #[must_use]
    pub fn new(config: Rc<IntlayerConfig>, persistence: Rc<dyn LocalePersistence>) -> Self {
        Self {
            config,
            persistence,
            props: ProviderProps::default(),
        }
    }

    /// Replace all props at once.
    #[must_use]
    pub fn with_props(mut self, props: ProviderProps) -> Self {
        self.props = props;
        self
    }

    /// Requested locale; beats the persisted one.
    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<Locale>) -> Self {
        self.props.locale = Some(locale.into());
        self
    }

    /// Used when neither a requested nor a persisted locale is present.
    #[must_use]
    pub fn with_default_locale(mut self, locale: impl Into<Locale>) -> Self {
        self.props.default_locale = Some(locale.into());
        self
    }

    /// Hand every `set_locale` request to `setter` instead of the built-in
    /// logic.
    #[must_use]
    pub fn with_set_locale(mut self, setter: impl Fn(&Locale) + 'static) -> Self {
        self.props.set_locale = Some(Rc::new(setter));
        self
    }

    /// Turn editor decoration off for this subtree.
    #[must_use]
    pub fn with_disable_editor(mut self, disable: bool) -> Self {
        self.props.disable_editor = disable;
        self
    }

    /// The initial locale before resolution, and where it came from.
    #[must_use]
    pub fn initial_locale(&self) -> (Locale, InitialLocaleSource) {
        let present = |l: &Locale| !l.is_empty();
        let configured = &self.config.internationalization.default_locale;

        if let Some(l) = self.props.locale.clone().filter(present) {
            (l, InitialLocaleSource::Prop)
        } else if let Some(l) = self.persistence.read().filter(present) {
            (l, InitialLocaleSource::Persisted)
        } else if let Some(l) = self.props.default_locale.clone().filter(present) {
            (l, InitialLocaleSource::DefaultProp)
        } else if present(configured) {
            (configured.clone(), InitialLocaleSource::Config)
        } else {
            (Locale::fallback(), InitialLocaleSource::Fallback)
        }
    }

    /// Build the context.
    #[must_use]
    pub fn create(self) -> LocaleContext {
        let (initial, source) = self.initial_locale();
        let available = self.config.locales().to_vec();
        let locale = resolve_locale(initial.as_str(), &available);
        debug!(
            requested = %initial,
            %locale,
            ?source,
            available = available.len(),
            "locale provider created"
        );

        LocaleContext {
            inner: Rc::new(ContextInner {
                locale: Observable::new(locale),
                available,
                default_locale: self.config.default_locale(),
                persistence: self.persistence,
                override_setter: self.props.set_locale,
                disable_editor: self.props.disable_editor,
            }),
        }
    }
}

impl fmt::Debug for IntlayerProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntlayerProvider")
            .field("config", &self.config)
            .field("props", &self.props)
            .finish_non_exhaustive()
    }
}
