#![forbid(unsafe_code)]

//! Composables: the call-site API used by UI code.
//!
//! Each composable takes the caller's [`Scope`]. Only
//! [`use_intlayer_context`] insists on a provider; the others fall back to a
//! detached context holding the configured default locale.
//!
//! [`use_dictionary`] and [`use_intlayer`] return a [`Computed`] that
//! re-renders when the dictionary (or changed-content overlay) or the
//! effective locale changes, and otherwise hands back its cached tree. An
//! explicit locale argument pins the cell to that locale.

use std::rc::Rc;

use lingua_reactive::{Computed, Observable};
use crate::dictionary::{Dictionary, DictionarySource, get_content};
use crate::error::I18nError;
use crate::locale::Locale;
use crate::persistence::{LocalePersistence, persist};
use crate::provider::{LocaleCallback, LocaleContext, SetLocaleOutcome, log_rejected};
use crate::scope::Scope;
use crate::view::Rendered;

/// The nearest provided context, or [`I18nError::MissingProvider`].
pub fn try_use_intlayer_context(scope: &Scope) -> Result<LocaleContext, I18nError> {
    scope.inject().ok_or(I18nError::MissingProvider)
}

/// The nearest provided context.
///
/// # Panics
///
/// Panics when no provider is in scope. Reaching for the context outside a
/// provider is a programming error.
#[must_use]
pub fn use_intlayer_context(scope: &Scope) -> LocaleContext {
    match try_use_intlayer_context(scope) {
        Ok(context) => context,
        Err(err) => panic!("{err}"),
    }
}

fn editor_enabled(scope: &Scope, context: &LocaleContext) -> bool {
    scope.runtime().config().editor.enabled && !context.disable_editor()
}

/// Render `dictionary` reactively.
pub fn use_dictionary(
    scope: &Scope,
    dictionary: &Observable<Dictionary>,
    locale: Option<Locale>,
) -> Computed<Rendered> {
    let context = scope.inject_or_default();
    let store = Rc::clone(scope.runtime().store());
    let editor = editor_enabled(scope, &context);

    match locale {
        Some(locale) => Computed::from_observable(dictionary, move |dict| {
            get_content(store.as_ref(), dict.into(), &locale, &[], editor)
        }),
        None => Computed::from2(dictionary, context.observable(), move |dict, locale| {
            get_content(store.as_ref(), dict.into(), locale, &[], editor)
        }),
    }
}

/// Render the stored dictionary `key` reactively, preferring an edited
/// preview from the runtime's changed-content overlay.
pub fn use_intlayer(scope: &Scope, key: &str, locale: Option<Locale>) -> Computed<Rendered> {
    let context = scope.inject_or_default();
    let runtime = scope.runtime();
    let store = Rc::clone(runtime.store());
    let editor = editor_enabled(scope, &context);
    let key = key.to_string();

    let render = move |changed: &std::collections::BTreeMap<String, Dictionary>, locale: &Locale| {
        let source = match changed.get(&key) {
            Some(preview) => DictionarySource::Dictionary(preview),
            None => DictionarySource::Key(&key),
        };
        get_content(store.as_ref(), source, locale, &[], editor)
    };

    match locale {
        Some(locale) => Computed::from_observable(runtime.changed_content(), move |changed| {
            render(changed, &locale)
        }),
        None => Computed::from2(runtime.changed_content(), context.observable(), render),
    }
}

/// Locale state and setter for locale pickers.
#[derive(Clone)]
pub struct UseLocale {
    context: LocaleContext,
    default_locale: Locale,
    available_locales: Vec<Locale>,
    persistence: Rc<dyn LocalePersistence>,
    on_locale_change: Option<LocaleCallback>,
}

impl std::fmt::Debug for UseLocale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UseLocale")
            .field("locale", &self.locale())
            .field("default_locale", &self.default_locale)
            .field("available_locales", &self.available_locales)
            .finish_non_exhaustive()
    }
}

impl UseLocale {
    #[must_use]
    pub fn locale(&self) -> Locale {
        self.context.locale()
    }

    #[must_use]
    pub fn default_locale(&self) -> &Locale {
        &self.default_locale
    }

    /// Configured locales, or [`crate::DEFAULT_LOCALE_LIST`] when none are
    /// configured.
    #[must_use]
    pub fn available_locales(&self) -> &[Locale] {
        &self.available_locales
    }

    /// Same list as [`Self::available_locales`].
    #[must_use]
    pub fn locale_list(&self) -> &[Locale] {
        &self.available_locales
    }

    #[must_use]
    pub fn context(&self) -> &LocaleContext {
        &self.context
    }

    /// Validate, switch the context, persist and notify `on_locale_change`.
    ///
    /// The choice is persisted once: by the context itself, or here when a
    /// provider override (or the detached default context) took the request.
    pub fn set_locale(&self, locale: impl Into<Locale>) {
        let locale = locale.into();
        if !self.available_locales.contains(&locale) {
            let err = I18nError::LocaleNotAvailable {
                locale,
                available: self.available_locales.clone(),
            };
            log_rejected(&err);
            return;
        }

        match self.context.try_set_locale(locale.clone()) {
            Ok(SetLocaleOutcome::Unchanged) => {}
            Ok(SetLocaleOutcome::Changed) => self.notify(&locale),
            Ok(SetLocaleOutcome::Delegated) => {
                persist(self.persistence.as_ref(), &locale);
                self.notify(&locale);
            }
            Err(err) => log_rejected(&err),
        }
    }

    fn notify(&self, locale: &Locale) {
        if let Some(callback) = &self.on_locale_change {
            callback(locale);
        }
    }
}

/// Locale state for the caller's scope.
#[must_use]
pub fn use_locale(scope: &Scope, on_locale_change: Option<LocaleCallback>) -> UseLocale {
    let runtime = scope.runtime();
    let config = runtime.config();
    let available_locales = if config.locales().is_empty() {
        Locale::default_list()
    } else {
        config.locales().to_vec()
    };

    UseLocale {
        context: scope.inject_or_default(),
        default_locale: config.default_locale(),
        available_locales,
        persistence: Rc::clone(runtime.persistence()),
        on_locale_change,
    }
}

/// The persisted locale and a way to overwrite it.
#[derive(Clone)]
pub struct LocaleCookie {
    persistence: Rc<dyn LocalePersistence>,
}

impl std::fmt::Debug for LocaleCookie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocaleCookie")
            .field("locale_cookie", &self.locale_cookie())
            .finish()
    }
}

impl LocaleCookie {
    #[must_use]
    pub fn locale_cookie(&self) -> Option<Locale> {
        self.persistence.read()
    }

    /// Write `locale`; failures are logged.
    pub fn set_locale_cookie(&self, locale: &Locale) {
        persist(self.persistence.as_ref(), locale);
    }
}

#[must_use]
pub fn use_locale_cookie(persistence: Rc<dyn LocalePersistence>) -> LocaleCookie {
    LocaleCookie { persistence }
}
