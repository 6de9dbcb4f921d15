#![forbid(unsafe_code)]

//! Locale identifiers and best-effort locale resolution.
//!
//! A [`Locale`] is an opaque identifier such as `"en"` or `"en-US"`. The only
//! structure assumed is the dash-separated language prefix used by
//! [`resolve_locale`] for family fallback. Comparisons are exact string
//! equality; no case folding is applied anywhere.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Locale used when nothing else resolves.
pub const FALLBACK_LOCALE: &str = "en";

/// Locale list assumed by [`crate::use_locale`] when the configuration
/// declares none.
pub const DEFAULT_LOCALE_LIST: [&str; 8] = ["en", "fr", "es", "de", "ja", "zh", "ko", "ru"];

/// An opaque locale identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locale(String);

impl Locale {
    /// Wrap an identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The hardcoded fallback locale (`"en"`).
    #[must_use]
    pub fn fallback() -> Self {
        Self::new(FALLBACK_LOCALE)
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Language subtag: everything before the first `-`.
    ///
    /// A locale without a dash is its own language.
    #[must_use]
    pub fn language(&self) -> &str {
        language_of(&self.0)
    }

    /// Whether the identifier is the empty string.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Owned locales for each entry of [`DEFAULT_LOCALE_LIST`].
    #[must_use]
    pub fn default_list() -> Vec<Locale> {
        DEFAULT_LOCALE_LIST.iter().map(|l| Locale::new(*l)).collect()
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Locale {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Locale {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for Locale {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Locale {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Locale {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Locale {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

fn language_of(id: &str) -> &str {
    id.split('-').next().unwrap_or(id)
}

/// Map a requested locale onto the available set.
///
/// 1. Exact member of `available` → returned unchanged.
/// 2. Language prefix (before the first `-`) is a member → the prefix.
/// 3. Otherwise the first available locale, or [`FALLBACK_LOCALE`] when the
///    set is empty.
///
/// Total and side-effect free; safe to call on every render.
#[must_use]
pub fn resolve_locale(requested: &str, available: &[Locale]) -> Locale {
    if available.iter().any(|l| l == requested) {
        return Locale::new(requested);
    }

    let language = language_of(requested);
    if available.iter().any(|l| l == language) {
        return Locale::new(language);
    }

    available.first().cloned().unwrap_or_else(Locale::fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locales(ids: &[&str]) -> Vec<Locale> {
        ids.iter().map(|id| Locale::new(*id)).collect()
    }

    #[test]
    fn exact_match_wins() {
        let available = locales(&["en", "en-US", "fr"]);
        assert_eq!(resolve_locale("en-US", &available), "en-US");
    }

    #[test]
    fn language_prefix_fallback() {
        assert_eq!(resolve_locale("en-US", &locales(&["en", "fr"])), "en");
    }

    #[test]
    fn only_first_dash_splits() {
        assert_eq!(resolve_locale("zh-Hant-TW", &locales(&["fr", "zh"])), "zh");
        assert_eq!(
            resolve_locale("zh-Hant-TW", &locales(&["fr", "zh-Hant"])),
            "fr"
        );
    }

    #[test]
    fn first_available_fallback() {
        assert_eq!(resolve_locale("de", &locales(&["en", "fr"])), "en");
    }

    #[test]
    fn empty_set_uses_hardcoded_fallback() {
        assert_eq!(resolve_locale("de-AT", &[]), FALLBACK_LOCALE);
        assert_eq!(resolve_locale("", &[]), FALLBACK_LOCALE);
    }

    #[test]
    fn comparison_is_case_sensitive() {
        assert_eq!(resolve_locale("EN", &locales(&["fr", "en"])), "fr");
    }

    #[test]
    fn language_subtag() {
        assert_eq!(Locale::new("pt-BR").language(), "pt");
        assert_eq!(Locale::new("pt").language(), "pt");
        assert_eq!(Locale::new("").language(), "");
    }

    #[test]
    fn default_list_order() {
        let list = Locale::default_list();
        assert_eq!(list.len(), 8);
        assert_eq!(list[0], "en");
        assert_eq!(list[7], "ru");
    }
}
