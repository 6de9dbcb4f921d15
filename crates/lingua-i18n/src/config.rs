#![forbid(unsafe_code)]

//! Static i18n configuration, read once at startup.
//!
//! # Loading
//!
//! ```toml
//! # intlayer.toml
//! [internationalization]
//! default_locale = "en"
//! locales = ["en", "fr", "es"]
//!
//! [middleware]
//! cookie_name = "intlayer-locale"
//! ```
//!
//! ```rust,ignore
//! let config = IntlayerConfig::from_toml_file("intlayer.toml")?.validated()?;
//! let config = IntlayerConfig::from_json_str(json)?;
//! ```
//!
//! JSON files may use the camelCase keys of the original configuration
//! format (`defaultLocale`, `cookieName`).
//!
//! # Defaults
//!
//! `IntlayerConfig::default()` has default locale `"en"`, an empty locale
//! list (every locale accepted), cookie name `"intlayer-locale"` and the
//! editor disabled.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::locale::{FALLBACK_LOCALE, Locale};

/// Cookie name used when the configuration does not set one.
pub const DEFAULT_COOKIE_NAME: &str = "intlayer-locale";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IntlayerConfig {
    pub internationalization: InternationalizationConfig,
    pub middleware: MiddlewareConfig,
    pub editor: EditorConfig,
}

/// Locale set and default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InternationalizationConfig {
    #[serde(alias = "defaultLocale")]
    pub default_locale: Locale,
    /// Ordered; the first entry is the implicit resolution default.
    pub locales: Vec<Locale>,
}

impl Default for InternationalizationConfig {
    fn default() -> Self {
        Self {
            default_locale: Locale::new(FALLBACK_LOCALE),
            locales: Vec::new(),
        }
    }
}

/// Locale persistence settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MiddlewareConfig {
    #[serde(alias = "cookieName")]
    pub cookie_name: String,
}

impl Default for MiddlewareConfig {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
        }
    }
}

/// Visual editor integration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub enabled: bool,
}

impl IntlayerConfig {
    /// Load from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load from a TOML file on disk.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Shorthand for a configuration with the given default and locale list.
    #[must_use]
    pub fn with_locales(default_locale: impl Into<Locale>, locales: &[&str]) -> Self {
        Self {
            internationalization: InternationalizationConfig {
                default_locale: default_locale.into(),
                locales: locales.iter().map(|l| Locale::new(*l)).collect(),
            },
            ..Self::default()
        }
    }

    /// Check every setting; an empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let intl = &self.internationalization;

        if intl.default_locale.is_empty() {
            errors.push("internationalization.default_locale must not be empty".into());
        }

        for (idx, locale) in intl.locales.iter().enumerate() {
            if locale.is_empty() {
                errors.push(format!("internationalization.locales[{idx}] must not be empty"));
            } else if intl.locales[..idx].contains(locale) {
                errors.push(format!(
                    "internationalization.locales contains {locale} more than once"
                ));
            }
        }

        if !intl.locales.is_empty()
            && !intl.default_locale.is_empty()
            && !intl.locales.contains(&intl.default_locale)
        {
            errors.push(format!(
                "internationalization.default_locale {} is not listed in internationalization.locales",
                intl.default_locale
            ));
        }

        if self.middleware.cookie_name.trim().is_empty() {
            errors.push("middleware.cookie_name must not be empty".into());
        }

        errors
    }

    /// Consume the config, failing with every validation problem at once.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }

    /// The configured locale list (may be empty).
    #[must_use]
    pub fn locales(&self) -> &[Locale] {
        &self.internationalization.locales
    }

    /// The configured default locale, or [`FALLBACK_LOCALE`] when blank.
    #[must_use]
    pub fn default_locale(&self) -> Locale {
        let configured = &self.internationalization.default_locale;
        if configured.is_empty() {
            Locale::fallback()
        } else {
            configured.clone()
        }
    }

    /// Cookie name, falling back to [`DEFAULT_COOKIE_NAME`] when blank.
    #[must_use]
    pub fn cookie_name(&self) -> &str {
        let name = self.middleware.cookie_name.trim();
        if name.is_empty() { DEFAULT_COOKIE_NAME } else { name }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = IntlayerConfig::default();
        assert_eq!(config.default_locale(), "en");
        assert!(config.locales().is_empty());
        assert_eq!(config.cookie_name(), DEFAULT_COOKIE_NAME);
        assert!(!config.editor.enabled);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn toml_round_trip_of_partial_document() {
        let config = IntlayerConfig::from_toml_str(
            r#"
            [internationalization]
            default_locale = "fr"
            locales = ["fr", "en"]
            "#,
        )
        .expect("valid toml");
        assert_eq!(config.default_locale(), "fr");
        assert_eq!(config.locales(), &[Locale::new("fr"), Locale::new("en")]);
        assert_eq!(config.cookie_name(), DEFAULT_COOKIE_NAME);
    }

    #[test]
    fn json_accepts_camel_case_keys() {
        let config = IntlayerConfig::from_json_str(
            r#"{
                "internationalization": { "defaultLocale": "es", "locales": ["en", "es"] },
                "middleware": { "cookieName": "lang" },
                "editor": { "enabled": true }
            }"#,
        )
        .expect("valid json");
        assert_eq!(config.default_locale(), "es");
        assert_eq!(config.cookie_name(), "lang");
        assert!(config.editor.enabled);
    }

    #[test]
    fn malformed_toml_is_reported() {
        let err = IntlayerConfig::from_toml_str("[internationalization\n").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn validation_collects_all_problems() {
        let mut config = IntlayerConfig::with_locales("de", &["en", "", "en"]);
        config.middleware.cookie_name = "  ".into();
        let errors = config.validate();
        assert_eq!(errors.len(), 4, "{errors:?}");
        assert!(errors.iter().any(|e| e.contains("locales[1]")));
        assert!(errors.iter().any(|e| e.contains("more than once")));
        assert!(errors.iter().any(|e| e.contains("not listed")));
        assert!(errors.iter().any(|e| e.contains("cookie_name")));

        assert!(matches!(config.validated(), Err(ConfigError::Invalid(list)) if list.len() == 4));
    }

    #[test]
    fn files_load_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let toml_path = dir.path().join("intlayer.toml");
        std::fs::write(
            &toml_path,
            "[internationalization]\ndefault_locale = \"en\"\nlocales = [\"en\", \"ja\"]\n",
        )
        .expect("write toml");
        let from_toml = IntlayerConfig::from_toml_file(&toml_path).expect("load toml");
        assert_eq!(from_toml.locales().len(), 2);

        let json_path = dir.path().join("intlayer.json");
        let json = serde_json::to_string(&from_toml).expect("serialize");
        std::fs::write(&json_path, json).expect("write json");
        let from_json = IntlayerConfig::from_json_file(&json_path).expect("load json");
        assert_eq!(from_json, from_toml);

        let missing = IntlayerConfig::from_toml_file(dir.path().join("absent.toml"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }
}
