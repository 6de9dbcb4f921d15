#![forbid(unsafe_code)]

//! Error types.

use thiserror::Error;

use crate::locale::Locale;

/// Failure loading or validating an [`crate::IntlayerConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("failed to parse JSON configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

/// Failure reading or writing a persisted locale.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("locale storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("locale storage is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors surfaced by the locale context and composables.
#[derive(Debug, Error)]
pub enum I18nError {
    /// A composable that requires a provider ran outside any provider scope.
    #[error("use_intlayer_context must be used within an IntlayerProvider")]
    MissingProvider,
    /// The requested locale is not part of the available set.
    #[error("Locale {locale} is not available")]
    LocaleNotAvailable {
        locale: Locale,
        available: Vec<Locale>,
    },
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
