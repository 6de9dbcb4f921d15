#![forbid(unsafe_code)]

//! Where the chosen locale survives between sessions.
//!
//! Writes are fire-and-forget from the point of view of the locale context:
//! a failing [`LocalePersistence::write`] is logged and otherwise ignored.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::{DEFAULT_COOKIE_NAME, IntlayerConfig};
use crate::error::PersistenceError;
use crate::locale::Locale;

/// Reads and writes the persisted locale.
pub trait LocalePersistence {
    /// The stored locale, if any.
    fn read(&self) -> Option<Locale>;

    fn write(&self, locale: &Locale) -> Result<(), PersistenceError>;
}

/// `SameSite` cookie attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    #[default]
    Strict,
    Lax,
    None,
}

impl SameSite {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "Strict",
            Self::Lax => "Lax",
            Self::None => "None",
        }
    }
}

/// Attributes written with the locale cookie. Defaults: path `/`,
/// `SameSite=Strict`, not secure, session lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieAttributes {
    pub path: String,
    pub domain: Option<String>,
    pub same_site: SameSite,
    pub secure: bool,
    /// Seconds; `None` keeps the cookie for the session.
    pub max_age: Option<u64>,
}

impl Default for CookieAttributes {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            domain: None,
            same_site: SameSite::Strict,
            secure: false,
            max_age: None,
        }
    }
}

/// Shared in-memory cookie store. Clones see the same cookies.
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    cookies: Rc<RefCell<BTreeMap<String, String>>>,
}

impl CookieJar {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a jar from a `Cookie` request header (`a=1; b=2`).
    #[must_use]
    pub fn from_header(header: &str) -> Self {
        let jar = Self::new();
        for pair in header.split(';') {
            if let Some((name, value)) = pair.split_once('=') {
                let name = name.trim();
                if !name.is_empty() {
                    jar.set(name, value.trim());
                }
            }
        }
        jar
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        self.cookies.borrow().get(name).cloned()
    }

    pub fn set(&self, name: &str, value: &str) {
        self.cookies
            .borrow_mut()
            .insert(name.to_string(), value.to_string());
    }

    pub fn remove(&self, name: &str) -> Option<String> {
        self.cookies.borrow_mut().remove(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cookies.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.borrow().is_empty()
    }
}

/// Locale stored in a named cookie.
#[derive(Debug, Clone)]
pub struct CookieJarPersistence {
    name: String,
    attributes: CookieAttributes,
    jar: CookieJar,
}

impl CookieJarPersistence {
    #[must_use]
    pub fn new(name: impl Into<String>, jar: CookieJar) -> Self {
        Self {
            name: name.into(),
            attributes: CookieAttributes::default(),
            jar,
        }
    }

    /// Cookie named after the configured `middleware.cookie_name`.
    #[must_use]
    pub fn from_config(config: &IntlayerConfig, jar: CookieJar) -> Self {
        Self::new(config.cookie_name(), jar)
    }

    #[must_use]
    pub fn with_attributes(mut self, attributes: CookieAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn jar(&self) -> &CookieJar {
        &self.jar
    }

    /// `Set-Cookie` header value for the stored locale, if one is set.
    #[must_use]
    pub fn set_cookie_header(&self) -> Option<String> {
        let value = self.jar.get(&self.name)?;
        Some(self.render(&value))
    }

    fn render(&self, value: &str) -> String {
        let attrs = &self.attributes;
        let mut header = format!("{}={}; Path={}", self.name, value, attrs.path);
        if let Some(domain) = &attrs.domain {
            header.push_str("; Domain=");
            header.push_str(domain);
        }
        if let Some(max_age) = attrs.max_age {
            header.push_str(&format!("; Max-Age={max_age}"));
        }
        header.push_str("; SameSite=");
        header.push_str(attrs.same_site.as_str());
        if attrs.secure {
            header.push_str("; Secure");
        }
        header
    }
}

impl Default for CookieJarPersistence {
    fn default() -> Self {
        Self::new(DEFAULT_COOKIE_NAME, CookieJar::new())
    }
}

impl LocalePersistence for CookieJarPersistence {
    fn read(&self) -> Option<Locale> {
        self.jar
            .get(&self.name)
            .filter(|v| !v.is_empty())
            .map(Locale::new)
    }

    fn write(&self, locale: &Locale) -> Result<(), PersistenceError> {
        self.jar.set(&self.name, locale.as_str());
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
struct PersistedLocale {
    locale: Locale,
}

/// Locale stored as a small JSON document on disk.
#[derive(Debug, Clone)]
pub struct FilePersistence {
    path: PathBuf,
}

impl FilePersistence {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Option<Locale>, PersistenceError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        let stored: PersistedLocale = serde_json::from_str(&content)?;
        Ok(Some(stored.locale).filter(|l| !l.is_empty()))
    }
}

impl LocalePersistence for FilePersistence {
    fn read(&self) -> Option<Locale> {
        self.load().unwrap_or_else(|err| {
            warn!(path = %self.path.display(), error = %err, "ignoring unreadable locale file");
            None
        })
    }

    fn write(&self, locale: &Locale) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&PersistedLocale {
            locale: locale.clone(),
        })?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

/// In-memory persistence that counts writes. Clones share state.
#[derive(Clone, Default)]
pub struct MemoryPersistence {
    stored: Rc<RefCell<Option<Locale>>>,
    writes: Rc<Cell<usize>>,
}

impl MemoryPersistence {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `locale` already stored (not counted as a write).
    #[must_use]
    pub fn with_locale(locale: impl Into<Locale>) -> Self {
        let persistence = Self::default();
        *persistence.stored.borrow_mut() = Some(locale.into());
        persistence
    }

    /// Number of `write` calls so far.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes.get()
    }

    #[must_use]
    pub fn stored(&self) -> Option<Locale> {
        self.stored.borrow().clone()
    }
}

impl fmt::Debug for MemoryPersistence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryPersistence")
            .field("stored", &self.stored.borrow())
            .field("writes", &self.writes.get())
            .finish()
    }
}

impl LocalePersistence for MemoryPersistence {
    fn read(&self) -> Option<Locale> {
        self.stored()
    }

    fn write(&self, locale: &Locale) -> Result<(), PersistenceError> {
        self.writes.set(self.writes.get() + 1);
        *self.stored.borrow_mut() = Some(locale.clone());
        Ok(())
    }
}

/// Write `locale`, logging instead of returning a failure.
pub(crate) fn persist(persistence: &dyn LocalePersistence, locale: &Locale) {
    if let Err(err) = persistence.write(locale) {
        warn!(%locale, error = %err, "failed to persist locale");
    }
}
