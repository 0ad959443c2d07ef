//! Humm, a web framework driven by file conventions
//!
//! An installation root holds a `Humm/` tree with sites, shared assets,
//! system views and plugins. [`Bootstrap::handle`] turns a request into a
//! rendered view: it picks the site from the host name, layers the
//! configuration, loads gettext MO catalogs, loads plugins, resolves the view
//! from the URL and runs its controllers.

use std::collections::HashMap;

pub mod bootstrap;
pub mod config;
pub mod controller;
pub mod error;
pub mod faults;
pub mod language_map;
pub mod languages;
pub mod mo;
pub mod paths;
pub mod plugins;
pub mod plural;
pub mod sample;
pub mod session;
pub mod sites;
pub mod template;
pub mod url;
pub mod views;

#[cfg(test)]
mod testing;

pub use bootstrap::{Bootstrap, Request, Response};
pub use config::Configuration;
pub use controller::{ControllerRegistry, HummView, ViewContext};
pub use error::{HummError, HummResult};
pub use faults::{ErrorHandler, ErrorInfo};
pub use languages::{Languages, Translator};
pub use paths::SitePaths;
pub use plugins::{Plugin, PluginAction, PluginFactories, PluginFilter, PluginRegistry};
pub use plural::PluralSelector;
pub use session::{JsonFileSession, MemorySession, SessionStore};
pub use template::HtmlTemplate;
pub use url::UrlArguments;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// One catalog message with its plural variants
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Original string followed by its plural form, if any
    pub ids: Vec<String>,
    /// One translation per plural form
    pub translations: Vec<String>,
}

/// Messages of one text domain, keyed by original string
#[derive(Debug, Clone, Default)]
pub struct TextDomain(pub HashMap<String, CatalogEntry>);

impl TextDomain {
    pub fn new() -> Self {
        TextDomain(HashMap::new())
    }

    pub fn with_entry(&mut self, key: String, entry: CatalogEntry) -> &mut Self {
        self.0.insert(key, entry);
        self
    }

    pub fn get_entry(&self, key: &str) -> Option<&CatalogEntry> {
        self.0.get(key)
    }

    pub fn entries(&self) -> &HashMap<String, CatalogEntry> {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Metadata block stored under the empty key
    pub fn header(&self) -> Option<&str> {
        self.0
            .get(mo::HEADER_KEY)
            .and_then(|entry| entry.translations.first())
            .map(String::as_str)
    }
}

/// Text domains keyed by domain name
pub type MessageTable = HashMap<String, TextDomain>;

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, translation: &str) -> CatalogEntry {
        CatalogEntry {
            ids: vec![id.to_string()],
            translations: vec![translation.to_string()],
        }
    }

    #[test]
    fn test_text_domain() {
        let mut domain = TextDomain::new();
        assert!(domain.is_empty());
        assert_eq!(domain.header(), None);

        domain
            .with_entry("Hello".to_string(), entry("Hello", "Hola"))
            .with_entry("".to_string(), entry("", "Language: es\n"));

        assert_eq!(domain.len(), 2);
        assert_eq!(domain.get_entry("Hello").unwrap().translations, vec!["Hola"]);
        assert_eq!(domain.header(), Some("Language: es\n"));
        assert!(domain.get_entry("Bye").is_none());
    }

    #[test]
    fn test_later_entries_replace_earlier_ones() {
        let mut domain = TextDomain::new();
        domain
            .with_entry("Hello".to_string(), entry("Hello", "Hola"))
            .with_entry("Hello".to_string(), entry("Hello", "Buenas"));
        assert_eq!(domain.entries()["Hello"].translations[0], "Buenas");
    }
}
