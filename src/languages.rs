use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::language_map::{self, Direction};
use crate::mo;
use crate::paths::{self, SitePaths};
use crate::plural::PluralSelector;
use crate::session::{LANGUAGE_KEY, SessionStore};
use crate::MessageTable;

/// Text domain used when callers do not name one
pub const DEFAULT_DOMAIN: &str = "Main";

/// Locale directories whose catalogs make up the default domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleDirs {
    pub site: PathBuf,
    pub shared: PathBuf,
    pub system: PathBuf,
}

impl LocaleDirs {
    pub fn from_paths(paths: &SitePaths) -> Self {
        LocaleDirs {
            site: paths.site_locale(),
            shared: paths.shared_locale(),
            system: paths.system_locale(),
        }
    }
}

/// Loaded catalogs and the active language of one request
///
/// The plural selector is shared by every domain: whichever catalog loaded
/// last with a valid header decides plural forms for all lookups.
pub struct Languages {
    default_language: String,
    locale_dirs: LocaleDirs,
    codes: Vec<String>,
    names: Vec<(String, String)>,
    messages: MessageTable,
    loaded_paths: Vec<PathBuf>,
    plural: Option<PluralSelector>,
    session: Box<dyn SessionStore>,
    load_calls: usize,
}

impl Languages {
    /// Discover the available languages and load the standard catalogs
    ///
    /// # Arguments
    /// * `locale_dirs` - Site, shared and system locale directories
    /// * `default_language` - Configured fallback language code
    /// * `session` - Store remembering the visitor's choice
    pub fn init(
        locale_dirs: LocaleDirs,
        default_language: &str,
        session: Box<dyn SessionStore>,
    ) -> Self {
        let codes = available_codes(&locale_dirs.site, default_language);
        let names = language_map::names_for(&codes);

        let mut languages = Languages {
            default_language: default_language.to_string(),
            locale_dirs,
            codes,
            names,
            messages: MessageTable::new(),
            loaded_paths: Vec::new(),
            plural: None,
            session,
            load_calls: 0,
        };
        languages.load_standard_domains();

        info!(
            language = %languages.get_current_language(),
            available = ?languages.codes,
            "Languages initialized"
        );
        languages
    }

    /// Every language code with a site catalog, plus the default
    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    /// `(code, name)` pairs of the available languages, sorted by name
    pub fn languages(&self) -> &[(String, String)] {
        &self.names
    }

    pub fn language_exists(&self, code: &str) -> bool {
        self.codes.iter().any(|c| c == code)
    }

    /// Language stored in the session when it is available, else the default
    pub fn get_current_language(&self) -> String {
        match self.session.get(LANGUAGE_KEY) {
            Some(code) if self.language_exists(&code) => code,
            _ => self.default_language.clone(),
        }
    }

    /// Remember `code` for this visitor and reload the catalogs
    ///
    /// The reload happens even for unknown codes. Returns whether the code
    /// was accepted.
    pub fn set_current_language(&mut self, code: &str) -> bool {
        let exists = self.language_exists(code);
        if exists {
            self.session.set(LANGUAGE_KEY, code);
        } else {
            debug!(code = code, "Ignoring unknown language code");
        }
        self.reset();
        exists
    }

    /// Load a catalog file into `domain`
    ///
    /// Files already loaded (into any domain) are skipped and count as
    /// success. Only successful loads are remembered.
    pub fn load_text_domain(&mut self, path: &Path, domain: &str) -> bool {
        self.load_calls += 1;

        if self.loaded_paths.iter().any(|p| p == path) {
            return true;
        }

        if mo::parse_file(path, domain, &mut self.messages, &mut self.plural) {
            debug!(path = %path.display(), domain = domain, "Loaded text domain");
            self.loaded_paths.push(path.to_path_buf());
            true
        } else {
            false
        }
    }

    /// Number of times [`Languages::load_text_domain`] ran since init
    pub fn load_calls(&self) -> usize {
        self.load_calls
    }

    pub fn messages(&self) -> &MessageTable {
        &self.messages
    }

    /// Selector used for plural lookups
    pub fn plural_selector(&self) -> PluralSelector {
        self.plural.clone().unwrap_or_default()
    }

    /// Translation of `message`, or `message` itself when there is none
    pub fn translate(&self, message: &str, domain: &str) -> String {
        self.messages
            .get(domain)
            .and_then(|d| d.get_entry(message))
            .and_then(|entry| entry.translations.first())
            .cloned()
            .unwrap_or_else(|| message.to_string())
    }

    /// Plural-aware translation
    ///
    /// Untranslated messages fall back to `singular` for a count of one and
    /// `plural` otherwise.
    pub fn n_translate(&self, singular: &str, plural: &str, count: i64, domain: &str) -> String {
        let fallback = if count == 1 { singular } else { plural };

        let Some(entry) = self.messages.get(domain).and_then(|d| d.get_entry(singular)) else {
            return fallback.to_string();
        };

        // Negative counts wrap, like the unsigned arithmetic of the expression
        let index = self.plural_selector().select(count as u64);
        entry
            .translations
            .get(index)
            .cloned()
            .unwrap_or_else(|| fallback.to_string())
    }

    pub fn language_direction(&self, code: &str) -> Direction {
        language_map::direction(code)
    }

    pub fn current_language_direction(&self) -> Direction {
        self.language_direction(&self.get_current_language())
    }

    /// Catalog file of the current language inside `locale_dir`
    pub fn text_domain_file(&self, locale_dir: &Path) -> PathBuf {
        paths::text_domain_file(locale_dir, &self.get_current_language())
    }

    pub fn translator(&self) -> Translator<'_> {
        Translator {
            languages: self,
            domain: DEFAULT_DOMAIN,
        }
    }

    pub fn session(&self) -> &dyn SessionStore {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> &mut dyn SessionStore {
        self.session.as_mut()
    }

    pub fn into_session(self) -> Box<dyn SessionStore> {
        self.session
    }

    fn reset(&mut self) {
        self.messages.clear();
        self.loaded_paths.clear();
        self.load_standard_domains();
    }

    fn load_standard_domains(&mut self) {
        let dirs = self.locale_dirs.clone();
        for dir in [&dirs.site, &dirs.shared, &dirs.system] {
            let file = self.text_domain_file(dir);
            self.load_text_domain(&file, DEFAULT_DOMAIN);
        }
    }
}

/// Short translation helpers bound to one domain
#[derive(Clone, Copy)]
pub struct Translator<'a> {
    languages: &'a Languages,
    domain: &'a str,
}

impl<'a> Translator<'a> {
    /// Same helpers for another text domain
    pub fn domain(self, domain: &'a str) -> Self {
        Translator { domain, ..self }
    }

    pub fn t(&self, message: &str) -> String {
        self.languages.translate(message, self.domain)
    }

    pub fn e<W: Write>(&self, out: &mut W, message: &str) -> io::Result<()> {
        out.write_all(self.t(message).as_bytes())
    }

    pub fn n(&self, singular: &str, plural: &str, count: i64) -> String {
        self.languages.n_translate(singular, plural, count, self.domain)
    }

    pub fn ne<W: Write>(&self, out: &mut W, singular: &str, plural: &str, count: i64) -> io::Result<()> {
        out.write_all(self.n(singular, plural, count).as_bytes())
    }
}

/// Subdirectories of `site_locale` holding `<code>/<code>.mo`, plus the default
fn available_codes(site_locale: &Path, default_language: &str) -> Vec<String> {
    let mut codes: Vec<String> = match fs::read_dir(site_locale) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
            .filter(|code| paths::text_domain_file(site_locale, code).is_file())
            .collect(),
        Err(_) => Vec::new(),
    };
    codes.sort();

    if !codes.iter().any(|c| c == default_language) {
        codes.push(default_language.to_string());
    }
    codes
}
