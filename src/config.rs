use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::{HummError, HummResult};
use crate::paths::SitePaths;

const ACTIVE_PLUGINS_SEPARATOR: char = ',';

/// Effective configuration of one site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    /// Default language code
    pub language: String,
    /// Comma-separated plugin identifiers allowed to load
    pub active_plugins: String,
    /// Expose fault details in the error view
    pub show_errors: bool,
    /// Public URL of the site root
    pub site_url: String,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            language: "en".to_string(),
            active_plugins: String::new(),
            show_errors: false,
            site_url: "/".to_string(),
        }
    }
}

/// One configuration file; absent keys leave the lower layer untouched
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigLayer {
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    active_plugins: Option<String>,
    #[serde(default)]
    show_errors: Option<bool>,
    #[serde(default)]
    site_url: Option<String>,
}

impl Configuration {
    /// Load system defaults then apply the site overrides
    ///
    /// Missing files are skipped. Unreadable or malformed files are errors.
    pub fn load(paths: &SitePaths) -> HummResult<Self> {
        Self::from_files(&paths.system_config_file(), &paths.site_config_file())
    }

    pub fn from_files(system: &Path, site: &Path) -> HummResult<Self> {
        let mut config = Configuration::default();
        for path in [system, site] {
            if let Some(layer) = read_layer(path)? {
                config.apply(layer);
            }
        }
        Ok(config)
    }

    /// Parse a single JSON document on top of the defaults
    pub fn from_json(content: &str) -> HummResult<Self> {
        let layer: ConfigLayer =
            serde_json::from_str(content).map_err(|e| HummError::Config(e.to_string()))?;
        let mut config = Configuration::default();
        config.apply(layer);
        Ok(config)
    }

    fn apply(&mut self, layer: ConfigLayer) {
        if let Some(language) = layer.language {
            self.language = language;
        }
        if let Some(active_plugins) = layer.active_plugins {
            self.active_plugins = active_plugins;
        }
        if let Some(show_errors) = layer.show_errors {
            self.show_errors = show_errors;
        }
        if let Some(site_url) = layer.site_url {
            self.site_url = site_url;
        }
    }

    /// Plugin identifiers from the allow-list, blanks removed
    pub fn active_plugin_ids(&self) -> Vec<&str> {
        self.active_plugins
            .split(ACTIVE_PLUGINS_SEPARATOR)
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .collect()
    }
}

fn read_layer(path: &Path) -> HummResult<Option<ConfigLayer>> {
    if !path.is_file() {
        debug!(path = %path.display(), "No configuration file");
        return Ok(None);
    }

    let content = fs::read_to_string(path).map_err(|e| HummError::io(path, e))?;
    let layer = serde_json::from_str(&content)
        .map_err(|e| HummError::Config(format!("{}: {}", path.display(), e)))?;
    Ok(Some(layer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Configuration::default();
        assert_eq!(config.language, "en");
        assert!(!config.show_errors);
        assert!(config.active_plugin_ids().is_empty());
    }

    #[test]
    fn test_site_overrides_system() {
        let dir = tempfile::tempdir().unwrap();
        let system = dir.path().join("system.json");
        let site = dir.path().join("site.json");
        std::fs::write(&system, r#"{"language": "es", "show_errors": true}"#).unwrap();
        std::fs::write(&site, r#"{"language": "fr", "active_plugins": "Sample"}"#).unwrap();

        let config = Configuration::from_files(&system, &site).unwrap();
        assert_eq!(config.language, "fr");
        assert!(config.show_errors);
        assert_eq!(config.active_plugin_ids(), vec!["Sample"]);
        assert_eq!(config.site_url, "/");
    }

    #[test]
    fn test_missing_files_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Configuration::from_files(
            &dir.path().join("nope.json"),
            &dir.path().join("nope2.json"),
        )
        .unwrap();
        assert_eq!(config, Configuration::default());
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let system = dir.path().join("system.json");
        std::fs::write(&system, "{ language: ").unwrap();

        let err = Configuration::from_files(&system, &dir.path().join("x.json")).unwrap_err();
        assert_eq!(err.code(), "E_CONFIG");
    }

    #[test]
    fn test_active_plugin_ids_are_trimmed() {
        let config = Configuration::from_json(r#"{"active_plugins": " Sample, Other ,,"}"#).unwrap();
        assert_eq!(config.active_plugin_ids(), vec!["Sample", "Other"]);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(Configuration::from_json(r#"{"lang": "es"}"#).is_err());
    }
}
