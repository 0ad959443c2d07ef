//! Directory layout of a Humm installation
//!
//! ```text
//! <root>/Humm/
//!   Plugins/<Name>/{<Name>.plugin, Views/, Locale/}
//!   System/{Config, Locale, Views, Views/Helpers}
//!   Sites/<Site>/{Config, Locale, Views, Views/Helpers}
//!   Sites/Shared/{Locale, Views, Views/Helpers}
//! ```

use std::path::{Path, PathBuf};

pub const HUMM: &str = "Humm";
pub const PLUGINS: &str = "Plugins";
pub const SYSTEM: &str = "System";
pub const SITES: &str = "Sites";
pub const SHARED: &str = "Shared";
pub const MAIN_SITE: &str = "Main";
pub const CONFIG: &str = "Config";
pub const LOCALE: &str = "Locale";
pub const VIEWS: &str = "Views";
pub const HELPERS: &str = "Helpers";

pub const CONFIG_FILE: &str = "config.json";
pub const MO_EXTENSION: &str = "mo";
pub const PLUGIN_MARKER_EXTENSION: &str = "plugin";

/// Resolved directories for one site of an installation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitePaths {
    root: PathBuf,
    site: String,
}

impl SitePaths {
    pub fn new(root: impl Into<PathBuf>, site: impl Into<String>) -> Self {
        SitePaths {
            root: root.into(),
            site: site.into(),
        }
    }

    /// `Humm/` below an installation root, usable before a site is known
    pub fn humm_dir(root: &Path) -> PathBuf {
        root.join(HUMM)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn site_name(&self) -> &str {
        &self.site
    }

    pub fn humm(&self) -> PathBuf {
        Self::humm_dir(&self.root)
    }

    pub fn plugins(&self) -> PathBuf {
        self.humm().join(PLUGINS)
    }

    pub fn system(&self) -> PathBuf {
        self.humm().join(SYSTEM)
    }

    pub fn system_config(&self) -> PathBuf {
        self.system().join(CONFIG)
    }

    pub fn system_locale(&self) -> PathBuf {
        self.system().join(LOCALE)
    }

    pub fn system_views(&self) -> PathBuf {
        self.system().join(VIEWS)
    }

    pub fn system_views_helpers(&self) -> PathBuf {
        self.system_views().join(HELPERS)
    }

    pub fn site(&self) -> PathBuf {
        self.humm().join(SITES).join(&self.site)
    }

    pub fn site_config(&self) -> PathBuf {
        self.site().join(CONFIG)
    }

    pub fn site_locale(&self) -> PathBuf {
        self.site().join(LOCALE)
    }

    pub fn site_views(&self) -> PathBuf {
        self.site().join(VIEWS)
    }

    pub fn site_views_helpers(&self) -> PathBuf {
        self.site_views().join(HELPERS)
    }

    pub fn shared(&self) -> PathBuf {
        self.humm().join(SITES).join(SHARED)
    }

    pub fn shared_locale(&self) -> PathBuf {
        self.shared().join(LOCALE)
    }

    pub fn shared_views(&self) -> PathBuf {
        self.shared().join(VIEWS)
    }

    pub fn shared_views_helpers(&self) -> PathBuf {
        self.shared_views().join(HELPERS)
    }

    pub fn system_config_file(&self) -> PathBuf {
        self.system_config().join(CONFIG_FILE)
    }

    pub fn site_config_file(&self) -> PathBuf {
        self.site_config().join(CONFIG_FILE)
    }
}

/// `<locale_dir>/<lang>/<lang>.mo`
pub fn text_domain_file(locale_dir: &Path, lang: &str) -> PathBuf {
    locale_dir
        .join(lang)
        .join(format!("{}.{}", lang, MO_EXTENSION))
}

pub fn plugin_views(plugin_root: &Path) -> PathBuf {
    plugin_root.join(VIEWS)
}

pub fn plugin_locale(plugin_root: &Path) -> PathBuf {
    plugin_root.join(LOCALE)
}

/// `<plugin_root>/<Name>.plugin`
pub fn plugin_marker(plugin_root: &Path, name: &str) -> PathBuf {
    plugin_root.join(format!("{}.{}", name, PLUGIN_MARKER_EXTENSION))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_layout() {
        let paths = SitePaths::new("/srv/www", "Example");
        assert_eq!(paths.site_views(), PathBuf::from("/srv/www/Humm/Sites/Example/Views"));
        assert_eq!(
            paths.shared_views_helpers(),
            PathBuf::from("/srv/www/Humm/Sites/Shared/Views/Helpers")
        );
        assert_eq!(paths.system_locale(), PathBuf::from("/srv/www/Humm/System/Locale"));
        assert_eq!(
            paths.site_config_file(),
            PathBuf::from("/srv/www/Humm/Sites/Example/Config/config.json")
        );
    }

    #[test]
    fn test_text_domain_file() {
        assert_eq!(
            text_domain_file(Path::new("/x/Locale"), "es"),
            PathBuf::from("/x/Locale/es/es.mo")
        );
    }

    #[test]
    fn test_plugin_marker() {
        let root = Path::new("/x/Humm/Plugins/Sample");
        assert_eq!(plugin_marker(root, "Sample"), root.join("Sample.plugin"));
        assert_eq!(plugin_locale(root), root.join("Locale"));
    }
}
