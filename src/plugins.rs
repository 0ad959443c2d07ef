//! Plugin discovery and action/filter dispatch
//!
//! A plugin lives in `Humm/Plugins/<Name>/` next to a `<Name>.plugin` marker
//! file. It is loaded when its name is in the configured allow-list and an
//! implementation was registered under the same name in [`PluginFactories`].
//!
//! Loaded plugins are ordered by [`Plugin::priority`], highest first. Plugins
//! sharing a priority keep their discovery order. Every action and filter is
//! dispatched in that order.
//!
//! # Example
//!
//! ```ignore
//! use humm::plugins::{FilterArguments, FilterContent, Plugin, PluginFactories, PluginFilter};
//!
//! struct Footer;
//!
//! impl Plugin for Footer {
//!     fn apply_filter<'a>(
//!         &mut self,
//!         arguments: &FilterArguments,
//!         content: FilterContent<'a>,
//!     ) -> FilterContent<'a> {
//!         match (arguments.filter, content) {
//!             (PluginFilter::BufferOutput, FilterContent::Bytes(mut bytes)) => {
//!                 bytes.extend_from_slice(b"<!-- served by humm -->");
//!                 FilterContent::Bytes(bytes)
//!             }
//!             (_, content) => content,
//!         }
//!     }
//! }
//!
//! let mut factories = PluginFactories::new();
//! factories.register("Footer", || Box::new(Footer));
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::Configuration;
use crate::languages::{DEFAULT_DOMAIN, Languages};
use crate::paths::{self, SitePaths};
use crate::template::HtmlTemplate;

/// Dispatch priorities; higher values run first
pub mod priority {
    pub const LOWER: i32 = 3001;
    pub const LOW: i32 = 3002;
    pub const NORMAL: i32 = 3003;
    pub const HIGHER: i32 = 3004;
    pub const HIGHEST: i32 = 3005;
    pub const CRITICAL: i32 = 3006;
}

/// Notification points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PluginAction {
    /// Every plugin has been loaded
    PluginsLoaded,
    /// Plugins may verify their requirements
    CheckRequirements,
    /// A database connection is available
    DatabaseConnected,
    /// The request is finishing; always fired
    ScriptShutdown,
}

/// Content transformation points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PluginFilter {
    /// Outbound SQL text, bound parameters in the bundle
    DatabaseSql,
    /// The populated template, modified in place
    ViewTemplate,
    /// The complete response body
    BufferOutput,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActionArguments {
    pub action: PluginAction,
    pub bundle: Value,
}

impl ActionArguments {
    pub fn new(action: PluginAction) -> Self {
        ActionArguments {
            action,
            bundle: Value::Null,
        }
    }

    pub fn with_bundle(action: PluginAction, bundle: Value) -> Self {
        ActionArguments { action, bundle }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterArguments {
    pub filter: PluginFilter,
    pub bundle: Value,
}

impl FilterArguments {
    pub fn new(filter: PluginFilter) -> Self {
        FilterArguments {
            filter,
            bundle: Value::Null,
        }
    }

    pub fn with_bundle(filter: PluginFilter, bundle: Value) -> Self {
        FilterArguments { filter, bundle }
    }
}

/// Value travelling through a filter pipeline
#[derive(Debug)]
pub enum FilterContent<'a> {
    Text(String),
    Bytes(Vec<u8>),
    Template(&'a mut HtmlTemplate),
}

impl<'a> FilterContent<'a> {
    pub fn into_text(self) -> Option<String> {
        match self {
            FilterContent::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            FilterContent::Bytes(bytes) => Some(bytes),
            FilterContent::Text(text) => Some(text.into_bytes()),
            FilterContent::Template(_) => None,
        }
    }
}

/// Extension unit hooked into the request lifecycle
///
/// Every method has a default, so plugins implement only what they need.
pub trait Plugin {
    fn priority(&self) -> i32 {
        priority::LOWER
    }

    fn exec_action(&mut self, _arguments: &ActionArguments) {}

    /// Transform `content`; filters a plugin does not handle must return it unchanged
    fn apply_filter<'a>(
        &mut self,
        _arguments: &FilterArguments,
        content: FilterContent<'a>,
    ) -> FilterContent<'a> {
        content
    }
}

type PluginFactory = Arc<dyn Fn() -> Box<dyn Plugin> + Send + Sync>;

/// Compiled-in plugin implementations, by plugin name
#[derive(Clone, Default)]
pub struct PluginFactories {
    factories: HashMap<String, PluginFactory>,
}

impl PluginFactories {
    pub fn new() -> Self {
        PluginFactories::default()
    }

    pub fn register<F>(&mut self, name: &str, factory: F) -> &mut Self
    where
        F: Fn() -> Box<dyn Plugin> + Send + Sync + 'static,
    {
        self.factories.insert(name.to_string(), Arc::new(factory));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn create(&self, name: &str) -> Option<Box<dyn Plugin>> {
        self.factories.get(name).map(|factory| factory())
    }
}

impl fmt::Debug for PluginFactories {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.factories.keys().collect();
        names.sort();
        f.debug_struct("PluginFactories").field("names", &names).finish()
    }
}

/// An instantiated plugin and where it lives
pub struct LoadedPlugin {
    pub name: String,
    pub root_dir: PathBuf,
    pub plugin: Box<dyn Plugin>,
}

impl LoadedPlugin {
    pub fn new(name: impl Into<String>, root_dir: impl Into<PathBuf>, plugin: Box<dyn Plugin>) -> Self {
        LoadedPlugin {
            name: name.into(),
            root_dir: root_dir.into(),
            plugin,
        }
    }

    pub fn views_dir(&self) -> PathBuf {
        paths::plugin_views(&self.root_dir)
    }

    pub fn locale_dir(&self) -> PathBuf {
        paths::plugin_locale(&self.root_dir)
    }
}

impl fmt::Debug for LoadedPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedPlugin")
            .field("name", &self.name)
            .field("root_dir", &self.root_dir)
            .field("priority", &self.plugin.priority())
            .finish()
    }
}

/// Ordered plugins of one request
#[derive(Debug, Default)]
pub struct PluginRegistry {
    plugins: Vec<LoadedPlugin>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        PluginRegistry::default()
    }

    /// Discover, instantiate and order the active plugins of a site
    ///
    /// Each plugin's catalog for the current language is loaded into the
    /// default text domain as it is instantiated. `PluginsLoaded` is
    /// dispatched once the registry is complete.
    ///
    /// # Arguments
    /// * `paths` - Installation layout
    /// * `config` - Source of the plugin allow-list
    /// * `factories` - Registered implementations
    /// * `languages` - Catalog receiving plugin translations
    pub fn load(
        paths: &SitePaths,
        config: &Configuration,
        factories: &PluginFactories,
        languages: &mut Languages,
    ) -> Self {
        let active = config.active_plugin_ids();
        if active.is_empty() {
            return PluginRegistry::new();
        }

        let mut discovered = Vec::new();
        for (name, root_dir) in plugin_dirs(&paths.plugins(), &active) {
            let Some(plugin) = factories.create(&name) else {
                debug!(plugin = %name, "No implementation registered, skipping");
                continue;
            };
            let loaded = LoadedPlugin::new(name, root_dir, plugin);
            let catalog = languages.text_domain_file(&loaded.locale_dir());
            languages.load_text_domain(&catalog, DEFAULT_DOMAIN);
            discovered.push(loaded);
        }

        let registry = Self::assemble(discovered);
        info!(plugins = ?registry.names(), "Plugins loaded");
        registry
    }

    /// Order `plugins` by priority and notify them with `PluginsLoaded`
    ///
    /// `plugins` must be in discovery order.
    pub fn assemble(plugins: Vec<LoadedPlugin>) -> Self {
        let mut buckets: BTreeMap<i32, Vec<LoadedPlugin>> = BTreeMap::new();
        for loaded in plugins {
            buckets
                .entry(loaded.plugin.priority())
                .or_default()
                .push(loaded);
        }

        let mut registry = PluginRegistry {
            plugins: buckets.into_values().rev().flatten().collect(),
        };
        registry.exec_simple_action(PluginAction::PluginsLoaded);
        registry
    }

    pub fn plugins(&self) -> &[LoadedPlugin] {
        &self.plugins
    }

    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn exec_action(&mut self, arguments: &ActionArguments) {
        for loaded in &mut self.plugins {
            loaded.plugin.exec_action(arguments);
        }
    }

    pub fn exec_simple_action(&mut self, action: PluginAction) {
        self.exec_action(&ActionArguments::new(action));
    }

    /// Pass `content` through every plugin, each receiving the previous result
    pub fn apply_filter<'a>(
        &mut self,
        arguments: &FilterArguments,
        content: FilterContent<'a>,
    ) -> FilterContent<'a> {
        let mut content = content;
        for loaded in &mut self.plugins {
            content = loaded.plugin.apply_filter(arguments, content);
        }
        content
    }

    pub fn apply_simple_filter<'a>(
        &mut self,
        filter: PluginFilter,
        content: FilterContent<'a>,
    ) -> FilterContent<'a> {
        self.apply_filter(&FilterArguments::new(filter), content)
    }
}

/// Active plugin directories with a marker file, sorted by name
fn plugin_dirs(plugins_dir: &Path, active: &[&str]) -> Vec<(String, PathBuf)> {
    let Ok(entries) = fs::read_dir(plugins_dir) else {
        debug!(path = %plugins_dir.display(), "No plugins directory");
        return Vec::new();
    };

    let mut dirs: Vec<(String, PathBuf)> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .filter_map(|path| {
            let name = path.file_name()?.to_str()?.to_string();
            Some((name, path))
        })
        .filter(|(name, _)| active.contains(&name.as_str()))
        .filter(|(name, path)| paths::plugin_marker(path, name).is_file())
        .collect();
    dirs.sort_by(|a, b| a.0.cmp(&b.0));
    dirs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::languages::LocaleDirs;
    use crate::session::MemorySession;
    use crate::testing::{Fixture, write_catalog};
    use std::sync::Mutex;

    type Log = Arc<Mutex<Vec<String>>>;

    struct Recorder {
        name: String,
        priority: i32,
        log: Log,
    }

    impl Plugin for Recorder {
        fn priority(&self) -> i32 {
            self.priority
        }

        fn exec_action(&mut self, arguments: &ActionArguments) {
            self.log
                .lock()
                .unwrap()
                .push(format!("{}:{:?}", self.name, arguments.action));
        }

        fn apply_filter<'a>(
            &mut self,
            arguments: &FilterArguments,
            content: FilterContent<'a>,
        ) -> FilterContent<'a> {
            match (arguments.filter, content) {
                (PluginFilter::BufferOutput, FilterContent::Text(mut text)) => {
                    text.push_str(&self.name);
                    FilterContent::Text(text)
                }
                (PluginFilter::ViewTemplate, FilterContent::Template(template)) => {
                    template.set(&self.name, true);
                    FilterContent::Template(template)
                }
                (_, content) => content,
            }
        }
    }

    /// Uses every default hook
    struct Silent;

    impl Plugin for Silent {}

    fn recorder(name: &str, priority: i32, log: &Log) -> LoadedPlugin {
        LoadedPlugin::new(
            name,
            format!("/plugins/{}", name),
            Box::new(Recorder {
                name: name.to_string(),
                priority,
                log: log.clone(),
            }),
        )
    }

    #[test]
    fn test_priority_buckets_descending_and_stable() {
        let log = Log::default();
        let registry = PluginRegistry::assemble(vec![
            recorder("p0", 3, &log),
            recorder("p1", 1, &log),
            recorder("p2", 3, &log),
            recorder("p3", 2, &log),
        ]);

        assert_eq!(registry.names(), vec!["p0", "p2", "p3", "p1"]);
    }

    #[test]
    fn test_plugins_loaded_sent_after_assembly() {
        let log = Log::default();
        let registry = PluginRegistry::assemble(vec![recorder("a", 1, &log), recorder("b", 2, &log)]);

        assert_eq!(registry.len(), 2);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["b:PluginsLoaded".to_string(), "a:PluginsLoaded".to_string()]
        );
    }

    #[test]
    fn test_actions_reach_every_plugin_in_order() {
        let log = Log::default();
        let mut registry = PluginRegistry::assemble(vec![
            recorder("low", priority::LOW, &log),
            recorder("critical", priority::CRITICAL, &log),
        ]);
        log.lock().unwrap().clear();

        registry.exec_action(&ActionArguments::with_bundle(
            PluginAction::ScriptShutdown,
            serde_json::json!({"status": 200}),
        ));
        assert_eq!(
            *log.lock().unwrap(),
            vec!["critical:ScriptShutdown".to_string(), "low:ScriptShutdown".to_string()]
        );
    }

    #[test]
    fn test_filter_pipeline_follows_dispatch_order() {
        let log = Log::default();
        let mut registry = PluginRegistry::assemble(vec![
            recorder("a", 1, &log),
            recorder("b", 3, &log),
            recorder("c", 2, &log),
        ]);

        let output = registry
            .apply_simple_filter(PluginFilter::BufferOutput, FilterContent::Text(">".to_string()))
            .into_text()
            .unwrap();
        assert_eq!(output, ">bca");
    }

    #[test]
    fn test_unhandled_filters_pass_content_through() {
        let log = Log::default();
        let mut registry = PluginRegistry::assemble(vec![
            recorder("a", 1, &log),
            LoadedPlugin::new("silent", "/plugins/silent", Box::new(Silent)),
        ]);

        let sql = registry
            .apply_filter(
                &FilterArguments::with_bundle(PluginFilter::DatabaseSql, serde_json::json!([1])),
                FilterContent::Text("SELECT 1".to_string()),
            )
            .into_text();
        assert_eq!(sql.as_deref(), Some("SELECT 1"));
    }

    #[test]
    fn test_template_filter_mutates_in_place() {
        let log = Log::default();
        let mut registry = PluginRegistry::assemble(vec![recorder("a", 1, &log), recorder("b", 1, &log)]);
        let mut template = HtmlTemplate::new();

        registry.apply_simple_filter(PluginFilter::ViewTemplate, FilterContent::Template(&mut template));
        assert!(template.contains("a"));
        assert!(template.contains("b"));
    }

    #[test]
    fn test_default_priority_is_lower() {
        assert_eq!(Silent.priority(), priority::LOWER);
    }

    #[test]
    fn test_load_respects_allow_list_marker_and_factories() {
        let fixture = Fixture::new();
        let sample = fixture.plugin("Sample");
        fixture.plugin("Inactive");
        fixture.plugin("Unregistered");
        // Directory without a marker file
        std::fs::create_dir_all(fixture.paths.plugins().join("NoMarker")).unwrap();
        write_catalog(&sample.join("Locale"), "en", "nplurals=2; plural=n != 1;", &[("Plugin text", "Sample text")]);

        let log = Log::default();
        let mut factories = PluginFactories::new();
        for name in ["Sample", "Inactive", "NoMarker"] {
            let log = log.clone();
            factories.register(name, move || {
                Box::new(Recorder {
                    name: name.to_string(),
                    priority: priority::NORMAL,
                    log: log.clone(),
                })
            });
        }

        let config = Configuration::from_json(r#"{"active_plugins": "Sample,Unregistered,NoMarker"}"#).unwrap();
        let mut languages = Languages::init(
            LocaleDirs::from_paths(&fixture.paths),
            "en",
            Box::new(MemorySession::new()),
        );

        let registry = PluginRegistry::load(&fixture.paths, &config, &factories, &mut languages);

        assert_eq!(registry.names(), vec!["Sample"]);
        assert_eq!(registry.plugins()[0].root_dir, sample);
        assert_eq!(registry.plugins()[0].views_dir(), sample.join("Views"));
        assert_eq!(languages.translate("Plugin text", DEFAULT_DOMAIN), "Sample text");
        assert_eq!(*log.lock().unwrap(), vec!["Sample:PluginsLoaded".to_string()]);
    }

    #[test]
    fn test_empty_allow_list_loads_nothing() {
        let fixture = Fixture::new();
        fixture.plugin("Sample");
        let mut factories = PluginFactories::new();
        factories.register("Sample", || Box::new(Silent));
        let mut languages = Languages::init(
            LocaleDirs::from_paths(&fixture.paths),
            "en",
            Box::new(MemorySession::new()),
        );

        let registry =
            PluginRegistry::load(&fixture.paths, &Configuration::default(), &factories, &mut languages);
        assert!(registry.is_empty());
    }
}
