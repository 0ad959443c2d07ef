//! View controllers
//!
//! A controller prepares the template before its view renders. Controllers
//! are registered under the path of the class they stand for:
//!
//! | Path                             | Used for                         |
//! |----------------------------------|----------------------------------|
//! | `Sites/Shared/Classes/<View>View`| `<View>` on every site           |
//! | `Sites/<Site>/Classes/<View>View`| `<View>` on one site             |
//! | `System/Classes/<View>View`      | built-in views                   |
//! | `Sites/<Site>/Classes/SharedView`| every view of one site           |
//! | `Sites/Shared/Classes/SharedView`| every view of every site         |
//!
//! A lookup only succeeds for the exact path, so a controller registered for
//! another site is never picked up.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::config::Configuration;
use crate::languages::Languages;
use crate::paths::SitePaths;
use crate::template::HtmlTemplate;
use crate::url::UrlArguments;
use crate::views::{SYSTEM_ERROR_VIEW, SYSTEM_HOME_VIEW};

pub const VIEW_CLASS_SUFFIX: &str = "View";
pub const SHARED_VIEW_CLASS: &str = "SharedView";

const PROJECT_URL: &str = "https://github.com/humm-rs/humm";

/// Request state available to controllers
pub struct ViewContext<'a> {
    pub paths: &'a SitePaths,
    pub config: &'a Configuration,
    pub arguments: &'a UrlArguments,
    pub languages: &'a mut Languages,
}

pub trait HummView {
    fn prepare(&mut self, template: &mut HtmlTemplate, context: &mut ViewContext<'_>);
}

pub fn shared_view_class(view: &str) -> String {
    format!("Sites/Shared/Classes/{}{}", view, VIEW_CLASS_SUFFIX)
}

pub fn site_view_class(site: &str, view: &str) -> String {
    format!("Sites/{}/Classes/{}{}", site, view, VIEW_CLASS_SUFFIX)
}

pub fn system_view_class(view: &str) -> String {
    format!("System/Classes/{}{}", view, VIEW_CLASS_SUFFIX)
}

pub fn site_shared_class(site: &str) -> String {
    format!("Sites/{}/Classes/{}", site, SHARED_VIEW_CLASS)
}

pub fn shared_site_shared_class() -> String {
    format!("Sites/Shared/Classes/{}", SHARED_VIEW_CLASS)
}

type ControllerFactory = Arc<dyn Fn() -> Box<dyn HummView> + Send + Sync>;

/// Controller implementations keyed by class path
#[derive(Clone, Default)]
pub struct ControllerRegistry {
    factories: HashMap<String, ControllerFactory>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        ControllerRegistry::default()
    }

    /// Registry holding the built-in system controllers
    pub fn with_system_views() -> Self {
        let mut registry = ControllerRegistry::new();
        registry
            .register(&system_view_class(SYSTEM_HOME_VIEW), || Box::new(SystemSharedView))
            .register(&system_view_class(SYSTEM_ERROR_VIEW), || Box::new(SystemSharedView));
        registry
    }

    pub fn register<F>(&mut self, class_path: &str, factory: F) -> &mut Self
    where
        F: Fn() -> Box<dyn HummView> + Send + Sync + 'static,
    {
        self.factories.insert(class_path.to_string(), Arc::new(factory));
        self
    }

    pub fn contains(&self, class_path: &str) -> bool {
        self.factories.contains_key(class_path)
    }

    pub fn create(&self, class_path: &str) -> Option<Box<dyn HummView>> {
        self.factories.get(class_path).map(|factory| factory())
    }

    /// Controller for `view`: shared site first, then the site, then system
    pub fn primary(&self, site: &str, view: &str) -> Option<Box<dyn HummView>> {
        [
            shared_view_class(view),
            site_view_class(site, view),
            system_view_class(view),
        ]
        .iter()
        .find_map(|class_path| self.create(class_path))
    }

    /// Site-wide controllers: the site's own, then the shared one
    pub fn shared(&self, site: &str) -> Vec<Box<dyn HummView>> {
        [site_shared_class(site), shared_site_shared_class()]
            .iter()
            .filter_map(|class_path| self.create(class_path))
            .collect()
    }
}

impl fmt::Debug for ControllerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut paths: Vec<&String> = self.factories.keys().collect();
        paths.sort();
        f.debug_struct("ControllerRegistry").field("classes", &paths).finish()
    }
}

/// Controller of the built-in views
#[derive(Debug, Default)]
pub struct SystemSharedView;

impl HummView for SystemSharedView {
    fn prepare(&mut self, template: &mut HtmlTemplate, context: &mut ViewContext<'_>) {
        template.set(
            "hummSiteUrl",
            format!("{}?lang={}", PROJECT_URL, context.languages.get_current_language()),
        );
    }
}
