//! Request lifecycle
//!
//! Every request gets its own context, built in this order: paths, fault
//! collection, site, version, URL arguments, configuration, languages,
//! plugins, requirements check, view dispatch and shutdown.
//!
//! The rendered view is captured in a buffer. On success the buffer goes
//! through the `BufferOutput` filter once before it is returned. When any
//! stage faulted the buffer is discarded and the `SystemError` view is
//! rendered instead. `ScriptShutdown` is dispatched either way.

use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use tracing::{error, info};

use crate::config::Configuration;
use crate::controller::{ControllerRegistry, ViewContext, system_view_class};
use crate::error::HummResult;
use crate::faults::{ErrorHandler, ErrorInfo};
use crate::languages::{Languages, LocaleDirs};
use crate::paths::SitePaths;
use crate::plugins::{FilterContent, PluginAction, PluginFactories, PluginFilter, PluginRegistry};
use crate::session::{MemorySession, SessionStore};
use crate::sites;
use crate::template::HtmlTemplate;
use crate::url::UrlArguments;
use crate::views::{SYSTEM_ERROR_VIEW, ViewResolver};

const FALLBACK_ERROR_BODY: &str = "Internal Server Error";

/// An incoming request
pub struct Request {
    pub uri: String,
    pub host: String,
    /// URL path the installation is mounted under
    pub base_path: String,
    pub session: Box<dyn SessionStore>,
}

impl Request {
    pub fn new(uri: impl Into<String>) -> Self {
        Request {
            uri: uri.into(),
            host: "localhost".to_string(),
            base_path: "/".to_string(),
            session: Box::new(MemorySession::new()),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    pub fn with_session(mut self, session: Box<dyn SessionStore>) -> Self {
        self.session = session;
        self
    }
}

/// Outcome of a request
pub struct Response {
    pub status: u16,
    /// View that produced the body
    pub view: String,
    pub body: Vec<u8>,
    pub faults: Vec<ErrorInfo>,
    /// The request's session, possibly modified
    pub session: Box<dyn SessionStore>,
}

impl Response {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Borrowed per-request state shared by the dispatch helpers
struct RequestScope<'a> {
    paths: &'a SitePaths,
    config: &'a Configuration,
    arguments: &'a UrlArguments,
    uri: &'a str,
}

/// Entry point of the framework for one installation root
#[derive(Debug, Clone)]
pub struct Bootstrap {
    root: PathBuf,
    plugins: PluginFactories,
    controllers: ControllerRegistry,
}

impl Bootstrap {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Bootstrap {
            root: root.into(),
            plugins: PluginFactories::new(),
            controllers: ControllerRegistry::with_system_views(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn plugins_mut(&mut self) -> &mut PluginFactories {
        &mut self.plugins
    }

    pub fn controllers_mut(&mut self) -> &mut ControllerRegistry {
        &mut self.controllers
    }

    /// Run the whole lifecycle for `request`
    pub fn handle(&self, request: Request) -> Response {
        let Request {
            uri,
            host,
            base_path,
            session,
        } = request;

        let mut faults = ErrorHandler::new();
        let site = sites::resolve_site(&self.root, &host);
        let paths = SitePaths::new(&self.root, site);
        let arguments = UrlArguments::from_uri(&uri, &base_path);

        let config = Configuration::load(&paths).unwrap_or_else(|e| {
            faults.record_error(&e, "configuration");
            Configuration::default()
        });

        let mut languages = Languages::init(LocaleDirs::from_paths(&paths), &config.language, session);

        let mut plugins = faults
            .catch("plugins", || {
                PluginRegistry::load(&paths, &config, &self.plugins, &mut languages)
            })
            .unwrap_or_default();
        faults.catch("requirements", || {
            plugins.exec_simple_action(PluginAction::CheckRequirements)
        });

        let scope = RequestScope {
            paths: &paths,
            config: &config,
            arguments: &arguments,
            uri: &uri,
        };

        let mut buffer = Vec::new();
        let mut view = SYSTEM_ERROR_VIEW.to_string();
        if !faults.has_errors() {
            let dispatched = faults.catch("view dispatch", || {
                self.display_view(&scope, &mut languages, &mut plugins, &mut buffer)
            });
            match dispatched {
                Some(Ok(name)) => view = name,
                Some(Err(e)) => faults.record_error(&e, "view dispatch"),
                None => {}
            }
        }

        // Shutdown
        let failed = faults.has_errors();
        let body = if failed {
            view = SYSTEM_ERROR_VIEW.to_string();
            self.render_fault_view(&scope, &mut languages, &faults)
        } else {
            buffer
        };

        faults.catch("shutdown", || {
            plugins.exec_simple_action(PluginAction::ScriptShutdown)
        });

        let body = if failed {
            body
        } else {
            faults
                .catch("output filter", || {
                    plugins
                        .apply_simple_filter(PluginFilter::BufferOutput, FilterContent::Bytes(body))
                        .into_bytes()
                })
                .flatten()
                .unwrap_or_default()
        };

        let status = if faults.has_errors() { 500 } else { 200 };
        info!(
            uri = %uri,
            site = %paths.site_name(),
            view = %view,
            status = status,
            "Request handled"
        );

        Response {
            status,
            view,
            body,
            faults: faults.into_errors(),
            session: languages.into_session(),
        }
    }

    fn display_view(
        &self,
        scope: &RequestScope<'_>,
        languages: &mut Languages,
        plugins: &mut PluginRegistry,
        out: &mut Vec<u8>,
    ) -> HummResult<String> {
        let paths = scope.paths;
        let mut template = HtmlTemplate::new();
        template.add_views_dirs([
            paths.shared_views(),
            paths.shared_views_helpers(),
            paths.site_views(),
            paths.site_views_helpers(),
            paths.system_views(),
            paths.system_views_helpers(),
        ]);
        template.add_views_dirs(plugins.plugins().iter().map(|plugin| plugin.views_dir()));

        let view = ViewResolver::new(paths, plugins).resolve(scope.arguments, &template);
        set_default_vars(&mut template, &view, scope, languages);

        let mut context = ViewContext {
            paths,
            config: scope.config,
            arguments: scope.arguments,
            languages,
        };
        for mut controller in self.controllers.shared(paths.site_name()) {
            controller.prepare(&mut template, &mut context);
        }
        if let Some(mut controller) = self.controllers.primary(paths.site_name(), &view) {
            controller.prepare(&mut template, &mut context);
        }

        plugins.apply_simple_filter(PluginFilter::ViewTemplate, FilterContent::Template(&mut template));

        template.display_view(&view, out)?;
        Ok(view)
    }

    fn render_fault_view(
        &self,
        scope: &RequestScope<'_>,
        languages: &mut Languages,
        faults: &ErrorHandler,
    ) -> Vec<u8> {
        let mut template = HtmlTemplate::new();
        template.add_views_dirs([scope.paths.system_views(), scope.paths.system_views_helpers()]);
        set_default_vars(&mut template, SYSTEM_ERROR_VIEW, scope, languages);

        if scope.config.show_errors {
            template.set("errors", json!(faults.errors()));
            template.set(
                "errorSummary",
                faults
                    .errors()
                    .iter()
                    .map(ErrorInfo::summary)
                    .collect::<Vec<_>>()
                    .join("\n"),
            );
        } else {
            template.set("errors", Value::Array(Vec::new()));
        }

        if let Some(mut controller) = self.controllers.create(&system_view_class(SYSTEM_ERROR_VIEW)) {
            let mut context = ViewContext {
                paths: scope.paths,
                config: scope.config,
                arguments: scope.arguments,
                languages,
            };
            controller.prepare(&mut template, &mut context);
        }

        let mut body = Vec::new();
        if let Err(e) = template.display_view(SYSTEM_ERROR_VIEW, &mut body) {
            error!(error = %e, "Could not render the error view");
            body.clear();
        }
        if body.is_empty() {
            body.extend_from_slice(FALLBACK_ERROR_BODY.as_bytes());
        }
        body
    }
}

fn set_default_vars(
    template: &mut HtmlTemplate,
    view: &str,
    scope: &RequestScope<'_>,
    languages: &Languages,
) {
    let site_languages: Vec<Value> = languages
        .languages()
        .iter()
        .map(|(code, name)| json!({ "code": code, "name": name }))
        .collect();

    template.assign([
        ("hummVersion", json!(crate::VERSION)),
        ("viewName", json!(view)),
        ("lowerViewName", json!(view.to_lowercase())),
        ("requestUri", json!(scope.uri)),
        ("siteUrl", json!(scope.config.site_url)),
        ("siteLanguage", json!(languages.get_current_language())),
        ("siteLanguages", Value::Array(site_languages)),
        ("siteLanguageDir", json!(languages.current_language_direction().as_str())),
    ]);
}
