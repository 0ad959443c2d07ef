//! Demo plugin and controllers served by the bundled `www/` site

use crate::bootstrap::Bootstrap;
use crate::controller::{HummView, ViewContext, site_shared_class, site_view_class};
use crate::paths::MAIN_SITE;
use crate::plugins::{
    ActionArguments, FilterArguments, FilterContent, Plugin, PluginAction, PluginFilter,
};
use crate::template::HtmlTemplate;

pub const SAMPLE_PLUGIN: &str = "Sample";

/// Plugin that listens to every hook and changes nothing
#[derive(Debug, Default)]
pub struct SamplePlugin;

impl Plugin for SamplePlugin {
    fn exec_action(&mut self, arguments: &ActionArguments) {
        match arguments.action {
            PluginAction::PluginsLoaded => {}
            PluginAction::CheckRequirements => {}
            PluginAction::DatabaseConnected => {}
            PluginAction::ScriptShutdown => {}
        }
    }

    fn apply_filter<'a>(
        &mut self,
        arguments: &FilterArguments,
        content: FilterContent<'a>,
    ) -> FilterContent<'a> {
        match arguments.filter {
            PluginFilter::DatabaseSql => {}
            PluginFilter::ViewTemplate => {}
            PluginFilter::BufferOutput => {}
        }
        // Filtered or not
        content
    }
}

#[derive(Debug, Default)]
pub struct HomeView;

impl HummView for HomeView {
    fn prepare(&mut self, template: &mut HtmlTemplate, context: &mut ViewContext<'_>) {
        template.set("headerTitle", context.languages.translator().t("Welcome!"));
    }
}

#[derive(Debug, Default)]
pub struct AboutView;

impl HummView for AboutView {
    fn prepare(&mut self, template: &mut HtmlTemplate, context: &mut ViewContext<'_>) {
        template.set("headerTitle", context.languages.translator().t("About!"));
    }
}

/// Switches to the language named by the second URL argument
#[derive(Debug, Default)]
pub struct LanguageView;

impl HummView for LanguageView {
    fn prepare(&mut self, template: &mut HtmlTemplate, context: &mut ViewContext<'_>) {
        if let Some(code) = context.arguments.get(1) {
            if !context.languages.set_current_language(code) {
                template.set("unknownLanguage", code);
            }
        }
        template.set("siteLanguage", context.languages.get_current_language());
        template.set("headerTitle", context.languages.translator().t("Language"));
    }
}

/// Site-wide values for every view of the main site
#[derive(Debug, Default)]
pub struct MainSharedView;

impl HummView for MainSharedView {
    fn prepare(&mut self, template: &mut HtmlTemplate, context: &mut ViewContext<'_>) {
        let translator = context.languages.translator();
        template.set("siteName", translator.t("Humm demo site"));
        template.set("languageCount", context.languages.languages().len());
    }
}

/// Register the demo plugin and the main site controllers
pub fn register(bootstrap: &mut Bootstrap) {
    bootstrap
        .plugins_mut()
        .register(SAMPLE_PLUGIN, || Box::new(SamplePlugin));
    bootstrap
        .controllers_mut()
        .register(&site_shared_class(MAIN_SITE), || Box::new(MainSharedView))
        .register(&site_view_class(MAIN_SITE, "Home"), || Box::new(HomeView))
        .register(&site_view_class(MAIN_SITE, "About"), || Box::new(AboutView))
        .register(&site_view_class(MAIN_SITE, "Language"), || Box::new(LanguageView));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::Request;
    use crate::testing::{Fixture, write_catalog, write_file};

    fn demo_site() -> Fixture {
        let fixture = Fixture::new();
        let paths = &fixture.paths;
        fixture.view(&paths.site_views(), "Home", "{{ siteName }}: {{ headerTitle }}");
        fixture.view(&paths.site_views(), "About", "{{ headerTitle }}");
        fixture.view(&paths.site_views(), "Language", "{{ siteLanguage }}{{ unknownLanguage }}");
        fixture.plugin(SAMPLE_PLUGIN);
        write_file(&paths.site_config_file(), r#"{"active_plugins": "Sample"}"#);
        fixture
    }

    #[test]
    fn test_demo_pages() {
        let fixture = demo_site();
        let mut bootstrap = Bootstrap::new(fixture.dir.path());
        register(&mut bootstrap);

        let home = bootstrap.handle(Request::new("/"));
        assert_eq!(home.status, 200);
        assert_eq!(home.body_text(), "Humm demo site: Welcome!");

        let about = bootstrap.handle(Request::new("/about"));
        assert_eq!(about.body_text(), "About!");
    }

    #[test]
    fn test_language_page_switches_language() {
        let fixture = demo_site();
        write_catalog(
            &fixture.paths.site_locale(),
            "es",
            "nplurals=2; plural=n != 1;",
            &[("Welcome!", "¡Bienvenido!")],
        );
        let mut bootstrap = Bootstrap::new(fixture.dir.path());
        register(&mut bootstrap);

        let switched = bootstrap.handle(Request::new("/language/es"));
        assert_eq!(switched.body_text(), "es");

        let home = bootstrap.handle(Request::new("/").with_session(switched.session));
        assert_eq!(home.body_text(), "Humm demo site: ¡Bienvenido!");

        let unknown = bootstrap.handle(Request::new("/language/xx"));
        assert_eq!(unknown.body_text(), "enxx");
    }

    #[test]
    fn test_sample_plugin_leaves_content_alone() {
        let mut plugin = SamplePlugin;
        let content = plugin.apply_filter(
            &FilterArguments::new(PluginFilter::BufferOutput),
            FilterContent::Text("body".to_string()),
        );
        assert_eq!(content.into_text().as_deref(), Some("body"));
    }
}
