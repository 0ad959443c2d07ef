//! Request-to-view resolution
//!
//! The URL `/forum/section/12` is tried as the views `ForumSection12`,
//! `ForumSection` and `Forum`, longest first. The first one that is a known
//! view with an existing file wins. Otherwise the first segment alone, then
//! `Home`, then the built-in `SystemHome` view is used.

use tracing::debug;

use crate::paths::{self, SitePaths};
use crate::plugins::PluginRegistry;
use crate::template::directory_views;
use crate::url::UrlArguments;

/// Home view of a site
pub const SITE_HOME_VIEW: &str = "Home";

/// View rendered when a site has nothing to show
pub const SYSTEM_HOME_VIEW: &str = "SystemHome";

/// View rendered after faults
pub const SYSTEM_ERROR_VIEW: &str = "SystemError";

/// Answers whether a renderable file exists for a view name
pub trait ViewOracle {
    fn view_file_exists(&self, name: &str) -> bool;
}

/// Upper-case the first character
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn strip_separators(segment: &str) -> String {
    segment.replace(['-', '_'], "")
}

fn is_query_segment(segment: &str) -> bool {
    segment.starts_with('?') || segment.starts_with('&')
}

/// Known view names of one request
#[derive(Debug, Clone, Default)]
pub struct ViewResolver {
    main_views: Vec<String>,
}

impl ViewResolver {
    /// Collect view names from the shared, site, system and plugin view
    /// directories, in that order
    pub fn new(paths: &SitePaths, plugins: &PluginRegistry) -> Self {
        let mut dirs = vec![paths.shared_views(), paths.site_views(), paths.system_views()];
        dirs.extend(
            plugins
                .plugins()
                .iter()
                .map(|plugin| paths::plugin_views(&plugin.root_dir)),
        );

        Self::from_views(dirs.iter().flat_map(|dir| directory_views(dir)))
    }

    /// Resolver over explicit view names; duplicates keep their first position
    pub fn from_views<I, S>(views: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut main_views: Vec<String> = Vec::new();
        for view in views {
            let view = view.into();
            if !main_views.contains(&view) {
                main_views.push(view);
            }
        }
        ViewResolver { main_views }
    }

    pub fn main_views(&self) -> &[String] {
        &self.main_views
    }

    /// Whether the capitalized `name` is a known view
    pub fn is_main_view(&self, name: &str) -> bool {
        let name = capitalize(name);
        self.main_views.iter().any(|view| *view == name)
    }

    fn is_renderable(&self, name: &str, oracle: &dyn ViewOracle) -> bool {
        self.is_main_view(name) && oracle.view_file_exists(name)
    }

    /// View to render for `arguments`
    pub fn resolve(&self, arguments: &UrlArguments, oracle: &dyn ViewOracle) -> String {
        let mut view = self.deep_view(arguments, oracle);

        if !self.is_renderable(&view, oracle) {
            let first = strip_separators(arguments.get(0).unwrap_or_default());
            if self.is_renderable(&first, oracle) {
                view = first;
            } else if self.is_renderable(SITE_HOME_VIEW, oracle) {
                view = SITE_HOME_VIEW.to_string();
            }
        }

        if view.is_empty() {
            view = SYSTEM_HOME_VIEW.to_string();
        }

        let view = capitalize(&view);
        debug!(view = %view, arguments = ?arguments.all(), "Resolved view");
        view
    }

    /// Longest renderable concatenation of the leading segments
    fn deep_view(&self, arguments: &UrlArguments, oracle: &dyn ViewOracle) -> String {
        let mut current = String::new();
        let mut candidates: Vec<String> = Vec::new();

        for segment in arguments.all() {
            if !is_query_segment(segment) {
                current.push_str(&capitalize(&strip_separators(segment)));
            }
            if !candidates.contains(&current) {
                candidates.push(current.clone());
            }
        }

        candidates
            .into_iter()
            .rev()
            .find(|candidate| self.is_renderable(candidate, oracle))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct Files(HashSet<String>);

    impl Files {
        fn new(names: &[&str]) -> Self {
            Files(names.iter().map(|n| n.to_string()).collect())
        }
    }

    impl ViewOracle for Files {
        fn view_file_exists(&self, name: &str) -> bool {
            self.0.contains(&capitalize(name))
        }
    }

    fn resolve(views: &[&str], files: &[&str], segments: &[&str]) -> String {
        let resolver = ViewResolver::from_views(views.iter().copied());
        resolver.resolve(&UrlArguments::from_segments(segments.iter().copied()), &Files::new(files))
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("forum"), "Forum");
        assert_eq!(capitalize("Forum"), "Forum");
        assert_eq!(capitalize("ágora"), "Ágora");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_deep_view_prefers_longest_existing() {
        let views = ["Forum", "ForumSection", "SystemHome"];
        assert_eq!(resolve(&views, &views, &["forum", "section", "12"]), "ForumSection");
        assert_eq!(resolve(&views, &views, &["forum", "other"]), "Forum");
    }

    #[test]
    fn test_empty_url_uses_system_home() {
        assert_eq!(resolve(&["About"], &["About"], &[]), SYSTEM_HOME_VIEW);
    }

    #[test]
    fn test_unknown_view_without_home_uses_system_home() {
        assert_eq!(resolve(&["About"], &["About"], &["missing"]), SYSTEM_HOME_VIEW);
    }

    #[test]
    fn test_unknown_view_falls_back_to_home() {
        let views = ["Home", "About"];
        assert_eq!(resolve(&views, &views, &["missing"]), "Home");
        assert_eq!(resolve(&views, &views, &[]), "Home");
    }

    #[test]
    fn test_single_segment_view() {
        let views = ["Home", "Contact"];
        assert_eq!(resolve(&views, &views, &["Contact"]), "Contact");
        assert_eq!(resolve(&views, &views, &["contact"]), "Contact");
    }

    #[test]
    fn test_separators_are_stripped() {
        let views = ["Contactus", "AboutTheteam"];
        assert_eq!(resolve(&views, &views, &["contact-us"]), "Contactus");
        assert_eq!(resolve(&views, &views, &["about", "the_team"]), "AboutTheteam");

        // Only the first letter of each segment is raised
        let camel = ["ContactUs"];
        assert_eq!(resolve(&camel, &camel, &["contact-us"]), SYSTEM_HOME_VIEW);
    }

    #[test]
    fn test_query_segments_do_not_extend_views() {
        let views = ["Home", "About"];
        assert_eq!(resolve(&views, &views, &["about", "?lang=es"]), "About");
        assert_eq!(resolve(&views, &views, &["?lang=es"]), "Home");
    }

    #[test]
    fn test_names_need_both_membership_and_file() {
        // Known name without a file
        assert_eq!(resolve(&["Home", "Contact"], &["Home"], &["contact"]), "Home");
        // File without being a known name
        assert_eq!(resolve(&["Home"], &["Home", "Contact"], &["contact"]), "Home");
    }

    #[test]
    fn test_candidate_set_keeps_first_seen_order() {
        let resolver = ViewResolver::from_views(["Home", "About", "Home", "Forum"]);
        assert_eq!(resolver.main_views(), &["Home", "About", "Forum"]);
        assert!(resolver.is_main_view("about"));
        assert!(!resolver.is_main_view("Contact"));
    }
}
