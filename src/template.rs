//! Variable bag and view file lookup
//!
//! Views are `.html` files found in an ordered list of directories. Rendering
//! replaces `{{ name }}` placeholders with HTML-escaped variable values;
//! `{{{ name }}}` inserts the value unescaped.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::{Map, Value};

use crate::error::{HummError, HummResult};
use crate::views::{ViewOracle, capitalize};

pub const VIEW_FILE_EXTENSION: &str = "html";

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\{\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}\}|\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}",
    )
    .expect("valid placeholder regex")
});

#[derive(Debug, Clone, Default)]
pub struct HtmlTemplate {
    variables: Map<String, Value>,
    views_dirs: Vec<PathBuf>,
}

impl HtmlTemplate {
    pub fn new() -> Self {
        HtmlTemplate::default()
    }

    /// Append a view directory unless it is already registered
    pub fn add_views_dir(&mut self, dir: impl Into<PathBuf>) {
        let dir = dir.into();
        if !self.views_dirs.contains(&dir) {
            self.views_dirs.push(dir);
        }
    }

    pub fn add_views_dirs<I, P>(&mut self, dirs: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        for dir in dirs {
            self.add_views_dir(dir);
        }
    }

    pub fn views_dirs(&self) -> &[PathBuf] {
        &self.views_dirs
    }

    pub fn clear_views_dirs(&mut self) {
        self.views_dirs.clear();
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        self.variables.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Variable as a string slice, if it holds a string
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.variables.get(name).and_then(Value::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.variables.remove(name)
    }

    /// Set several variables at once, overwriting existing ones
    pub fn assign<I, K, V>(&mut self, values: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        for (name, value) in values {
            self.variables.insert(name.into(), value.into());
        }
    }

    pub fn variables(&self) -> &Map<String, Value> {
        &self.variables
    }

    pub fn clear_variables(&mut self) {
        self.variables.clear();
    }

    /// First registered file for `name`, tried as given
    pub fn view_file_path(&self, name: &str) -> Option<PathBuf> {
        let file_name = format!("{}.{}", name, VIEW_FILE_EXTENSION);
        self.views_dirs
            .iter()
            .map(|dir| dir.join(&file_name))
            .find(|path| path.is_file())
    }

    /// Whether a file exists for the capitalized `name`
    pub fn view_file_exists(&self, name: &str) -> bool {
        self.view_file_path(&capitalize(name)).is_some()
    }

    /// Rendered view, or `None` when no file exists for it
    pub fn render(&self, name: &str) -> HummResult<Option<String>> {
        let Some(path) = self.view_file_path(name) else {
            return Ok(None);
        };
        let source = std::fs::read_to_string(&path).map_err(|e| HummError::io(&path, e))?;
        Ok(Some(self.render_str(&source)))
    }

    /// Render `name` into `out`; missing views produce no output
    pub fn display_view(&self, name: &str, out: &mut dyn Write) -> HummResult<()> {
        if let Some(html) = self.render(name)? {
            out.write_all(html.as_bytes())
                .map_err(|e| HummError::View(format!("{}: {}", name, e)))?;
        }
        Ok(())
    }

    /// Substitute placeholders in `source`
    pub fn render_str(&self, source: &str) -> String {
        PLACEHOLDER
            .replace_all(source, |caps: &Captures| {
                let (name, raw) = match (caps.get(1), caps.get(2)) {
                    (Some(name), _) => (name.as_str(), true),
                    (None, Some(name)) => (name.as_str(), false),
                    (None, None) => return String::new(),
                };
                let value = self.variables.get(name).map(display_value).unwrap_or_default();
                if raw { value } else { escape_html(&value) }
            })
            .into_owned()
    }
}

impl ViewOracle for HtmlTemplate {
    fn view_file_exists(&self, name: &str) -> bool {
        HtmlTemplate::view_file_exists(self, name)
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// `.html` file names directly inside `dir`, without extension, sorted
pub fn directory_views(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut views: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some(VIEW_FILE_EXTENSION))
        .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
        .collect();
    views.sort();
    views
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::write_file;
    use serde_json::json;

    #[test]
    fn test_variables() {
        let mut template = HtmlTemplate::new();
        template.set("title", "Home");
        template.assign([("count", json!(3)), ("title", json!("Welcome"))]);

        assert_eq!(template.get_str("title"), Some("Welcome"));
        assert_eq!(template.get("count"), Some(&json!(3)));
        assert!(template.contains("count"));
        assert_eq!(template.remove("count"), Some(json!(3)));
        assert!(!template.contains("count"));

        template.clear_variables();
        assert!(template.variables().is_empty());
    }

    #[test]
    fn test_views_dirs_are_deduplicated_in_order() {
        let mut template = HtmlTemplate::new();
        template.add_views_dirs(["/a", "/b", "/a", "/c"]);
        assert_eq!(
            template.views_dirs(),
            &[PathBuf::from("/a"), PathBuf::from("/b"), PathBuf::from("/c")]
        );
        template.clear_views_dirs();
        assert!(template.views_dirs().is_empty());
    }

    #[test]
    fn test_view_lookup_follows_directory_order() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first");
        let second = dir.path().join("second");
        write_file(&second.join("Home.html"), "second");
        write_file(&first.join("Home.html"), "first");
        write_file(&second.join("About.html"), "about");

        let mut template = HtmlTemplate::new();
        template.add_views_dirs([&first, &second]);

        assert!(template.view_file_exists("home"));
        assert!(template.view_file_exists("About"));
        assert!(!template.view_file_exists("Contact"));
        assert_eq!(template.render("Home").unwrap().as_deref(), Some("first"));
        assert_eq!(template.render("About").unwrap().as_deref(), Some("about"));
    }

    #[test]
    fn test_render_substitutes_and_escapes() {
        let mut template = HtmlTemplate::new();
        template.set("name", "<b>Ann</b>");
        template.set("count", 2);
        template.set("flag", true);
        template.set("list", json!(["a"]));

        assert_eq!(
            template.render_str("{{ name }}|{{{ name }}}|{{count}}|{{ flag }}|{{ list }}|{{ missing }}"),
            "&lt;b&gt;Ann&lt;/b&gt;|<b>Ann</b>|2|true||"
        );
    }

    #[test]
    fn test_unbalanced_braces_are_not_placeholders() {
        let mut template = HtmlTemplate::new();
        template.set("x", "<i>");

        assert_eq!(template.render_str("{{ x }}}"), "&lt;i&gt;}");
        assert_eq!(template.render_str("{{{ x }}"), "{&lt;i&gt;");
        assert_eq!(template.render_str("{{{x}}}"), "<i>");
    }

    #[test]
    fn test_display_missing_view_writes_nothing() {
        let template = HtmlTemplate::new();
        let mut out = Vec::new();
        template.display_view("Nowhere", &mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_directory_views() {
        let dir = tempfile::tempdir().unwrap();
        write_file(&dir.path().join("Home.html"), "");
        write_file(&dir.path().join("About.html"), "");
        write_file(&dir.path().join("notes.txt"), "");
        write_file(&dir.path().join("Helpers/Header.html"), "");

        assert_eq!(directory_views(dir.path()), vec!["About", "Home"]);
        assert!(directory_views(&dir.path().join("missing")).is_empty());
    }
}
