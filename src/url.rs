/// Path segments of the requested URI
///
/// The URI keeps its query string, so `/forum/?lang=es` yields the
/// arguments `forum` and `?lang=es`. View resolution skips segments that
/// start with `?` or `&`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlArguments {
    arguments: Vec<String>,
}

const TRIM_CHARS: [char; 2] = ['?', '/'];

impl UrlArguments {
    /// Split a request URI into arguments
    ///
    /// # Arguments
    /// * `uri` - Request URI including any query string
    /// * `base_path` - URL path the installation is mounted under (`/` or empty for the root)
    pub fn from_uri(uri: &str, base_path: &str) -> Self {
        let base = base_path.trim_end_matches('/');
        let relative = if base.is_empty() {
            uri
        } else {
            uri.strip_prefix(base).unwrap_or(uri)
        };

        let trimmed = relative.trim_matches(&TRIM_CHARS[..]);
        if trimmed.trim().is_empty() {
            return UrlArguments::default();
        }

        UrlArguments {
            arguments: trimmed.split('/').map(str::to_string).collect(),
        }
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        UrlArguments {
            arguments: segments.into_iter().map(Into::into).collect(),
        }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.arguments.get(index).map(String::as_str)
    }

    pub fn all(&self) -> &[String] {
        &self.arguments
    }

    pub fn count(&self) -> usize {
        self.arguments.len()
    }
}
