use std::path::PathBuf;

use thiserror::Error;

/// Error types surfaced at the edges of the framework
///
/// Core lookups (translation, view resolution, plugin dispatch) never fail;
/// these errors come from configuration, session persistence and rendering.
#[derive(Debug, Error)]
pub enum HummError {
    /// Filesystem error with the offending path
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Compiled catalog that could not be decoded
    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),
    /// Plural-Forms expression outside the supported grammar
    #[error("Plural expression error: {0}")]
    PluralExpression(String),
    /// Unreadable or malformed configuration
    #[error("Configuration error: {0}")]
    Config(String),
    /// Session persistence failure
    #[error("Session error: {0}")]
    Session(String),
    /// View lookup or rendering failure
    #[error("View error: {0}")]
    View(String),
}

impl HummError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HummError::Io {
            path: path.into(),
            source,
        }
    }

    /// Short, stable identifier used in fault reports
    pub fn code(&self) -> &'static str {
        match self {
            HummError::Io { .. } => "E_IO",
            HummError::InvalidCatalog(_) => "E_CATALOG",
            HummError::PluralExpression(_) => "E_PLURAL",
            HummError::Config(_) => "E_CONFIG",
            HummError::Session(_) => "E_SESSION",
            HummError::View(_) => "E_VIEW",
        }
    }
}

/// Result type for framework operations
pub type HummResult<T> = Result<T, HummError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HummError::Config("bad json".to_string());
        assert_eq!(err.to_string(), "Configuration error: bad json");
        assert_eq!(err.code(), "E_CONFIG");
    }

    #[test]
    fn test_io_error_mentions_path() {
        let err = HummError::io(
            "/tmp/missing.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.to_string().contains("/tmp/missing.json"));
        assert_eq!(err.code(), "E_IO");
    }
}
