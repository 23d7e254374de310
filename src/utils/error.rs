//! Error types for the webpage façade

use thiserror::Error;
use url::Url;

/// Main error type for façade operations
#[derive(Debug, Error)]
pub enum PageError {
    /// Input rejected before anything was forwarded to the engine
    #[error("precondition violated: {0}")]
    Precondition(#[from] Precondition),
    /// Reading an observed property failed
    #[error("observation failed: {0}")]
    Observation(#[from] ObservationError),
    /// Script evaluation failed
    #[error("script evaluation failed: {0}")]
    Script(#[from] ScriptError),
    /// The engine reported a failure
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
    /// The page has been torn down
    #[error("page has been closed")]
    Closed,
}

/// Precondition violations detected synchronously by the façade
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Precondition {
    /// The character encoding has no canonical name
    #[error("{0:?} is not a valid character encoding")]
    UnknownEncoding(String),
    /// A data load was given an empty MIME type
    #[error("MIME type must not be empty")]
    EmptyMimeType,
    /// A file-based load was given a non-file URL
    #[error("{0} is not a file URL")]
    NotFileUrl(String),
    /// A back-forward load named an item outside the page's history
    #[error("{0} is not in the back-forward list")]
    NotInHistory(String),
}

/// Failure reported by the engine for a navigation or download
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{domain} error {code}: {description}")]
pub struct LoadError {
    pub domain: String,
    pub code: i64,
    pub description: String,
    pub failing_url: Option<Url>,
}

impl LoadError {
    pub fn new(domain: impl Into<String>, code: i64, description: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            code,
            description: description.into(),
            failing_url: None,
        }
    }

    pub fn with_url(mut self, url: Url) -> Self {
        self.failing_url = Some(url);
        self
    }
}

/// Engine-level failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The engine handle could not be created
    #[error("engine unavailable: {0}")]
    Unavailable(String),
    /// A property could not be read or observed
    #[error("property {property} unavailable: {reason}")]
    Property { property: &'static str, reason: String },
    /// PDF or web archive generation failed
    #[error("export failed: {0}")]
    Export(String),
    /// A download could not be started or resumed
    #[error("download failed: {0}")]
    Download(String),
}

/// Failures while observing a property
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObservationError {
    /// The engine failed to subscribe to or read the property
    #[error(transparent)]
    Engine(#[from] EngineError),
    /// The engine produced a value of the wrong shape
    #[error("property {property} produced a {found} value")]
    TypeMismatch {
        property: &'static str,
        found: &'static str,
    },
}

/// Asynchronous script evaluation failures, kept distinct per cause
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    /// The target frame was no longer valid when evaluation began
    #[error("target frame is no longer valid")]
    InvalidFrameTarget,
    /// The returned thenable rejected
    #[error("result rejected: {0}")]
    ResultRejected(String),
    /// The returned thenable was collected before it resolved
    #[error("result became unreachable before resolution")]
    ResultUnreachable,
    /// The function body threw
    #[error("exception: {0}")]
    Exception(String),
    /// The result could not be converted to a script value
    #[error("unsupported result type")]
    UnsupportedResult,
}

/// Convenience Result type for façade operations
pub type Result<T> = std::result::Result<T, PageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_converts() {
        let err: PageError = Precondition::EmptyMimeType.into();
        assert!(matches!(err, PageError::Precondition(Precondition::EmptyMimeType)));
    }

    #[test]
    fn test_script_errors_stay_distinct() {
        let rejected: PageError = ScriptError::ResultRejected("nope".into()).into();
        let unreachable: PageError = ScriptError::ResultUnreachable.into();
        assert!(matches!(rejected, PageError::Script(ScriptError::ResultRejected(_))));
        assert!(matches!(unreachable, PageError::Script(ScriptError::ResultUnreachable)));
        assert_ne!(rejected.to_string(), unreachable.to_string());
    }

    #[test]
    fn test_load_error_display() {
        let err = LoadError::new("network", -1009, "offline");
        assert_eq!(err.to_string(), "network error -1009: offline");
    }

    #[test]
    fn test_encoding_message() {
        let err = Precondition::UnknownEncoding("klingon".into());
        assert_eq!(err.to_string(), "\"klingon\" is not a valid character encoding");
    }
}
