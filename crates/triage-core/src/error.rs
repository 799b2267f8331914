//! Error types for the triage pipeline

/// Result type alias using the triage Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for triage operations
///
/// A guardrail rejection is not an error: it is an expected terminal state
/// of a run and is reported through the orchestrator's outcome instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A resolved label has no handler and no fallback is registered
    #[error("no handler registered for label '{label}'")]
    UnregisteredLabel { label: String },

    /// The external completion service failed
    #[error("upstream error: {0}")]
    Upstream(String),

    /// A handler failed while producing a response
    #[error("handler error: {0}")]
    Handler(String),

    /// Classifier execution errors
    #[error("classifier error: {0}")]
    Classifier(String),

    /// Guardrail execution errors (not rejections)
    #[error("guardrail error: {0}")]
    Guardrail(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a new unregistered label error
    pub fn unregistered(label: impl Into<String>) -> Self {
        Self::UnregisteredLabel {
            label: label.into(),
        }
    }

    /// Create a new upstream error
    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    /// Create a new handler error
    pub fn handler(msg: impl Into<String>) -> Self {
        Self::Handler(msg.into())
    }

    /// Create a new classifier error
    pub fn classifier(msg: impl Into<String>) -> Self {
        Self::Classifier(msg.into())
    }

    /// Create a new guardrail error
    pub fn guardrail(msg: impl Into<String>) -> Self {
        Self::Guardrail(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Short machine-readable kind, used as a metrics label
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnregisteredLabel { .. } => "unregistered_label",
            Self::Upstream(_) => "upstream",
            Self::Handler(_) => "handler",
            Self::Classifier(_) => "classifier",
            Self::Guardrail(_) => "guardrail",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Upstream(format!("request timed out: {}", err))
        } else {
            Self::Upstream(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unregistered_display() {
        let err = Error::unregistered("chemistry");
        assert_eq!(err.to_string(), "no handler registered for label 'chemistry'");
        assert_eq!(err.kind(), "unregistered_label");
    }

    #[test]
    fn test_upstream_kind() {
        assert_eq!(Error::upstream("502").kind(), "upstream");
    }

    #[test]
    fn test_io_error_converts() {
        fn read_missing() -> Result<String> {
            Ok(std::fs::read_to_string("/nonexistent/triage.yaml")?)
        }
        assert_eq!(read_missing().unwrap_err().kind(), "io");
    }
}
