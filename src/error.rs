//! Error types for the annotation pipeline.
//!
//! Two layers: [`LocateError`] describes why a single annotation could not be
//! placed on its page, [`Error`] covers everything that can go wrong around
//! the core (input files, PDF reading, language model calls, LaTeX).

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Why an annotation was rejected as out of range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutOfRangeReason {
    /// No layout exists for the annotation's page index
    MissingPage,
    /// The layout handed to the locator belongs to another page
    WrongPage,
    /// The page has no text blocks at all
    EmptyPageLayout,
    /// The annotation box lies completely outside the page bounds
    OutsidePageBounds,
}

impl std::fmt::Display for OutOfRangeReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::MissingPage => "page not present in layout",
            Self::WrongPage => "layout belongs to a different page",
            Self::EmptyPageLayout => "page has no text blocks",
            Self::OutsidePageBounds => "box lies outside the page bounds",
        };
        f.write_str(text)
    }
}

/// Per-annotation failure raised by the locator.
///
/// These never abort a batch: `Locator::resolve_all` returns one result per
/// annotation so callers can report exactly which ones could not be placed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LocateError {
    /// The annotation references a page that cannot host it.
    #[error("Annotation #{order} on page {page} is out of range: {reason}")]
    OutOfRangeAnnotation {
        /// Position of the annotation in document order
        order: usize,
        /// Zero-based page index the annotation claims
        page: usize,
        /// What made the annotation unplaceable
        reason: OutOfRangeReason,
    },
}

impl LocateError {
    /// Build an out-of-range error.
    pub fn out_of_range(order: usize, page: usize, reason: OutOfRangeReason) -> Self {
        Self::OutOfRangeAnnotation {
            order,
            page,
            reason,
        }
    }

    /// The reason carried by this error.
    pub fn reason(&self) -> OutOfRangeReason {
        match self {
            Self::OutOfRangeAnnotation { reason, .. } => *reason,
        }
    }
}

/// Error types that can occur while running the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed extraction dump or model reply
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// PDF could not be read
    #[error("PDF error: {0}")]
    Pdf(String),

    /// A language model provider failed
    #[error("Provider {provider} failed: {message}")]
    Provider {
        /// Provider name (groq, openai, ...)
        provider: String,
        /// Status line, body excerpt or transport error
        message: String,
    },

    /// No provider probe found usable credentials
    #[error("No language model provider available (tried: {0})")]
    NoProviderAvailable(String),

    /// Configuration value could not be interpreted
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// LaTeX compilation failed
    #[error("LaTeX error: {0}")]
    Latex(String),

    /// Annotation could not be placed
    #[error(transparent)]
    Locate(#[from] LocateError),
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        Error::Pdf(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let provider = err
            .url()
            .and_then(|u| u.host_str())
            .unwrap_or("unknown")
            .to_string();
        Error::Provider {
            provider,
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_message() {
        let err = LocateError::out_of_range(3, 7, OutOfRangeReason::MissingPage);
        let msg = format!("{}", err);
        assert!(msg.contains("#3"));
        assert!(msg.contains("page 7"));
        assert!(msg.contains("not present"));
        assert_eq!(err.reason(), OutOfRangeReason::MissingPage);
    }

    #[test]
    fn test_provider_error() {
        let err = Error::Provider {
            provider: "groq".to_string(),
            message: "429 Too Many Requests".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("groq"));
        assert!(msg.contains("429"));
    }

    #[test]
    fn test_locate_error_converts() {
        let err: Error = LocateError::out_of_range(0, 1, OutOfRangeReason::EmptyPageLayout).into();
        assert!(format!("{}", err).contains("no text blocks"));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
        assert_send_sync::<LocateError>();
    }
}
