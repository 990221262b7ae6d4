//! Error types for slide-deck inconsistency analysis.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort an analysis run.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to read or write a file.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The uploaded file is not a valid presentation container.
    #[error("Invalid presentation: {0}")]
    ParseError(String),

    /// ZIP archive error (for PPTX).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing error (for PPTX).
    #[error("XML parsing error: {0}")]
    XmlError(String),

    /// An embedded picture could not be decoded or written.
    #[error("Image error: {0}")]
    ImageError(String),

    /// Missing or invalid process configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Failed to persist the final report.
    #[error("Report error: {0}")]
    ReportError(String),
}

/// Failure of a single call to the language model service.
///
/// These never abort a run; the driver turns them into a finding text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// Connection failure, timeout, or unreadable body.
    #[error("request failed: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("service returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The service answered but the payload carried no usable text.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_error_messages() {
        let err = LlmError::Api {
            status: 429,
            message: "quota exceeded".to_string(),
        };
        assert_eq!(err.to_string(), "service returned 429: quota exceeded");
        assert_eq!(
            LlmError::Transport("timed out".to_string()).to_string(),
            "request failed: timed out"
        );
    }

    #[test]
    fn test_parse_error_message() {
        let err = Error::ParseError("not a ZIP archive".to_string());
        assert_eq!(err.to_string(), "Invalid presentation: not a ZIP archive");
    }
}
