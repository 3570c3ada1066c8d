/// Error types for document generation.
use crate::attachment::ValidationError;
use crate::render::RenderFailure;
use thiserror::Error;

/// Result type for document generation.
pub type Result<T> = std::result::Result<T, DocumentError>;

/// Errors that abort the generation of a document.
///
/// Per-property render failures are normally not errors at all: they are
/// collected on [`GeneratedDocument`](crate::GeneratedDocument). They only
/// surface here as [`DocumentError::Render`] when the generator runs with
/// [`RenderFailurePolicy::Abort`](crate::RenderFailurePolicy::Abort).
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The input is not a readable ZIP container
    #[error("Invalid archive: {0}")]
    ArchiveFormat(#[source] zip::result::ZipError),

    /// An entry could not be opened or its data is corrupt
    #[error("Failed to read entry '{entry}': {message}")]
    EntryRead { entry: String, message: String },

    /// The target entry is not well-formed XML
    #[error("Malformed XML in '{entry}' at byte {position}: {message}")]
    XmlDecode {
        entry: String,
        position: u64,
        message: String,
    },

    /// The output archive could not be written or finalized
    #[error("Failed to write archive: {0}")]
    ArchiveWrite(String),

    /// A property failed to render and the policy is to abort
    #[error("Failed to render property {}: {}", .0.label(), .0.message)]
    Render(RenderFailure),

    /// The attachment record did not pass validation
    #[error("Invalid attachment: {0}")]
    InvalidAttachment(#[from] ValidationError),
}

impl DocumentError {
    pub(crate) fn entry_read(entry: &str, err: impl std::fmt::Display) -> Self {
        DocumentError::EntryRead {
            entry: entry.to_string(),
            message: err.to_string(),
        }
    }

    pub(crate) fn write(err: impl std::fmt::Display) -> Self {
        DocumentError::ArchiveWrite(err.to_string())
    }

    /// Whether the error was caused by the input document rather than by
    /// writing the output.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            DocumentError::ArchiveFormat(_)
                | DocumentError::EntryRead { .. }
                | DocumentError::XmlDecode { .. }
                | DocumentError::InvalidAttachment(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_location() {
        let err = DocumentError::XmlDecode {
            entry: "docProps/custom.xml".to_string(),
            position: 42,
            message: "mismatched end tag".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Malformed XML in 'docProps/custom.xml' at byte 42: mismatched end tag"
        );
        assert!(err.is_input_error());
    }

    #[test]
    fn test_write_error_is_not_input_error() {
        let err = DocumentError::write("disk full");
        assert_eq!(err.to_string(), "Failed to write archive: disk full");
        assert!(!err.is_input_error());
    }
}
