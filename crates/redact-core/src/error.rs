use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RedactError {
    #[error("Failed to parse PDF: {0}")]
    Load(String),

    #[error("Invalid page number: {page} (document has {page_count} pages)")]
    InvalidPage { page: i64, page_count: u32 },

    #[error("No PDF loaded to save")]
    NoDocument,

    #[error("Failed to render page {page}: {reason}")]
    Render { page: u32, reason: String },

    #[error("Failed to render page {page} for export: {reason}")]
    ExportRender { page: u32, reason: String },

    #[error("Invalid search terms: {0}")]
    InvalidSearchTerms(String),

    #[error("PDF operation failed: {0}")]
    Operation(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl RedactError {
    /// Message written to the editor's error slot.
    ///
    /// Export failures carry the "Failed to save PDF" prefix with the
    /// underlying cause appended; load and render failures describe
    /// themselves.
    pub fn user_message(&self) -> String {
        match self {
            RedactError::Load(reason) => format!("Failed to load PDF: {}", reason),
            RedactError::Render { .. } => self.to_string(),
            other => format!("Failed to save PDF: {}", other),
        }
    }

    /// Re-tag a render failure raised while assembling an export, so it is
    /// reported as a save failure.
    pub fn during_export(self) -> Self {
        match self {
            RedactError::Render { page, reason } => RedactError::ExportRender { page, reason },
            other => other,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, RedactError::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, RedactError>;
