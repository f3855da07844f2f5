//! Error types for store and import operations
//!
//! Every failure in this system is recoverable: the UI shows a message and
//! keeps the previous state. The classification here only decides what that
//! message says and whether retrying could help.

use thiserror::Error;

/// Application error taxonomy.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Failed to parse {what}: {detail}")]
    Parse { what: String, detail: String },

    #[error("Validation failed for {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Import rejected: {0}")]
    ImportRejected(String),

    #[error("Assistant request failed: {0}")]
    Assistant(String),

    #[error("Another request is already in progress")]
    Busy,
}

impl AppError {
    /// Returns true if simply retrying the same operation could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Storage(_) | AppError::Assistant(_) | AppError::Busy)
    }

    /// Short user-facing guidance shown next to the error message.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Storage(_) => "Your data could not be written. Check disk space and permissions.",
            AppError::Parse { .. } => "The file format was not recognized. Nothing was changed.",
            AppError::Validation { .. } => "Fix the highlighted field and submit again.",
            AppError::NotFound(_) => "That item no longer exists.",
            AppError::ImportRejected(_) => "The import file could not be read. Nothing was changed.",
            AppError::Assistant(_) => "The assistant is unavailable right now. Try again later.",
            AppError::Busy => "A request is already running. Wait for it to finish.",
        }
    }
}

/// Serializable error shape for display surfaces.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UiError {
    pub message: String,
    pub can_retry: bool,
    pub hint: String,
}

impl From<&AppError> for UiError {
    fn from(err: &AppError) -> Self {
        UiError {
            message: err.to_string(),
            can_retry: err.is_retryable(),
            hint: err.user_message().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_is_not_retryable() {
        let err = AppError::Validation {
            field: "title".to_string(),
            message: "must not be empty".to_string(),
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_ui_error_carries_hint() {
        let err = AppError::ImportRejected("bad json".to_string());
        let ui = UiError::from(&err);
        assert!(ui.message.contains("bad json"));
        assert!(!ui.hint.is_empty());
        assert!(!ui.can_retry);
    }
}
