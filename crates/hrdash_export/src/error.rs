use thiserror::Error;

/// Errors raised by the export engine's fallible building blocks.
///
/// The orchestrator never lets these escape: it folds them into an
/// [`ExportOutcome`](crate::orchestrator::ExportOutcome) after logging.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ExportError>;

/// Why a workbook could not be produced and the CSV path was taken instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// The formatting backend could not be loaded at all.
    #[error("workbook engine unavailable: {0}")]
    EngineUnavailable(String),

    /// The backend loaded but failed while building the document.
    #[error("workbook construction failed: {0}")]
    ConstructionFailed(String),
}

impl From<rust_xlsxwriter::XlsxError> for FallbackReason {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        Self::ConstructionFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_error_display() {
        let err = ExportError::InvalidCatalog("duplicate key `name`".into());
        assert_eq!(err.to_string(), "Invalid catalog: duplicate key `name`");
    }

    #[test]
    fn test_fallback_reason_display() {
        let reason = FallbackReason::EngineUnavailable("not installed".into());
        assert_eq!(
            reason.to_string(),
            "workbook engine unavailable: not installed"
        );
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ExportError = io.into();
        assert!(matches!(err, ExportError::Io(_)));
    }
}
