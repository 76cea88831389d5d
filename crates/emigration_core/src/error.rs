use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level error type for report generation.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Unknown report: {0}")]
    UnknownReport(String),

    #[error("Invalid report definition: {0}")]
    InvalidDefinition(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Classification of errors for logging and user display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Error caused by user input (e.g., a report id that does not exist).
    UserError,
    /// Broken embedded content or a failed render.
    ContentError,
    /// File system failure while writing output.
    SystemError,
    /// Invalid or unreadable configuration.
    ConfigError,
}

impl ErrorCategory {
    /// Process exit status for a failed run. 1 stays reserved for errors
    /// outside the domain.
    pub fn exit_code(self) -> u8 {
        match self {
            Self::UserError => 2,
            Self::ContentError => 3,
            Self::SystemError => 4,
            Self::ConfigError => 5,
        }
    }
}

impl ReportError {
    /// Returns the broad error category for routing and display purposes.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnknownReport(_) => ErrorCategory::UserError,
            Self::InvalidDefinition(_) => ErrorCategory::ContentError,
            Self::Render(_) => ErrorCategory::ContentError,
            Self::Io(_) => ErrorCategory::SystemError,
            Self::Config(_) => ErrorCategory::ConfigError,
        }
    }

    /// Returns a user-friendly message (hides internal details).
    pub fn user_message(&self) -> String {
        match self {
            Self::UnknownReport(id) => {
                format!("No report named '{id}'. Use --list to see available reports.")
            }
            Self::InvalidDefinition(msg) => format!("Report definition is broken: {msg}"),
            Self::Render(_) => "The document could not be generated.".into(),
            Self::Io(_) => "File error. Check the output path and permissions.".into(),
            Self::Config(msg) => format!("Configuration issue: {msg}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct_and_nonzero() {
        let codes = [
            ErrorCategory::UserError,
            ErrorCategory::ContentError,
            ErrorCategory::SystemError,
            ErrorCategory::ConfigError,
        ]
        .map(ErrorCategory::exit_code);
        assert!(codes.iter().all(|&c| c > 1));
        let mut unique = codes.to_vec();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), codes.len());
    }

    #[test]
    fn unknown_report_is_user_error() {
        let err = ReportError::UnknownReport("nope".into());
        assert_eq!(err.category(), ErrorCategory::UserError);
        assert!(err.user_message().contains("nope"));
        assert!(err.user_message().contains("--list"));
    }

    #[test]
    fn io_error_converts_and_hides_details() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "locked by Word");
        let err: ReportError = io.into();
        assert_eq!(err.category(), ErrorCategory::SystemError);
        assert!(!err.user_message().contains("locked by Word"));
        assert!(err.to_string().contains("locked by Word"));
    }

    #[test]
    fn display_includes_variant_prefix() {
        let err = ReportError::InvalidDefinition("row 3 has 2 cells".into());
        assert_eq!(
            err.to_string(),
            "Invalid report definition: row 3 has 2 cells"
        );
        assert_eq!(err.category(), ErrorCategory::ContentError);
    }

    #[test]
    fn render_error_message_is_generic() {
        let err = ReportError::Render("zip writer failed".into());
        assert_eq!(err.user_message(), "The document could not be generated.");
    }

    #[test]
    fn config_error_keeps_message() {
        let err = ReportError::Config("margin must be positive".into());
        assert_eq!(err.category(), ErrorCategory::ConfigError);
        assert!(err.user_message().contains("margin must be positive"));
    }
}
