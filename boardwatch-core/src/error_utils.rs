use crate::error::*;
use tracing::{error, info, warn};

pub trait ErrorExt {
    fn log_error(&self) -> &Self;
    fn log_warn(&self) -> &Self;
    /// Whether the next scheduled cycle can be expected to get past this error
    /// without operator intervention.
    fn is_transient(&self) -> bool;
    fn user_friendly_message(&self) -> String;
    fn error_code(&self) -> String;
}

impl ErrorExt for CoreError {
    fn log_error(&self) -> &Self {
        error!("CoreError: {}", self);
        match self {
            CoreError::Board(e) => {
                error!("Board error details: {:?}", e);
            }
            CoreError::Cursor(e) => {
                error!("Cursor error details: {:?}", e);
            }
            CoreError::Archive(e) => {
                error!("Archive error details: {:?}", e);
            }
            CoreError::Config(e) => {
                error!("Configuration error details: {:?}", e);
            }
            _ => {}
        }
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("CoreError (warning): {}", self);
        self
    }

    fn is_transient(&self) -> bool {
        match self {
            CoreError::Board(e) => e.is_transient(),
            CoreError::Cursor(e) => e.is_transient(),
            CoreError::Archive(e) => e.is_transient(),
            CoreError::Config(e) => e.is_transient(),
            CoreError::Cancelled { .. } => true,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            CoreError::Board(e) => e.user_friendly_message(),
            CoreError::Cursor(e) => e.user_friendly_message(),
            CoreError::Archive(e) => e.user_friendly_message(),
            CoreError::Config(e) => e.user_friendly_message(),
            CoreError::Cancelled { operation } => {
                format!("'{}' was cancelled because the service is stopping.", operation)
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            CoreError::Board(_) => "BOARD".to_string(),
            CoreError::Cursor(_) => "CURSOR".to_string(),
            CoreError::Archive(_) => "ARCHIVE".to_string(),
            CoreError::Config(_) => "CONFIG".to_string(),
            CoreError::Cancelled { .. } => "CANCELLED".to_string(),
        }
    }
}

impl ErrorExt for BoardError {
    fn log_error(&self) -> &Self {
        error!("BoardError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("BoardError (warning): {}", self);
        self
    }

    fn is_transient(&self) -> bool {
        match self {
            BoardError::Transport { .. } => true,
            BoardError::RequestTimeout { .. } => true,
            BoardError::UnexpectedStatus { status_code, .. } => {
                *status_code == 429 || *status_code >= 500
            }
            _ => false,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            BoardError::Transport { .. } => {
                "Could not reach the board. Please check your internet connection.".to_string()
            }
            BoardError::RequestTimeout { .. } => {
                "The board took too long to respond. It will be tried again next cycle."
                    .to_string()
            }
            BoardError::BoardNotFound { board } => {
                format!("Board '{}' does not exist or is not public.", board)
            }
            BoardError::UnexpectedStatus { status_code, .. } => {
                format!("The board answered with HTTP status {}.", status_code)
            }
            BoardError::InvalidDocument { .. } => {
                "The board page has an unexpected layout and could not be read.".to_string()
            }
            BoardError::InvalidUrl { url, .. } => format!("'{}' is not a valid board URL.", url),
        }
    }

    fn error_code(&self) -> String {
        match self {
            BoardError::Transport { .. } => "BOARD_TRANSPORT".to_string(),
            BoardError::RequestTimeout { .. } => "BOARD_TIMEOUT".to_string(),
            BoardError::BoardNotFound { .. } => "BOARD_NOT_FOUND".to_string(),
            BoardError::UnexpectedStatus { .. } => "BOARD_UNEXPECTED_STATUS".to_string(),
            BoardError::InvalidDocument { .. } => "BOARD_INVALID_DOCUMENT".to_string(),
            BoardError::InvalidUrl { .. } => "BOARD_INVALID_URL".to_string(),
        }
    }
}

impl ErrorExt for CursorError {
    fn log_error(&self) -> &Self {
        error!("CursorError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("CursorError (warning): {}", self);
        self
    }

    fn is_transient(&self) -> bool {
        matches!(self, CursorError::Read { .. } | CursorError::Write { .. })
    }

    fn user_friendly_message(&self) -> String {
        match self {
            CursorError::NotFound { board } => {
                format!("Board '{}' has not been crawled before.", board)
            }
            CursorError::Read { board, .. } | CursorError::Write { board, .. } => format!(
                "The crawl position for '{}' could not be accessed. Please check file permissions.",
                board
            ),
            CursorError::Corrupt { board, .. } => format!(
                "The crawl position for '{}' is damaged. Remove its cursor file to start over.",
                board
            ),
        }
    }

    fn error_code(&self) -> String {
        match self {
            CursorError::NotFound { .. } => "CURSOR_NOT_FOUND".to_string(),
            CursorError::Read { .. } => "CURSOR_READ_FAILED".to_string(),
            CursorError::Write { .. } => "CURSOR_WRITE_FAILED".to_string(),
            CursorError::Corrupt { .. } => "CURSOR_CORRUPT".to_string(),
        }
    }
}

impl ErrorExt for ArchiveError {
    fn log_error(&self) -> &Self {
        error!("ArchiveError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("ArchiveError (warning): {}", self);
        self
    }

    fn is_transient(&self) -> bool {
        matches!(
            self,
            ArchiveError::WriteFailed { .. }
                | ArchiveError::ReadFailed { .. }
                | ArchiveError::ListFailed { .. }
        )
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ArchiveError::NotFound { name } => format!("Article '{}' is not in the archive.", name),
            ArchiveError::InvalidName { .. } => "That is not a valid article name.".to_string(),
            ArchiveError::Corrupt { .. } => {
                "The archived article is damaged and cannot be shown.".to_string()
            }
            ArchiveError::WriteFailed { .. } | ArchiveError::DeleteFailed { .. } => {
                "The archive could not be updated. Please check disk space and permissions."
                    .to_string()
            }
            _ => "Archive error occurred. Please try again.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            ArchiveError::WriteFailed { .. } => "ARCHIVE_WRITE_FAILED".to_string(),
            ArchiveError::SerializeFailed { .. } => "ARCHIVE_SERIALIZE_FAILED".to_string(),
            ArchiveError::ReadFailed { .. } => "ARCHIVE_READ_FAILED".to_string(),
            ArchiveError::Corrupt { .. } => "ARCHIVE_CORRUPT".to_string(),
            ArchiveError::NotFound { .. } => "ARCHIVE_NOT_FOUND".to_string(),
            ArchiveError::InvalidName { .. } => "ARCHIVE_INVALID_NAME".to_string(),
            ArchiveError::DeleteFailed { .. } => "ARCHIVE_DELETE_FAILED".to_string(),
            ArchiveError::ListFailed { .. } => "ARCHIVE_LIST_FAILED".to_string(),
        }
    }
}

impl ErrorExt for ConfigError {
    fn log_error(&self) -> &Self {
        error!("ConfigError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("ConfigError (warning): {}", self);
        self
    }

    fn is_transient(&self) -> bool {
        false // Config errors need the operator to fix the file
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ConfigError::FileNotFound { path } => {
                format!("Configuration file '{}' not found.", path)
            }
            ConfigError::InvalidFormat { path, .. } => {
                format!("'{}' is not valid. Please check its syntax.", path)
            }
            ConfigError::UnsupportedFormat { path } => format!(
                "'{}' must be a .toml or .json file.",
                path
            ),
            ConfigError::MissingField { field } => {
                format!("Required configuration field '{}' is missing.", field)
            }
            ConfigError::InvalidValue { field, .. } => {
                format!("Invalid value for configuration field '{}'.", field)
            }
            _ => "Configuration error occurred. Please check your settings.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            ConfigError::FileNotFound { .. } => "CONFIG_FILE_NOT_FOUND".to_string(),
            ConfigError::ReadFailed { .. } => "CONFIG_READ_FAILED".to_string(),
            ConfigError::InvalidFormat { .. } => "CONFIG_INVALID_FORMAT".to_string(),
            ConfigError::UnsupportedFormat { .. } => "CONFIG_UNSUPPORTED_FORMAT".to_string(),
            ConfigError::MissingField { .. } => "CONFIG_MISSING_FIELD".to_string(),
            ConfigError::InvalidValue { .. } => "CONFIG_INVALID_VALUE".to_string(),
            ConfigError::Parse(_) => "CONFIG_PARSE_ERROR".to_string(),
        }
    }
}

pub struct ErrorReporter {
    report_errors: bool,
    report_warnings: bool,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self {
            report_errors: true,
            report_warnings: true,
        }
    }

    pub fn with_error_reporting(mut self, enabled: bool) -> Self {
        self.report_errors = enabled;
        self
    }

    pub fn with_warning_reporting(mut self, enabled: bool) -> Self {
        self.report_warnings = enabled;
        self
    }

    pub fn report_error(&self, error: &CoreError) {
        if self.report_errors {
            error.log_error();
            info!("Error code: {}", error.error_code());
            info!("User message: {}", error.user_friendly_message());
            if error.is_transient() {
                info!("Error is transient, the next cycle will try again");
            }
        }
    }

    pub fn report_warning(&self, error: &CoreError) {
        if self.report_warnings {
            error.log_warn();
        }
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}
