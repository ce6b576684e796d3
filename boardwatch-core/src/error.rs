use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Board fetch error: {0}")]
    Board(#[from] BoardError),

    #[error("Cursor error: {0}")]
    Cursor(#[from] CursorError),

    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Operation cancelled: {operation}")]
    Cancelled { operation: String },
}

/// Failures while fetching or parsing a board or article page.
#[derive(Error, Debug)]
pub enum BoardError {
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request timeout: {url}")]
    RequestTimeout { url: String },

    #[error("Board not found: {board}")]
    BoardNotFound { board: String },

    #[error("Unexpected status {status_code} from {url}")]
    UnexpectedStatus { url: String, status_code: u16 },

    #[error("Unparseable document at {url}: {details}")]
    InvalidDocument { url: String, details: String },

    #[error("Invalid URL {url}: {details}")]
    InvalidUrl { url: String, details: String },
}

#[derive(Error, Debug)]
pub enum CursorError {
    /// The board has never been crawled. Only this variant means "no history".
    #[error("No cursor recorded for board {board}")]
    NotFound { board: String },

    #[error("Cursor for board {board} could not be read: {source}")]
    Read {
        board: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Cursor for board {board} could not be written: {source}")]
    Write {
        board: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Cursor for board {board} is corrupt: {source}")]
    Corrupt {
        board: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Failed to write article '{title}': {source}")]
    WriteFailed {
        title: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize article '{title}': {source}")]
    SerializeFailed {
        title: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to read article {name}: {source}")]
    ReadFailed {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Article {name} is corrupt: {source}")]
    Corrupt {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Article not found: {name}")]
    NotFound { name: String },

    #[error("Invalid article name: {name}")]
    InvalidName { name: String },

    #[error("Failed to delete article {name}: {source}")]
    DeleteFailed {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to list archive directory {path}: {source}")]
    ListFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to read {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid format in {path}: {details}")]
    InvalidFormat { path: String, details: String },

    #[error("Unsupported configuration format: {path}")]
    UnsupportedFormat { path: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Configuration parsing error: {0}")]
    Parse(#[from] toml::de::Error),
}
