//! Error types for the Slack DM exporter

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Missing credential: {0} is not set")]
    MissingCredential(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Couldn't find user: {0}")]
    UserNotFound(String),

    #[error("No DMs with {0}")]
    ConversationNotFound(String),

    #[error("Pagination anomaly: {0}")]
    PaginationAnomaly(String),

    #[error("Slack API error: {0}")]
    SlackApi(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("CSV error: {0}")]
    CsvError(String),
}

/// Closed set of failure classes surfaced to the invoking user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing credential or unusable settings, fatal at startup.
    Configuration,
    /// Target user or conversation does not exist.
    Resolution,
    /// Server claimed more data but paging could not make progress.
    Pagination,
    /// Network failure or malformed/rejected API response.
    Transport,
    /// Writing the spreadsheet failed.
    Output,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingCredential(_) | Error::InvalidArgument(_) => ErrorKind::Configuration,
            Error::UserNotFound(_) | Error::ConversationNotFound(_) => ErrorKind::Resolution,
            Error::PaginationAnomaly(_) => ErrorKind::Pagination,
            Error::SlackApi(_) | Error::Http(_) | Error::SerializationError(_) => {
                ErrorKind::Transport
            }
            Error::IoError(_) | Error::CsvError(_) => ErrorKind::Output,
        }
    }
}

impl ErrorKind {
    /// Process exit code for this failure class.
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Output => 1,
            ErrorKind::Configuration => 2,
            ErrorKind::Resolution => 3,
            ErrorKind::Pagination => 4,
            ErrorKind::Transport => 5,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::CsvError(err.to_string())
    }
}
