//! Error types for the core module.

use std::fmt;

use thiserror::Error;

use crate::station::State;

/// Result type alias for core operations.
pub type LineResult<T> = Result<T, LineError>;

/// Caller-facing classification of a [`LineError`].
///
/// The transport layer maps each kind onto a user-visible status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Structurally invalid input.
    BadRequest,
    /// Referenced item or station does not exist.
    NotFound,
    /// Semantically illegal given the current state.
    Conflict,
    /// Disallowed in the current operating mode.
    Forbidden,
    /// The line could not be initialized.
    Unavailable,
    /// Failure propagated from a persistence collaborator.
    Internal,
}

impl ErrorKind {
    /// HTTP status conventionally used for this kind.
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::Forbidden => 403,
            ErrorKind::Unavailable => 503,
            ErrorKind::Internal => 500,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::Unavailable => "unavailable",
            ErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors that can occur while running the production line.
#[derive(Error, Debug)]
pub enum LineError {
    #[error("Cannot produce an item twice: {0} is already done")]
    AlreadyDone(String),

    #[error("Body id '{proposed}' does not match item id '{expected}'")]
    IdMismatch { expected: String, proposed: String },

    #[error("State {state} is not an allowed action at station {station}")]
    InvalidAction { station: String, state: State },

    #[error("Item {item} is at station {current}, not {proposed}")]
    StationMismatch {
        item: String,
        current: String,
        proposed: String,
    },

    #[error("Missing item id")]
    MissingId,

    #[error("Missing target state")]
    MissingState,

    #[error("State {0} is assigned by the line and cannot be requested")]
    ReservedState(State),

    #[error("Station not found: {0}")]
    StationNotFound(String),

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Item already exists: {0}")]
    ItemExists(String),

    #[error("No items found")]
    NothingStored,

    #[error("Failed to delete non-existing item: {0}")]
    NothingToDelete(String),

    #[error("Duplicate station id: {0}")]
    DuplicateStation(String),

    #[error("Station {station} already has successor {existing}")]
    DuplicateSuccessor { station: String, existing: String },

    #[error("Station order references unknown station: {0}")]
    UnknownStation(String),

    #[error("Station order contains a cycle through {0}")]
    CycleDetected(String),

    #[error("No START station configured")]
    NoStartStation,

    #[error("More than one START station configured: {first} and {second}")]
    MultipleStartStations { first: String, second: String },

    #[error("Invalid station {station}: {message}")]
    InvalidStation { station: String, message: String },

    #[error("Not allowed to {0} while the line is live")]
    LiveMode(String),

    #[error("Line configuration not found: {0}")]
    ConfigurationMissing(String),

    #[error("Line configuration already exists: {0}")]
    ConfigurationExists(String),

    #[error("Invalid value '{value}' for {key}")]
    InvalidSetting { key: String, value: String },

    #[error("Item {item} was modified concurrently (expected version {expected}, found {found})")]
    VersionConflict {
        item: String,
        expected: u64,
        found: u64,
    },

    #[error("Store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl LineError {
    /// Classify this error for the transport layer.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LineError::MissingId
            | LineError::MissingState
            | LineError::ReservedState(_)
            | LineError::InvalidAction { .. }
            | LineError::StationMismatch { .. }
            | LineError::StationNotFound(_) => ErrorKind::BadRequest,

            LineError::ItemNotFound(_) | LineError::NothingStored => ErrorKind::NotFound,

            LineError::AlreadyDone(_)
            | LineError::IdMismatch { .. }
            | LineError::ItemExists(_)
            | LineError::NothingToDelete(_)
            | LineError::ConfigurationExists(_)
            | LineError::VersionConflict { .. } => ErrorKind::Conflict,

            LineError::LiveMode(_) => ErrorKind::Forbidden,

            LineError::DuplicateStation(_)
            | LineError::DuplicateSuccessor { .. }
            | LineError::UnknownStation(_)
            | LineError::CycleDetected(_)
            | LineError::NoStartStation
            | LineError::MultipleStartStations { .. }
            | LineError::InvalidStation { .. }
            | LineError::InvalidSetting { .. }
            | LineError::ConfigurationMissing(_) => ErrorKind::Unavailable,

            LineError::Store(_)
            | LineError::Io(_)
            | LineError::Yaml(_)
            | LineError::Json(_)
            | LineError::Toml(_) => ErrorKind::Internal,
        }
    }
}
