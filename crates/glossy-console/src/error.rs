//! Error types for the admin console

use glossy_client::{ClientError, ErrorKind};
use glossy_core::Action;
use thiserror::Error;

/// Result type alias for screen operations
pub type ScreenResult<T> = Result<T, ScreenError>;

/// Errors surfaced by a screen operation
#[derive(Debug, Error)]
pub enum ScreenError {
    /// The signed-in role may not perform the action; nothing was sent
    #[error("Your role may not {0}")]
    Denied(Action),

    /// The operation needs a selected record
    #[error("No record selected")]
    NoSelection,

    /// The zero-based `page` lies past the last page of the list
    #[error("Page {} does not exist ({total_pages} pages)", .page.saturating_add(1))]
    PageOutOfRange {
        /// Requested zero-based page index
        page: u32,
        /// Pages the list has
        total_pages: u32,
    },

    /// The request failed
    #[error(transparent)]
    Client(#[from] ClientError),
}

impl ScreenError {
    /// Whether the console must return to the login surface
    #[must_use]
    pub const fn requires_login(&self) -> bool {
        match self {
            Self::Client(e) => e.requires_login(),
            Self::Denied(_) | Self::NoSelection | Self::PageOutOfRange { .. } => false,
        }
    }

    /// Handling class, for errors that came back from the API
    #[must_use]
    pub const fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Client(e) => Some(e.kind()),
            Self::Denied(_) | Self::NoSelection | Self::PageOutOfRange { .. } => None,
        }
    }
}

/// Errors that end a console command
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// Configuration or logging could not be set up
    #[error(transparent)]
    Core(#[from] glossy_core::Error),

    /// A screen operation failed
    #[error(transparent)]
    Screen(#[from] ScreenError),

    /// Command-line input was unusable
    #[error("Invalid input: {0}")]
    Input(String),

    /// Terminal I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Output could not be serialized
    #[error("Failed to serialize output: {0}")]
    Output(String),
}

impl From<ClientError> for ConsoleError {
    fn from(err: ClientError) -> Self {
        Self::Screen(ScreenError::Client(err))
    }
}
