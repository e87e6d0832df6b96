use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A required value is missing, empty, or refers to nothing.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The operation is not legal in the ticket's (or desk's) current state.
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl Error {
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Error::InvalidArgument(_))
    }

    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Error::InvalidState(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
