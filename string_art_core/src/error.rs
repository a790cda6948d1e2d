use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Running out of ink early is not an error, see [`crate::sequencer::Termination`].
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("invalid image: {0}")]
    InvalidImage(String),
}

impl Error {
    pub(crate) fn parameter(message: impl Into<String>) -> Self {
        Error::InvalidParameter(message.into())
    }

    pub(crate) fn image(message: impl Into<String>) -> Self {
        Error::InvalidImage(message.into())
    }
}
