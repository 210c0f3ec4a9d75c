/// Convenience result alias used throughout the crate.
pub type ScrubResult<T> = Result<T, ScrubError>;

/// Crate error type.
///
/// Runtime paths (transport, scheduler, splash) never surface these; they degrade instead.
/// Errors come from construction and parsing: timing tables, configuration and GIF scans.
#[derive(thiserror::Error, Debug)]
pub enum ScrubError {
    /// A value violated a structural invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// A configuration document was rejected.
    #[error("config error: {0}")]
    Config(String),

    /// A GIF byte stream could not be walked.
    #[error("gif error: {0}")]
    Gif(String),

    /// JSON (de)serialization failed.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Any other failure, with its source preserved.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ScrubError {
    /// Build a [`ScrubError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ScrubError::Config`].
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`ScrubError::Gif`].
    pub fn gif(msg: impl Into<String>) -> Self {
        Self::Gif(msg.into())
    }

    /// Build a [`ScrubError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for ScrubError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
