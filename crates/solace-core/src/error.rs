use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolaceError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("A probe bake is already in progress")]
    BakeInProgress,

    #[error("Cubemap face size mismatch: expected {expected}, got {actual}")]
    FaceSizeMismatch { expected: u32, actual: u32 },

    #[error("Malformed cubemap: {0}")]
    MalformedCubemap(String),

    #[error("Probe grid mismatch: {0}")]
    GridMismatch(String),
}

impl SolaceError {
    pub fn config(message: impl Into<String>) -> Self {
        SolaceError::InvalidConfiguration(message.into())
    }
}

pub type Result<T> = std::result::Result<T, SolaceError>;
