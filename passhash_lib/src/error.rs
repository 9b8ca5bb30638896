use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(crate::validate::Error),

    #[error("Invalid hash parameter: {0}")]
    Parameter(crate::validate::Error),

    #[error("Could not encode PHC string: {0}")]
    Encoding(&'static str),

    #[error("Could not decode PHC string: {0}")]
    Decoding(&'static str),

    #[error("Primitive failure: {0}")]
    Primitive(String),

    #[error("Hashing task did not complete: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("No hasher registered as {0}")]
    UnknownHasher(String),
}

impl From<crate::validate::Error> for Error {
    fn from(value: crate::validate::Error) -> Self {
        Self::Config(value)
    }
}

impl Error {
    /// Whether the error comes from the stored value rather than the environment.
    #[must_use]
    pub const fn is_input(&self) -> bool {
        matches!(self, Self::Parameter(_) | Self::Decoding(_))
    }
}
