use thiserror::Error;

pub type OptimizeResult<T> = Result<T, OptimizeError>;

#[derive(Error, Debug)]
pub enum OptimizeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Client storage error: {0}")]
    Storage(String),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Missing attribute '{0}'")]
    MissingAttribute(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
