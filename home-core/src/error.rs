use thiserror::Error;

#[derive(Debug, Error)]
pub enum HomeError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HomeError>;
