#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Load(String),
    #[error("{0}")]
    Engine(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
