use thiserror::Error;

/// Errors that abort startup. None of these can occur once the service is up.
#[derive(Error, Debug)]
pub enum AugurError {
    #[error("no package arguments")]
    NoPackages,
    #[error("{0}")]
    Load(String),
    #[error("analysis engine: {0}")]
    Engine(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<augur_api::ApiError> for AugurError {
    fn from(err: augur_api::ApiError) -> Self {
        match err {
            augur_api::ApiError::Load(msg) => AugurError::Load(msg),
            augur_api::ApiError::Engine(msg) => AugurError::Engine(msg),
            other => AugurError::Internal(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, AugurError>;
