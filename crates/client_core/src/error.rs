use shared::{
    domain::DomainError,
    error::{ApiError, ErrorCode},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend rejected request ({status}): {message}")]
    Api {
        status: u16,
        code: ErrorCode,
        message: String,
    },
    #[error("malformed backend response: {0}")]
    Decode(String),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Validation(String),
}

impl ClientError {
    pub fn from_api(status: u16, error: ApiError) -> Self {
        ClientError::Api {
            status,
            code: error.code,
            message: error.message,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            ClientError::Api {
                code: ErrorCode::Unauthorized | ErrorCode::Forbidden,
                ..
            }
        )
    }
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;
