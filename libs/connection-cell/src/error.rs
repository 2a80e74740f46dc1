use thiserror::Error;

use shared_database::StoreError;
use shared_models::AppError;

#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("connection directory unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<StoreError> for ConnectionError {
    fn from(e: StoreError) -> Self {
        ConnectionError::StoreUnavailable(e.to_string())
    }
}

impl From<ConnectionError> for AppError {
    fn from(e: ConnectionError) -> Self {
        match e {
            ConnectionError::StoreUnavailable(msg) => AppError::StoreUnavailable(msg),
        }
    }
}
