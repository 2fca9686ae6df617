use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Please sign in to continue")]
    Unauthorized,

    #[error("You do not have permission to perform this action")]
    Forbidden,

    #[error("Another request is already in progress, please wait")]
    OperationInFlight,

    #[error("The request timed out, please try again")]
    Timeout,

    #[error("Order could not be placed: {0}")]
    Gateway(String),

    #[error("Storage error")]
    Db(#[from] sqlx::Error),

    #[error("Stored data could not be read")]
    Serialization(#[from] serde_json::Error),

    #[error("Something went wrong, please try again")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::NotFound(what.into())
    }
}

pub type AppResult<T> = Result<T, AppError>;
