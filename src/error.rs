use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("order already exists: {0}")]
    Conflict(String),

    #[error("order not found: {0}")]
    NotFound(String),

    #[error("payment gateway error: {0}")]
    Gateway(String),

    #[error("payment verification failed - invalid signature")]
    SignatureMismatch,

    #[error("storage error: {0}")]
    Persistence(String),

    #[error("notifier error: {0}")]
    Notifier(String),
}

impl From<diesel::result::Error> for AppError {
    fn from(err: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error as DieselError};
        match err {
            DieselError::NotFound => AppError::NotFound("no matching row".to_string()),
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                AppError::Conflict(info.message().to_string())
            }
            other => AppError::Persistence(other.to_string()),
        }
    }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
