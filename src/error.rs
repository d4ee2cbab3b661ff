use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    WeakPassword(String),

    #[error("The username already exists")]
    DuplicateUsername,

    #[error("The email already exists")]
    DuplicateEmail,

    #[error("The username doesn't exist")]
    UnknownUser,

    #[error("Incorrect password")]
    InvalidCredentials,

    #[error("Not logged in")]
    Unauthenticated,

    #[error("Not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Hash error: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Message to re-render on the submitting form, for failures the user
    /// can fix themselves. Store-side failures return `None` and propagate.
    pub fn form_message(&self) -> Option<String> {
        match self {
            AppError::Validation(_)
            | AppError::WeakPassword(_)
            | AppError::DuplicateUsername
            | AppError::DuplicateEmail
            | AppError::UnknownUser
            | AppError::InvalidCredentials => Some(self.to_string()),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::WeakPassword(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::DuplicateUsername | AppError::DuplicateEmail => {
                (StatusCode::CONFLICT, self.to_string())
            }
            AppError::UnknownUser | AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, self.to_string())
            }
            AppError::Unauthenticated => (StatusCode::UNAUTHORIZED, "Not logged in".to_string()),
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Hash(e) => {
                tracing::error!("Hash error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, message).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
