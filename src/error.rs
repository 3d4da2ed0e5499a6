use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Outcomes of Credential Store and Notes Store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("User already exists")]
    AlreadyExists,

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid password")]
    InvalidPassword,

    #[error("Storage error: {0}")]
    StorageIO(#[from] sled::Error),

    #[error("Corrupt record: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("Stored password hash is malformed")]
    MalformedHash,

    #[error("Password must be at most {0} bytes")]
    PasswordTooLong(usize),
}

/// Errors surfaced at the REST boundary.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Invalid game selected")]
    InvalidGame,

    #[error("Invalid character selected")]
    InvalidCharacter,

    #[error("{0}")]
    Validation(String),

    #[error("Please login first")]
    Unauthorized,

    #[error("Session error: {0}")]
    Session(#[from] jsonwebtoken::errors::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Store(StoreError::AlreadyExists) => StatusCode::CONFLICT,
            ApiError::Store(StoreError::UserNotFound | StoreError::InvalidPassword) => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::Store(StoreError::PasswordTooLong(_)) => StatusCode::BAD_REQUEST,
            ApiError::Store(_) | ApiError::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InvalidGame | ApiError::InvalidCharacter => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }

    /// Login failures are logged by the login handler, which knows the
    /// username.
    fn logged_at_boundary(&self) -> bool {
        !matches!(
            self,
            ApiError::Store(StoreError::UserNotFound | StoreError::InvalidPassword)
        )
    }

    /// Message shown to the client. Login failures are not told apart and
    /// internal details stay in the logs.
    fn public_message(&self) -> String {
        match self {
            ApiError::Store(StoreError::UserNotFound | StoreError::InvalidPassword) => {
                "Invalid username or password".to_string()
            }
            ApiError::Store(StoreError::AlreadyExists | StoreError::PasswordTooLong(_)) => {
                self.to_string()
            }
            ApiError::Store(_) | ApiError::Session(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {self}");
        } else if self.logged_at_boundary() {
            warn!("Request rejected ({status}): {self}");
        }

        let body = Json(json!({
            "success": false,
            "message": self.public_message(),
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_failures_share_one_message() {
        let not_found = ApiError::from(StoreError::UserNotFound);
        let bad_password = ApiError::from(StoreError::InvalidPassword);

        assert_eq!(not_found.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(bad_password.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(not_found.public_message(), bad_password.public_message());
        assert!(!not_found.logged_at_boundary());
        assert!(!bad_password.logged_at_boundary());
        assert!(ApiError::Unauthorized.logged_at_boundary());
    }

    #[test]
    fn test_long_password_is_a_client_error() {
        let err = ApiError::from(StoreError::PasswordTooLong(72));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "Password must be at most 72 bytes");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(StoreError::AlreadyExists).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(ApiError::InvalidGame.status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::InvalidCharacter.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Validation("Passwords do not match".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(StoreError::MalformedHash).public_message(),
            "Internal server error"
        );
    }
}
