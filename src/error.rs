use thiserror::Error;

/// Fallback shown when a failed response carries no usable message.
pub const REQUEST_FAILED: &str = "Request failed";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Text suitable for an inline form error or a toast.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Api(ApiError::Request { message, .. }) => message.clone(),
            AppError::Api(ApiError::Transport(_)) => "Network error, please try again".to_string(),
            AppError::Api(ApiError::Decode(_)) => "Unexpected response from server".to_string(),
            AppError::Auth(AuthError::Provider(message)) => message.clone(),
            AppError::Auth(e) => e.to_string(),
            AppError::Validation(e) => e.to_string(),
            AppError::Config(_) | AppError::Internal(_) => "Something went wrong".to_string(),
        }
    }

    /// HTTP status of a failed API call, if the failure came from the server.
    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::Api(ApiError::Request { status, .. }) => Some(*status),
            _ => None,
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::Config(format!("invalid URL: {}", err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Api(ApiError::from(err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Api(ApiError::Decode(err.to_string()))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("{message} (status {status})")]
    Request { status: u16, message: String },

    #[error("invalid response body: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("{0}")]
    Provider(String),

    #[error("Please login to continue")]
    NotAuthenticated,

    #[error("Stored token is no longer valid")]
    InvalidToken,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Please select date and time or check \"Start Now\"")]
    MissingSchedule,

    #[error("Code block is empty")]
    EmptyCodeBlock,

    #[error("Message is empty")]
    EmptyMessage,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "storage file missing");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Internal(_)));

        let config_err = config::ConfigError::NotFound(String::from("api.base_url"));
        let app_err: AppError = config_err.into();
        assert!(matches!(app_err, AppError::Config(_)));

        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let app_err: AppError = json_err.into();
        assert!(matches!(app_err, AppError::Api(ApiError::Decode(_))));

        let validation: AppError = ValidationError::MissingSchedule.into();
        assert!(matches!(validation, AppError::Validation(ValidationError::MissingSchedule)));
    }

    #[test]
    fn test_user_messages() {
        let err = AppError::Api(ApiError::Request {
            status: 409,
            message: "Session is full".to_string(),
        });
        assert_eq!(err.user_message(), "Session is full");
        assert_eq!(err.status(), Some(409));

        let err = AppError::Auth(AuthError::Provider("Invalid email address".to_string()));
        assert_eq!(err.user_message(), "Invalid email address");
        assert_eq!(err.status(), None);

        let err = AppError::Validation(ValidationError::PasswordMismatch);
        assert_eq!(err.user_message(), "Passwords do not match");
    }

    #[test]
    fn test_error_display() {
        let err = AppError::Validation(ValidationError::EmptyCodeBlock);
        assert_eq!(err.to_string(), "Validation error: Code block is empty");

        let err = AppError::Api(ApiError::Request {
            status: 500,
            message: REQUEST_FAILED.to_string(),
        });
        assert_eq!(err.to_string(), "API error: Request failed (status 500)");
    }
}
