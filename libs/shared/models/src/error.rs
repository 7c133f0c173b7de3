use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Internal Error: {0}")]
    Internal(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("External service error: {0}")]
    ExternalService(String),
}

impl AppError {
    /// Classifies an error raised by the REST client by the prefix it was built with.
    pub fn from_api_error(err: &anyhow::Error) -> Self {
        let message = err.to_string();
        if message.starts_with("Authentication error") {
            AppError::Auth(message)
        } else if message.starts_with("Resource not found") {
            AppError::NotFound(message)
        } else if message.starts_with("Conflict") {
            AppError::Conflict(message)
        } else if message.starts_with("Bad request") {
            AppError::BadRequest(message)
        } else {
            AppError::ExternalService(message)
        }
    }

    /// Text shown to the user in an alert. Never contains transport details.
    pub fn user_message(&self) -> String {
        let message = match self {
            AppError::Auth(_) => "Your session has expired. Please sign in again.",
            AppError::NotFound(_) => "The requested item no longer exists.",
            AppError::BadRequest(_) => "The request could not be processed.",
            AppError::Internal(_) => "Something went wrong. Please try again.",
            AppError::ValidationError(msg) => return msg.clone(),
            AppError::Conflict(_) => "That time slot is no longer available.",
            AppError::ExternalService(_) => "The server could not be reached. Please try again later.",
        };

        tracing::error!("Error surfaced to user: {}", self);

        message.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_from_api_error_classification() {
        let auth = anyhow!("Authentication error: token expired");
        assert!(matches!(AppError::from_api_error(&auth), AppError::Auth(_)));

        let conflict = anyhow!("Conflict: slot already booked");
        assert!(matches!(AppError::from_api_error(&conflict), AppError::Conflict(_)));

        let other = anyhow!("API error (500): boom");
        assert!(matches!(AppError::from_api_error(&other), AppError::ExternalService(_)));
    }

    #[test]
    fn test_validation_message_is_passed_through() {
        let err = AppError::ValidationError("Doctor ID is required".to_string());
        assert_eq!(err.user_message(), "Doctor ID is required");
    }
}
