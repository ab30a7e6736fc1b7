use thiserror::Error;

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Email API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Email delivery failed: {message}")]
    DeliveryError { message: String },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Unknown booking: {booking_id}")]
    UnknownBooking { booking_id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl BookingError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            BookingError::ApiError(_) | BookingError::DeliveryError { .. } => ErrorCategory::Network,
            BookingError::IoError(_) => ErrorCategory::System,
            BookingError::SerializationError(_)
            | BookingError::ValidationError { .. }
            | BookingError::UnknownBooking { .. } => ErrorCategory::Data,
            BookingError::ConfigValidationError { .. }
            | BookingError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // Delivery failures are retried by the scheduler
            BookingError::ApiError(_) | BookingError::DeliveryError { .. } => ErrorSeverity::Medium,
            BookingError::IoError(_) => ErrorSeverity::Critical,
            BookingError::ConfigValidationError { .. }
            | BookingError::InvalidConfigValueError { .. } => ErrorSeverity::High,
            BookingError::UnknownBooking { .. } => ErrorSeverity::Medium,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            BookingError::ApiError(_) | BookingError::DeliveryError { .. } => {
                "Check network connectivity and the RESEND_API_KEY value, then retry".to_string()
            }
            BookingError::IoError(_) => "Check file permissions and available disk space".to_string(),
            BookingError::SerializationError(_) => {
                "The email API returned an unexpected payload; inspect the response body".to_string()
            }
            BookingError::ConfigValidationError { field, .. }
            | BookingError::InvalidConfigValueError { field, .. } => {
                format!("Fix the '{}' entry in the configuration file", field)
            }
            BookingError::ValidationError { .. } => {
                "Correct the booking request fields and submit again".to_string()
            }
            BookingError::UnknownBooking { .. } => {
                "Verify the booking id; it may have been cancelled or never created".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            BookingError::ApiError(_) | BookingError::DeliveryError { .. } => {
                "Could not reach the email service".to_string()
            }
            BookingError::IoError(_) => "A file system operation failed".to_string(),
            BookingError::ConfigValidationError { .. }
            | BookingError::InvalidConfigValueError { .. } => {
                "The configuration file is invalid".to_string()
            }
            BookingError::ValidationError { message } => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BookingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_failures_are_retryable_network_errors() {
        let e = BookingError::DeliveryError {
            message: "Email API returned 502".to_string(),
        };
        assert_eq!(e.category(), ErrorCategory::Network);
        assert_eq!(e.severity(), ErrorSeverity::Medium);
    }

    #[test]
    fn test_config_errors_name_the_field() {
        let e = BookingError::InvalidConfigValueError {
            field: "email.from_address".to_string(),
            value: "not-an-email".to_string(),
            reason: "Not a valid email address".to_string(),
        };
        assert_eq!(e.category(), ErrorCategory::Configuration);
        assert_eq!(e.severity(), ErrorSeverity::High);
        assert!(e.recovery_suggestion().contains("email.from_address"));
    }

    #[test]
    fn test_validation_message_is_shown_verbatim() {
        let e = BookingError::ValidationError {
            message: "Invalid date 'tomorrow', expected YYYY-MM-DD".to_string(),
        };
        assert_eq!(e.category(), ErrorCategory::Data);
        assert_eq!(
            e.user_friendly_message(),
            "Invalid date 'tomorrow', expected YYYY-MM-DD"
        );
    }
}
