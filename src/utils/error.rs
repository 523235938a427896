use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidatorError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Catalog responded with HTTP {status}: {message}")]
    CatalogStatusError { status: u16, message: String },

    #[error("Webhook responded with HTTP {status}: {message}")]
    WebhookStatusError { status: u16, message: String },

    #[error("Storage error: {message}")]
    StorageError { message: String },

    #[error("Cannot send report: {reason}")]
    NotValidated { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Storage,
    Data,
    Session,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ValidatorError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ValidatorError::ApiError(_)
            | ValidatorError::CatalogStatusError { .. }
            | ValidatorError::WebhookStatusError { .. } => ErrorCategory::Network,
            ValidatorError::ConfigValidationError { .. }
            | ValidatorError::InvalidConfigValueError { .. }
            | ValidatorError::MissingConfigError { .. } => ErrorCategory::Configuration,
            ValidatorError::IoError(_) | ValidatorError::StorageError { .. } => {
                ErrorCategory::Storage
            }
            ValidatorError::SerializationError(_) => ErrorCategory::Data,
            ValidatorError::NotValidated { .. } => ErrorCategory::Session,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Session => ErrorSeverity::Low,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ValidatorError::ApiError(_) => "Check your network connection and try again",
            ValidatorError::CatalogStatusError { .. } => {
                "Scryfall may be rate limiting or unavailable; wait a moment and retry"
            }
            ValidatorError::WebhookStatusError { .. } => {
                "Verify the webhook URL is still valid and the channel accepts threads"
            }
            ValidatorError::ConfigValidationError { .. }
            | ValidatorError::InvalidConfigValueError { .. }
            | ValidatorError::MissingConfigError { .. } => {
                "Review the configuration file and environment variables"
            }
            ValidatorError::IoError(_) | ValidatorError::StorageError { .. } => {
                "Make sure the cache directory exists and is writable"
            }
            ValidatorError::SerializationError(_) => {
                "The cached result may be corrupt; clear it and validate again"
            }
            ValidatorError::NotValidated { .. } => "Run a successful validation before sending",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not reach a remote service ({})", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::Storage => format!("Could not access the result cache: {}", self),
            ErrorCategory::Data => format!("Unexpected data: {}", self),
            ErrorCategory::Session => self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ValidatorError>;
