use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid configuration value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("{message}")]
    ValidationError { field: String, message: String },

    #[error("Request cancelled before completion")]
    Cancelled,

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::ValidationError { .. })
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::ValidationError { message, .. } => message.clone(),
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => format!("Invalid configuration: {self}"),
            Self::Cancelled => "The request was cancelled".to_string(),
            _ => "Internal server error".to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => {
                "Check the configuration file and the environment variables it references"
            }
            Self::ValidationError { .. } => "Correct the request fields and try again",
            Self::IoError(_) => "Check file paths and permissions",
            Self::Cancelled => "Retry the request",
            _ => "Re-run with --verbose and inspect the logs",
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
