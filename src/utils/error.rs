use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid configuration value for {field}: [{value}] ({reason})")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing configuration value: {field}")]
    MissingConfig { field: String },

    #[error("Authorization error: {0}")]
    Auth(String),

    /// Normalized remote failure. Every operation-level error from the
    /// remote service is reduced to this variant so callers can branch on
    /// `status_code` alone (400 malformed input, 404 not found, 409
    /// duplicate, ...).
    #[error("{message}")]
    Remote { message: String, status_code: u16 },
}

impl BrokerError {
    /// Remote status code, if this is a normalized remote failure.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            BrokerError::Remote { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, BrokerError>;
