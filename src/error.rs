use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{gateway} gateway error: {message}")]
    Gateway {
        gateway: &'static str,
        message: String,
    },

    #[error("No definition found for \"{0}\"")]
    WordNotFound(String),

    #[error("Invalid word: {0}")]
    InvalidWord(String),

    #[error("Invalid detection region: {0}")]
    InvalidRegion(String),

    #[error("{0}")]
    General(String),
}

impl AppError {
    pub fn gateway(gateway: &'static str, message: impl Into<String>) -> Self {
        AppError::Gateway {
            gateway,
            message: message.into(),
        }
    }

    /// A missing dictionary entry is a legitimate outcome, distinct from a
    /// transport failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::WordNotFound(_))
    }
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
