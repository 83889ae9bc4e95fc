use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    // Saved settings that cannot be read as a settings object.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Empty hierarchy, or a base timeframe that is not part of it.
    #[error("Invalid pyramid structure: {0}")]
    InvalidStructure(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Market data error: {0}")]
    MarketDataError(String),

    #[error("Indicator calculation error: {0}")]
    IndicatorError(String),

    // A snapshot could not be moved into place.
    #[error("Persistence error: {0}")]
    PersistenceError(String),

    #[error("CSV parsing system error: {source}")]
    CsvSystemError {
        #[from]
        source: csv::Error,
    },

    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("JSON error: {source}")]
    JsonError {
        #[from]
        source: serde_json::Error,
    },
}

impl EngineError {
    /// Malformed request parameters are the only read-path failure a caller
    /// should see as its own fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, EngineError::InvalidParameter(_))
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
