
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GrantbookError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("Data corruption: {message}")]
    DataCorruption { message: String },
    #[error("Lock poisoned: {0}")]
    Lock(String),
}

pub type Result<T> = std::result::Result<T, GrantbookError>;

// Helper conversions
impl From<rusqlite::Error> for GrantbookError {
    fn from(e: rusqlite::Error) -> Self { Self::Persistence(e.to_string()) }
}

impl From<serde_json::Error> for GrantbookError {
    fn from(e: serde_json::Error) -> Self { Self::DataCorruption { message: e.to_string() } }
}

impl From<config::ConfigError> for GrantbookError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}
