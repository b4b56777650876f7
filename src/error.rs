use thiserror::Error;

/// Errors raised at the boundaries of the championship model.
///
/// Points and scenario evaluation never fail; everything fallible lives in rule
/// lookup, configuration, data loading, and per-season preconditions.
#[derive(Error, Debug)]
pub enum TitleError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("insufficient data for {year}: {reason}")]
    InsufficientData { year: u16, reason: String },

    #[error("missing reference: {0}")]
    MissingReference(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("config file error: {0}")]
    ConfigFile(#[from] toml::de::Error),

    #[error("parse error in {table}: {message}")]
    Parse { table: &'static str, message: String },

    #[error("batch cancelled")]
    Cancelled,
}

impl TitleError {
    pub fn insufficient(year: u16, reason: impl Into<String>) -> Self {
        TitleError::InsufficientData {
            year,
            reason: reason.into(),
        }
    }

    /// Fatal errors abort a whole batch; the rest are recorded per season.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            TitleError::InsufficientData { .. } | TitleError::MissingReference(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, TitleError>;
