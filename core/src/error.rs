use thiserror::Error;

#[derive(Error, Debug)]
pub enum OciError {
    #[error("Invalid iso3 '{iso3}': expected exactly three ASCII letters")]
    InvalidTarget { iso3: String },

    #[error("Country '{iso3}' not found in population")]
    TargetNotFound { iso3: String },

    #[error("Duplicate country record for '{iso3}'")]
    DuplicateCountry { iso3: String },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type OciResult<T> = Result<T, OciError>;
