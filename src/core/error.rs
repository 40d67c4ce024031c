use thiserror::Error;

#[derive(Error, Debug)]
pub enum GateError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON policy parse error: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("TOML policy parse error: {0}")]
    ParseToml(#[from] toml::de::Error),

    #[error("Unsupported policy file format: {0} (expected .json or .toml)")]
    UnsupportedFormat(String),

    #[error("Policy validation failed: {0}")]
    InvalidPolicy(String),
}

pub type Result<T> = std::result::Result<T, GateError>;
