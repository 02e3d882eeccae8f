use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Missing API key for {0}")]
    MissingApiKey(String),

    #[error("Provider configuration error: {0}")]
    Config(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upload rejected with status {status}: {body}")]
    Upload { status: u16, body: String },

    #[error("Invalid storage connection string: {0}")]
    InvalidConnectionString(String),

    #[error("No storage target configured (set a connection string or a local directory)")]
    NotConfigured,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Missing pipeline field: {0}")]
    MissingField(&'static str),

    #[error("Language model call failed: {0}")]
    Upstream(#[from] ProviderError),

    #[error("Report persistence failed: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
