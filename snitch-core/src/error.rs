use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("No start URL specified, use --url")]
    MissingStartUrl,

    #[error("Start URL '{0}' could not be parsed")]
    InvalidStartUrl(String),

    #[error("Start URL '{0}' is not secure, use an https URL")]
    InsecureStartUrl(String),

    #[error("This audit has already run")]
    AlreadyRun,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AuditError>;
