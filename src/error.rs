use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum Error {
    #[error("invalid compression format: {0}")]
    InvalidFormat(String),

    #[error("compression failed: {0}")]
    CompressionFailed(String),

    #[error("attachment not found: {0}")]
    AttachmentNotFound(String),

    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("sending failed: {0}")]
    SendFailed(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}
