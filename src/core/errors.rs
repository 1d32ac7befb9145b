use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Invalid file: {0}")]
    Validation(String),

    #[error("Chunk {index} failed with status {status}: {message}")]
    ChunkUpload {
        index: usize,
        status: u16,
        message: String,
    },

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Chunk {index} timed out after {}s", timeout.as_secs())]
    TransferTimeout {
        index: usize,
        timeout: Duration,
    },

    #[error("Upload could not be confirmed at {url} after {attempts} checks")]
    RecoveryExhausted {
        url: String,
        attempts: u32,
    },

    #[error("Network error on chunk {index}: {message}")]
    Transport {
        index: usize,
        message: String,
    },

    #[error("Chunk {index} request could not be built: {message}")]
    InvalidRequest {
        index: usize,
        message: String,
    },

    #[error("IO error {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),
}

impl UploadError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// 服务端拒绝了凭证，调用方应重新登录
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::ChunkUpload { status: 401, .. })
    }
}

impl From<url::ParseError> for UploadError {
    fn from(err: url::ParseError) -> Self {
        Self::Config(format!("invalid url: {err}"))
    }
}

/// 单次 HTTP 交换失败（没有拿到任何状态码）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Request timed out")]
    Timeout,

    #[error("Network error {0}")]
    Network(String),

    /// 请求在本地构建失败，没有发出
    #[error("Invalid request {0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_builder() {
            Self::Request(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

pub type Result<T, E = UploadError> = std::result::Result<T, E>;
pub type TransportResult<T> = std::result::Result<T, TransportError>;
