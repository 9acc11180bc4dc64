use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    /// Rejected before any provider ran. Distinct from an absent result.
    #[error("Invalid query: {field} - {message}")]
    InvalidQuery { field: String, message: String },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("HTTP error {status}: {body}")]
    HttpError { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    JsonParse(String),

    #[error("Rate limited by {provider}, retry after {retry_after_seconds}s")]
    RateLimited {
        provider: String,
        retry_after_seconds: u64,
    },

    #[error("Remote API error: {0}")]
    RemoteApi(String),

    #[error("Image decode failed: {0}")]
    ImageDecode(String),

    #[error("Link store error: {0}")]
    Store(#[from] core_library::LibraryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bridge error: {0}")]
    Bridge(#[from] bridge_traits::error::BridgeError),

    #[error(transparent)]
    Runtime(#[from] core_runtime::Error),
}

impl MetadataError {
    pub fn invalid_query(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn is_invalid_query(&self) -> bool {
        matches!(self, Self::InvalidQuery { .. })
    }
}

pub type Result<T> = std::result::Result<T, MetadataError>;
