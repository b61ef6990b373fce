use dagfs_codec::CodecError;
use dagfs_dag::DagError;
use dagfs_types::TypeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("daemon returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid JSON response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("dag error: {0}")]
    Dag(#[from] DagError),

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error("{0} is not implemented")]
    NotImplemented(&'static str),
}

impl From<ApiError> for DagError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Dag(inner) => inner,
            ApiError::NotImplemented(what) => DagError::NotImplemented(what),
            other => DagError::transport(other),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
