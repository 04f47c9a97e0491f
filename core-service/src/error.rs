use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session initialization failed: {0}")]
    InitializationFailed(#[from] core_runtime::Error),

    #[error("No {0} service attached to this session")]
    ServiceMissing(&'static str),

    #[error("Request rejected: {0}")]
    Request(#[from] core_bridge::RequestError),

    #[error("Codec error: {0}")]
    Codec(#[from] core_codec::CodecError),
}

pub type Result<T> = std::result::Result<T, SessionError>;
