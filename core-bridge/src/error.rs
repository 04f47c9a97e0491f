use core_codec::CodecError;
use thiserror::Error;

/// A request the bridge refused before making any host call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("Required field missing: {0}")]
    MissingField(&'static str),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Stream output sink already destroyed")]
    SinkDestroyed,

    #[error("Read of {requested} bytes exceeds maximum of {max}")]
    ReadTooLarge { requested: u64, max: u64 },
}

impl RequestError {
    /// Returns `true` when the isolated module and the host disagree on the
    /// format header ABI.
    pub fn is_abi_mismatch(&self) -> bool {
        matches!(self, RequestError::Codec(err) if err.is_abi_mismatch())
    }
}

/// Handle resolution failure.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleError {
    #[error("Invalid stream handle: {0}")]
    InvalidHandle(u64),
}

pub type Result<T> = std::result::Result<T, RequestError>;
