//! Failures a host adapter hands back to the bridge.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    /// The host log pipeline stopped accepting entries for good.
    #[error("Log sink closed: {0}")]
    SinkClosed(String),

    /// Writing an entry to the host's log destination failed.
    #[error("Log sink write failed: {0}")]
    Write(#[from] std::io::Error),
}

impl BridgeError {
    /// Whether retrying the same sink is pointless.
    pub fn is_closed(&self) -> bool {
        matches!(self, BridgeError::SinkClosed(_))
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
