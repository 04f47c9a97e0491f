//! # Codec Error Types
//!
//! Every error here is detected before any host call is made.

use thiserror::Error;

/// Errors raised while marshaling formats, blocks or wire frames.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    // ========================================================================
    // Host ABI
    // ========================================================================
    /// The fixed format header does not match the host's compiled size.
    #[error("Format header size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// A side-buffer length does not fit in its header field.
    #[error("Length {length} does not fit in a {width}-byte header field")]
    LengthOverflow { length: usize, width: usize },

    /// The configured layout cannot describe a header.
    #[error("Invalid format layout: {0}")]
    InvalidLayout(String),

    // ========================================================================
    // Resources
    // ========================================================================
    /// A host-side copy could not be allocated.
    #[error("Out of memory allocating {requested} bytes")]
    OutOfMemory { requested: usize },

    // ========================================================================
    // Framing
    // ========================================================================
    /// The frame ended before a field was complete.
    #[error("Truncated frame: needed {needed} more bytes, {remaining} left")]
    Truncated { needed: usize, remaining: usize },

    /// Bytes were left over after the last field.
    #[error("Trailing bytes after message: {0}")]
    TrailingBytes(usize),

    /// The opcode is not part of the message set.
    #[error("Unknown opcode: {0:#06x}")]
    UnknownOpcode(u16),

    /// A boolean field held something other than 0 or 1.
    #[error("Invalid boolean byte: {0:#04x}")]
    InvalidBool(u8),

    /// An optional field tag held something other than 0 or 1.
    #[error("Invalid option tag: {0:#04x}")]
    InvalidTag(u8),

    /// The frame exceeds the configured maximum.
    #[error("Frame of {size} bytes exceeds maximum of {max}")]
    FrameTooLarge { size: usize, max: usize },
}

impl CodecError {
    /// Returns `true` when the error points at skew between the isolated
    /// module's build and the host build rather than at bad data.
    pub fn is_abi_mismatch(&self) -> bool {
        matches!(
            self,
            CodecError::SizeMismatch { .. } | CodecError::InvalidLayout(_)
        )
    }

    /// Returns `true` if the frame itself was malformed.
    pub fn is_framing_error(&self) -> bool {
        matches!(
            self,
            CodecError::Truncated { .. }
                | CodecError::TrailingBytes(_)
                | CodecError::UnknownOpcode(_)
                | CodecError::InvalidBool(_)
                | CodecError::InvalidTag(_)
                | CodecError::FrameTooLarge { .. }
        )
    }
}

/// Result type for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;
