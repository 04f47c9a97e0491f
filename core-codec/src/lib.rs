//! # Core Codec Module
//!
//! Marshaling between the wire representation used by the isolated module
//! and the host's own media structures.
//!
//! ## Overview
//!
//! - [`wire`]: little-endian primitives, length-prefixed byte sequences and
//!   optional fields
//! - [`format`]: format descriptors, with untrusted pointer fields zeroed and
//!   side-buffers rebuilt in host-owned memory
//! - [`block`]: media blocks
//! - [`message`]: the request/response message set, one pair per operation
//!
//! Nothing in this crate calls into the host. Every error is raised before a
//! host call would be made.

pub mod block;
pub mod error;
pub mod format;
pub mod message;
pub mod wire;

pub use block::{decode_block, encode_block, EsBlock};
pub use error::{CodecError, Result};
pub use format::{decode_format, encode_format, EsFormat};
pub use message::{ControlReply, Envelope, Opcode, Request, Response};
