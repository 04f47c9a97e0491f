//! # Host Bridge Traits
//!
//! Seams between the remote-control bridge and the host media engine that owns
//! the real stream objects.
//!
//! ## Overview
//!
//! The bridge runs next to the host engine and services requests coming from
//! an isolated module (sandboxed or out-of-process). Every real object it
//! drives is reached through one of the traits below, so the bridge itself
//! never holds a host pointer and tests can substitute stubs.
//!
//! ## Traits
//!
//! ### Stream control
//! - [`StreamControl`](control::StreamControl) - Polymorphic control entry point (seek/pause/pace capability, PTS delay, pause state)
//!
//! ### Elementary-stream sink
//! - [`EsOutput`](es_out::EsOutput) - Create, feed, delete and destroy stream outputs
//!
//! ### Input side
//! - [`StreamAccess`](access::StreamAccess) - Byte and block reads, seeking
//! - [`Demuxer`](access::Demuxer) - One demux step at a time
//!
//! ### Utilities
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ## Host-native types
//!
//! [`HostFormat`](media::HostFormat) and [`HostBlock`](media::HostBlock) are the
//! values a host receives. A `HostFormat` header is always sanitized: the
//! pointer fields described by [`FormatLayout`](media::FormatLayout) are zero
//! and the side-buffers are owned by the value itself.
//!
//! ## Thread Safety
//!
//! All traits require `Send + Sync` so host objects can be handed out behind
//! an `Arc`. The bridge still drives each object from a single context.

pub mod access;
pub mod control;
pub mod error;
pub mod es_out;
pub mod logging;
pub mod media;
pub mod platform;

pub use error::BridgeError;

// Re-export commonly used types
pub use access::{Demuxer, StreamAccess};
pub use control::{StreamControl, StreamQuery};
pub use es_out::EsOutput;
pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use media::{status, EsOutId, FieldSpan, FormatLayout, HostBlock, HostFormat};
