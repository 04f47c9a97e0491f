//! # Core Bridge Module
//!
//! Host-side services answering requests from an isolated module.
//!
//! ## Overview
//!
//! - [`EsOutService`](es_out::EsOutService): stream-output create/feed/delete
//!   over virtual handles ([`handles`])
//! - [`StreamControlService`](control::StreamControlService): capability and
//!   pause-state queries relayed to the host
//! - [`StreamAccessService`](access::StreamAccessService): byte and block
//!   reads from a host stream
//! - [`DemuxService`](demux::DemuxService): single demux steps
//!
//! Every service is driven from one request-processing context at a time.
//! Validation happens before any host call. Host statuses are relayed
//! unchanged.

pub mod access;
pub mod control;
pub mod demux;
pub mod error;
pub mod es_out;
pub mod handles;

pub use access::{BlockReply, ReadReply, StreamAccessService};
pub use control::StreamControlService;
pub use demux::DemuxService;
pub use error::{HandleError, RequestError, Result};
pub use es_out::EsOutService;
pub use handles::{HandleTable, NO_HANDLE};
