//! Stream-Access Service
//!
//! Lets the isolated module pull bytes and blocks from a host stream it does
//! not own.

use std::sync::Arc;

use bridge_traits::access::StreamAccess;
use bytes::Bytes;
use core_codec::{encode_block, CodecError, EsBlock};
use tracing::{debug, warn};

use crate::error::{RequestError, Result};

/// Outcome of a byte read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadReply {
    /// Byte count or negative host status.
    pub status: i64,
    /// Bytes actually read; empty on error.
    pub data: Bytes,
}

/// Outcome of a block read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockReply {
    pub eof: bool,
    pub block: Option<EsBlock>,
}

pub struct StreamAccessService {
    access: Arc<dyn StreamAccess>,
    max_read_bytes: u64,
}

impl StreamAccessService {
    pub fn new(access: Arc<dyn StreamAccess>, max_read_bytes: u64) -> Self {
        Self {
            access,
            max_read_bytes,
        }
    }

    /// Read up to `length` bytes.
    pub fn read(&self, length: u64) -> Result<ReadReply> {
        let too_large = || {
            warn!(length, max = self.max_read_bytes, "access.read too large");
            RequestError::ReadTooLarge {
                requested: length,
                max: self.max_read_bytes,
            }
        };
        if length > self.max_read_bytes {
            return Err(too_large());
        }
        let len = usize::try_from(length).map_err(|_| too_large())?;

        let mut buf = Vec::new();
        buf.try_reserve_exact(len)
            .map_err(|_| CodecError::OutOfMemory { requested: len })?;
        buf.resize(len, 0);

        let status = self.access.read(&mut buf);
        let filled = usize::try_from(status).map_or(0, |n| n.min(len));
        buf.truncate(filled);

        debug!(length, status, "access.read");
        Ok(ReadReply {
            status,
            data: Bytes::from(buf),
        })
    }

    /// Read the next host block, if any, along with the EOF flag.
    pub fn block(&self) -> BlockReply {
        let block = self.access.read_block().map(encode_block);
        let eof = self.access.eof();
        debug!(eof, has_block = block.is_some(), "access.block");
        BlockReply { eof, block }
    }

    pub fn seek(&self, offset: u64) -> i32 {
        let status = self.access.seek(offset);
        debug!(offset, status, "access.seek");
        status
    }

    /// Acknowledge the isolated side dropping its stream. The host stream
    /// stays owned by the host.
    pub fn destroy(&self) {
        debug!("access.destroy");
    }
}
