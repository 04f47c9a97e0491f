//! Media block marshaling.

use bridge_traits::media::HostBlock;
use bytes::Bytes;

use crate::error::Result;
use crate::format::copy_buffer;

/// Media block as carried on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EsBlock {
    pub buffer: Bytes,
    pub flags: u32,
    pub nb_samples: u32,
    pub pts: i64,
    pub dts: i64,
    pub length: i64,
}

impl EsBlock {
    pub fn new(buffer: impl Into<Bytes>) -> Self {
        Self {
            buffer: buffer.into(),
            ..Default::default()
        }
    }

    pub fn with_flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_samples(mut self, nb_samples: u32) -> Self {
        self.nb_samples = nb_samples;
        self
    }

    pub fn with_timing(mut self, pts: i64, dts: i64, length: i64) -> Self {
        self.pts = pts;
        self.dts = dts;
        self.length = length;
        self
    }
}

/// Build a host block from a wire block.
///
/// The payload is copied once into a buffer sized exactly to it. Fails only
/// when that allocation fails.
pub fn decode_block(wire: &EsBlock) -> Result<HostBlock> {
    Ok(HostBlock {
        buffer: copy_buffer(&wire.buffer)?,
        flags: wire.flags,
        nb_samples: wire.nb_samples,
        pts: wire.pts,
        dts: wire.dts,
        length: wire.length,
    })
}

/// Build a wire block from a host block, taking its buffer without copying.
pub fn encode_block(host: HostBlock) -> EsBlock {
    EsBlock {
        buffer: Bytes::from(host.buffer),
        flags: host.flags,
        nb_samples: host.nb_samples,
        pts: host.pts,
        dts: host.dts,
        length: host.length,
    }
}
