//! Byte-stream access and demuxer seams.

use crate::{media::HostBlock, platform::PlatformSendSync};

/// Host byte stream the isolated side may read from.
pub trait StreamAccess: PlatformSendSync {
    /// Fill `buf` from the stream. Returns the number of bytes read, or a
    /// negative status on error.
    fn read(&self, buf: &mut [u8]) -> i64;

    /// Read the next block, if the stream is block-oriented and one is ready.
    fn read_block(&self) -> Option<HostBlock>;

    /// Whether the end of the stream was reached.
    fn eof(&self) -> bool;

    /// Move the read position to `offset`.
    fn seek(&self, offset: u64) -> i32;
}

/// Host demuxer driven one step at a time.
pub trait Demuxer: PlatformSendSync {
    /// Demultiplex one unit of input. Returns the host's demux status.
    fn demux(&self) -> i32;
}
