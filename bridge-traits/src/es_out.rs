//! Elementary-Stream Output Abstraction
//!
//! Primitives a host engine exposes for the sink that receives demultiplexed
//! elementary streams. Stream outputs are named by opaque [`EsOutId`] tokens
//! owned by the host.

use crate::{
    media::{EsOutId, HostBlock, HostFormat},
    platform::PlatformSendSync,
};

/// Host elementary-stream sink.
///
/// Implementations must copy whatever they need out of the format passed to
/// [`EsOutput::add`]; the bridge drops it once the call returns.
pub trait EsOutput: PlatformSendSync {
    /// Create a stream output. `None` means the host refused the format.
    fn add(&self, format: &HostFormat) -> Option<EsOutId>;

    /// Push a block into a stream output. `None` signals flush/end of stream.
    ///
    /// The block is owned by the host once this is called, whatever the
    /// returned status.
    fn send(&self, id: EsOutId, block: Option<HostBlock>) -> i32;

    /// Destroy a single stream output.
    fn del(&self, id: EsOutId);

    /// Tear down the whole sink, invalidating every output it created.
    fn destroy(&self);

    /// Set the program clock reference.
    fn set_pcr(&self, pcr: i64) -> i64;

    /// Set the presentation time of the next displayed picture.
    fn set_next_display_time(&self, pts: i64) -> i64;
}
