use std::sync::Arc;

use bridge_traits::access::Demuxer;
use tracing::debug;

/// Drives a host demuxer one step per request.
pub struct DemuxService {
    demuxer: Arc<dyn Demuxer>,
}

impl DemuxService {
    pub fn new(demuxer: Arc<dyn Demuxer>) -> Self {
        Self { demuxer }
    }

    pub fn demux(&self) -> i32 {
        let result = self.demuxer.demux();
        debug!(result, "demux step");
        result
    }
}
