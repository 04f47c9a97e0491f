//! Stream-Control Service
//!
//! A fixed menu of capability queries plus one mutation, each mapped to
//! exactly one call of the host's polymorphic control entry point. The host
//! status is relayed as-is next to the out-value.

use std::sync::Arc;

use bridge_traits::control::{StreamControl, StreamQuery};
use core_codec::ControlReply;
use tracing::debug;

/// Stateless relay over a host [`StreamControl`].
///
/// A session may hold one per control target (the byte stream and the
/// demuxer); `target` only labels the log lines.
pub struct StreamControlService {
    control: Arc<dyn StreamControl>,
    target: &'static str,
}

impl StreamControlService {
    pub fn new(control: Arc<dyn StreamControl>) -> Self {
        Self {
            control,
            target: "stream",
        }
    }

    pub fn with_target(mut self, target: &'static str) -> Self {
        self.target = target;
        self
    }

    pub fn target(&self) -> &'static str {
        self.target
    }

    pub fn can_seek(&self) -> ControlReply<bool> {
        let mut value = false;
        let status = self.control.control(StreamQuery::CanSeek(&mut value));
        self.relay("can_seek", status, value)
    }

    pub fn can_fast_seek(&self) -> ControlReply<bool> {
        let mut value = false;
        let status = self.control.control(StreamQuery::CanFastSeek(&mut value));
        self.relay("can_fastseek", status, value)
    }

    pub fn can_pause(&self) -> ControlReply<bool> {
        let mut value = false;
        let status = self.control.control(StreamQuery::CanPause(&mut value));
        self.relay("can_pause", status, value)
    }

    pub fn can_control_pace(&self) -> ControlReply<bool> {
        let mut value = false;
        let status = self.control.control(StreamQuery::CanControlPace(&mut value));
        self.relay("can_control_pace", status, value)
    }

    pub fn get_size(&self) -> ControlReply<u64> {
        let mut value = 0;
        let status = self.control.control(StreamQuery::GetSize(&mut value));
        self.relay("get_size", status, value)
    }

    pub fn get_pts_delay(&self) -> ControlReply<i64> {
        let mut value = 0;
        let status = self.control.control(StreamQuery::GetPtsDelay(&mut value));
        self.relay("get_pts_delay", status, value)
    }

    pub fn set_pause_state(&self, paused: bool) -> i64 {
        let status = self.control.control(StreamQuery::SetPauseState(paused));
        debug!(
            target_object = self.target,
            query = "set_pause_state",
            paused,
            status,
            "control relayed"
        );
        status
    }

    fn relay<T: Copy + std::fmt::Debug>(
        &self,
        query: &'static str,
        status: i64,
        value: T,
    ) -> ControlReply<T> {
        debug!(target_object = self.target, query, status, value = ?value, "control relayed");
        ControlReply::new(status, value)
    }
}
