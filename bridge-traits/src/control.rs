//! Stream Control Abstraction
//!
//! The host exposes playback-control primitives through a single polymorphic
//! entry point. Each query carries its own out-parameter, so a host can only
//! ever write a value of the type the query expects.

use crate::platform::PlatformSendSync;

/// A control query against a host stream or demuxer.
#[derive(Debug, PartialEq, Eq)]
pub enum StreamQuery<'a> {
    /// Whether the stream supports seeking.
    CanSeek(&'a mut bool),
    /// Whether seeking is cheap (no full re-read).
    CanFastSeek(&'a mut bool),
    /// Whether the stream can be paused.
    CanPause(&'a mut bool),
    /// Whether the reader may control the pace of the stream.
    CanControlPace(&'a mut bool),
    /// Total stream size in bytes.
    GetSize(&'a mut u64),
    /// Presentation time stamp delay.
    GetPtsDelay(&'a mut i64),
    /// Pause or resume the stream.
    SetPauseState(bool),
}

impl StreamQuery<'_> {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            StreamQuery::CanSeek(_) => "can_seek",
            StreamQuery::CanFastSeek(_) => "can_fastseek",
            StreamQuery::CanPause(_) => "can_pause",
            StreamQuery::CanControlPace(_) => "can_control_pace",
            StreamQuery::GetSize(_) => "get_size",
            StreamQuery::GetPtsDelay(_) => "get_pts_delay",
            StreamQuery::SetPauseState(_) => "set_pause_state",
        }
    }
}

/// Host stream-control interface.
///
/// # Example
///
/// ```
/// use bridge_traits::control::{StreamControl, StreamQuery};
/// use bridge_traits::media::status;
///
/// struct AlwaysSeekable;
///
/// impl StreamControl for AlwaysSeekable {
///     fn control(&self, query: StreamQuery<'_>) -> i64 {
///         match query {
///             StreamQuery::CanSeek(out) => {
///                 *out = true;
///                 status::SUCCESS
///             }
///             _ => status::EGENERIC,
///         }
///     }
/// }
///
/// let mut seekable = false;
/// assert_eq!(AlwaysSeekable.control(StreamQuery::CanSeek(&mut seekable)), 0);
/// assert!(seekable);
/// ```
pub trait StreamControl: PlatformSendSync {
    /// Run one control query and return the host status code.
    fn control(&self, query: StreamQuery<'_>) -> i64;
}
