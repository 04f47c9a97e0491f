//! Bridge session façade.
//!
//! This crate wires host-provided objects (stream-output sink, stream
//! control, byte-stream access, demuxer and its control entry point) into a [`BridgeSession`] that answers
//! request frames from an isolated module. A host attaches only the objects it
//! has; requests addressed to anything else are rejected without a host call.

pub mod error;
pub mod session;

pub use error::{Result, SessionError};
pub use session::{BridgeSession, SessionId};

use std::sync::Arc;

use bridge_traits::{
    access::{Demuxer, StreamAccess},
    control::StreamControl,
    es_out::EsOutput,
};

/// Aggregated handle to the host objects a session may drive.
#[derive(Default)]
pub struct HostServices {
    pub es_out: Option<Arc<dyn EsOutput>>,
    pub control: Option<Arc<dyn StreamControl>>,
    pub access: Option<Arc<dyn StreamAccess>>,
    pub demuxer: Option<Arc<dyn Demuxer>>,
    /// Control entry point of the demuxer, queried apart from `control`.
    pub demux_control: Option<Arc<dyn StreamControl>>,
}

impl HostServices {
    /// An empty set; attach objects with the `with_*` methods.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_es_out(mut self, sink: Arc<dyn EsOutput>) -> Self {
        self.es_out = Some(sink);
        self
    }

    pub fn with_control(mut self, control: Arc<dyn StreamControl>) -> Self {
        self.control = Some(control);
        self
    }

    pub fn with_access(mut self, access: Arc<dyn StreamAccess>) -> Self {
        self.access = Some(access);
        self
    }

    pub fn with_demuxer(mut self, demuxer: Arc<dyn Demuxer>) -> Self {
        self.demuxer = Some(demuxer);
        self
    }

    pub fn with_demux_control(mut self, control: Arc<dyn StreamControl>) -> Self {
        self.demux_control = Some(control);
        self
    }
}
