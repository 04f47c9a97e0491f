//! # Bridge Session
//!
//! One session per connection to an isolated module. The session owns an
//! instance of every attached service, decodes each request frame, runs it
//! against the matching service and encodes the response frame.
//!
//! A frame that cannot be decoded, or that targets a service the host did not
//! attach, is answered with a rejected envelope and never reaches the host.

use std::fmt;

use bytes::Bytes;
use core_bridge::{DemuxService, EsOutService, StreamAccessService, StreamControlService};
use core_codec::{Envelope, Request, Response};
use core_runtime::config::BridgeConfig;
use core_runtime::logging::summarize_bytes;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::{Result, SessionError};
use crate::HostServices;

/// Identifier attached to every log line a session emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Request dispatcher for one isolated module.
pub struct BridgeSession {
    id: SessionId,
    config: BridgeConfig,
    es_out: Option<EsOutService>,
    control: Option<StreamControlService>,
    access: Option<StreamAccessService>,
    demux: Option<DemuxService>,
    demux_control: Option<StreamControlService>,
}

impl BridgeSession {
    /// Open a session over the attached host objects.
    ///
    /// Fails if `config` does not validate.
    pub fn new(config: BridgeConfig, hosts: HostServices) -> Result<Self> {
        config.validate()?;

        let id = SessionId::new();
        let session = Self {
            id,
            es_out: hosts
                .es_out
                .map(|sink| EsOutService::new(sink, config.format_layout)),
            control: hosts.control.map(StreamControlService::new),
            access: hosts
                .access
                .map(|access| StreamAccessService::new(access, config.max_read_bytes)),
            demux: hosts.demuxer.map(DemuxService::new),
            demux_control: hosts
                .demux_control
                .map(|control| StreamControlService::new(control).with_target("demux")),
            config,
        };

        info!(
            session_id = %id,
            es_out = session.es_out.is_some(),
            control = session.control.is_some(),
            access = session.access.is_some(),
            demux = session.demux.is_some(),
            demux_control = session.demux_control.is_some(),
            "bridge session opened"
        );
        Ok(session)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn es_out(&self) -> Option<&EsOutService> {
        self.es_out.as_ref()
    }

    /// Answer one request frame with one response frame.
    ///
    /// Malformed frames get a rejected envelope addressed to whatever opcode
    /// could be read (0 if none). Only encoding the response can fail.
    #[instrument(skip(self, frame), fields(session_id = %self.id, len = frame.len()))]
    pub fn handle_frame(&mut self, frame: Bytes) -> Result<Bytes> {
        let envelope = match Request::decode(frame.clone(), self.config.max_frame_bytes) {
            Ok(request) => self.dispatch(request),
            Err(err) => {
                let opcode = Request::peek_opcode(&frame).unwrap_or_default();
                warn!(
                    opcode,
                    error = %err,
                    frame = %summarize_bytes(&frame),
                    "malformed request"
                );
                Envelope::Rejected { opcode }
            }
        };

        Ok(envelope.encode()?)
    }

    /// Run a decoded request.
    pub fn dispatch(&mut self, request: Request) -> Envelope {
        let opcode = request.opcode();
        debug!(op = opcode.name(), "dispatching");

        match self.service(request) {
            Ok(response) => Envelope::Serviced(response),
            Err(err) => {
                warn!(op = opcode.name(), error = %err, "request rejected");
                Envelope::Rejected {
                    opcode: opcode.as_u16(),
                }
            }
        }
    }

    fn service(&mut self, request: Request) -> Result<Response> {
        let response = match request {
            Request::EsOutAdd { format } => Response::EsOutAdd {
                handle: self.attached_es_out_mut()?.add(format.as_ref())?,
            },
            Request::EsOutSend { handle, block } => Response::EsOutSend {
                status: self.attached_es_out()?.send(handle, block.as_ref())?,
            },
            Request::EsOutDel { handle } => {
                self.attached_es_out_mut()?.del(handle);
                Response::EsOutDel
            }
            Request::EsOutDestroy => {
                self.attached_es_out_mut()?.destroy();
                Response::EsOutDestroy
            }
            Request::EsOutSetPcr { pcr } => Response::EsOutSetPcr {
                status: self.attached_es_out()?.control_set_pcr(pcr)?,
            },
            Request::EsOutSetNextDisplayTime { pts } => Response::EsOutSetNextDisplayTime {
                status: self.attached_es_out()?.control_set_next_display_time(pts)?,
            },

            Request::CanSeek => Response::CanSeek(self.attached_control()?.can_seek()),
            Request::CanFastSeek => Response::CanFastSeek(self.attached_control()?.can_fast_seek()),
            Request::CanPause => Response::CanPause(self.attached_control()?.can_pause()),
            Request::CanControlPace => {
                Response::CanControlPace(self.attached_control()?.can_control_pace())
            }
            Request::GetSize => Response::GetSize(self.attached_control()?.get_size()),
            Request::GetPtsDelay => Response::GetPtsDelay(self.attached_control()?.get_pts_delay()),
            Request::SetPauseState { state } => Response::SetPauseState {
                status: self.attached_control()?.set_pause_state(state),
            },

            Request::AccessRead { length } => {
                let reply = self.attached_access()?.read(length)?;
                Response::AccessRead {
                    status: reply.status,
                    data: reply.data,
                }
            }
            Request::AccessBlock => {
                let reply = self.attached_access()?.block();
                Response::AccessBlock {
                    eof: reply.eof,
                    block: reply.block,
                }
            }
            Request::AccessSeek { offset } => Response::AccessSeek {
                status: self.attached_access()?.seek(offset),
            },
            Request::AccessDestroy => {
                self.attached_access()?.destroy();
                Response::AccessDestroy
            }

            Request::Demux => Response::Demux {
                result: self.attached_demux()?.demux(),
            },
            Request::DemuxCanSeek => {
                Response::DemuxCanSeek(self.attached_demux_control()?.can_seek())
            }
            Request::DemuxCanPause => {
                Response::DemuxCanPause(self.attached_demux_control()?.can_pause())
            }
            Request::DemuxCanControlPace => {
                Response::DemuxCanControlPace(self.attached_demux_control()?.can_control_pace())
            }
            Request::DemuxGetPtsDelay => {
                Response::DemuxGetPtsDelay(self.attached_demux_control()?.get_pts_delay())
            }
            Request::DemuxSetPauseState { state } => Response::DemuxSetPauseState {
                status: self.attached_demux_control()?.set_pause_state(state),
            },
        };

        Ok(response)
    }

    fn attached_es_out(&self) -> Result<&EsOutService> {
        self.es_out
            .as_ref()
            .ok_or(SessionError::ServiceMissing("es_out"))
    }

    fn attached_es_out_mut(&mut self) -> Result<&mut EsOutService> {
        self.es_out
            .as_mut()
            .ok_or(SessionError::ServiceMissing("es_out"))
    }

    fn attached_control(&self) -> Result<&StreamControlService> {
        self.control
            .as_ref()
            .ok_or(SessionError::ServiceMissing("control"))
    }

    fn attached_access(&self) -> Result<&StreamAccessService> {
        self.access
            .as_ref()
            .ok_or(SessionError::ServiceMissing("access"))
    }

    fn attached_demux(&self) -> Result<&DemuxService> {
        self.demux
            .as_ref()
            .ok_or(SessionError::ServiceMissing("demux"))
    }

    fn attached_demux_control(&self) -> Result<&StreamControlService> {
        self.demux_control
            .as_ref()
            .ok_or(SessionError::ServiceMissing("demux_control"))
    }
}
