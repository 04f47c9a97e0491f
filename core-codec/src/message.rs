//! # Wire Message Set
//!
//! One request and one response per bridge operation.
//!
//! ```text
//! request  := opcode:u16 fields...
//! response := opcode:u16 serviced:u8 [fields...]   (fields only when serviced = 1)
//! ```
//!
//! A response that is not serviced carries no fields: the request was
//! malformed or could not be routed, and no host call was made.

use bytes::Bytes;

use crate::block::EsBlock;
use crate::error::{CodecError, Result};
use crate::format::EsFormat;
use crate::wire::{WireReader, WireWriter};

/// Operation identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Opcode {
    EsOutAdd = 0x0101,
    EsOutSend = 0x0102,
    EsOutDel = 0x0103,
    EsOutDestroy = 0x0104,
    EsOutSetPcr = 0x0105,
    EsOutSetNextDisplayTime = 0x0106,

    CanSeek = 0x0201,
    CanFastSeek = 0x0202,
    CanPause = 0x0203,
    CanControlPace = 0x0204,
    GetSize = 0x0205,
    GetPtsDelay = 0x0206,
    SetPauseState = 0x0207,

    AccessRead = 0x0301,
    AccessBlock = 0x0302,
    AccessSeek = 0x0303,
    AccessDestroy = 0x0304,

    Demux = 0x0401,
    DemuxCanSeek = 0x0402,
    DemuxCanPause = 0x0403,
    DemuxCanControlPace = 0x0404,
    DemuxGetPtsDelay = 0x0405,
    DemuxSetPauseState = 0x0406,
}

impl Opcode {
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    pub fn name(self) -> &'static str {
        match self {
            Opcode::EsOutAdd => "es_out.add",
            Opcode::EsOutSend => "es_out.send",
            Opcode::EsOutDel => "es_out.del",
            Opcode::EsOutDestroy => "es_out.destroy",
            Opcode::EsOutSetPcr => "es_out.set_pcr",
            Opcode::EsOutSetNextDisplayTime => "es_out.set_next_display_time",
            Opcode::CanSeek => "control.can_seek",
            Opcode::CanFastSeek => "control.can_fastseek",
            Opcode::CanPause => "control.can_pause",
            Opcode::CanControlPace => "control.can_control_pace",
            Opcode::GetSize => "control.get_size",
            Opcode::GetPtsDelay => "control.get_pts_delay",
            Opcode::SetPauseState => "control.set_pause_state",
            Opcode::AccessRead => "access.read",
            Opcode::AccessBlock => "access.block",
            Opcode::AccessSeek => "access.seek",
            Opcode::AccessDestroy => "access.destroy",
            Opcode::Demux => "demux.demux",
            Opcode::DemuxCanSeek => "demux_control.can_seek",
            Opcode::DemuxCanPause => "demux_control.can_pause",
            Opcode::DemuxCanControlPace => "demux_control.can_control_pace",
            Opcode::DemuxGetPtsDelay => "demux_control.get_pts_delay",
            Opcode::DemuxSetPauseState => "demux_control.set_pause_state",
        }
    }
}

impl TryFrom<u16> for Opcode {
    type Error = CodecError;

    fn try_from(value: u16) -> Result<Self> {
        let opcode = match value {
            0x0101 => Opcode::EsOutAdd,
            0x0102 => Opcode::EsOutSend,
            0x0103 => Opcode::EsOutDel,
            0x0104 => Opcode::EsOutDestroy,
            0x0105 => Opcode::EsOutSetPcr,
            0x0106 => Opcode::EsOutSetNextDisplayTime,
            0x0201 => Opcode::CanSeek,
            0x0202 => Opcode::CanFastSeek,
            0x0203 => Opcode::CanPause,
            0x0204 => Opcode::CanControlPace,
            0x0205 => Opcode::GetSize,
            0x0206 => Opcode::GetPtsDelay,
            0x0207 => Opcode::SetPauseState,
            0x0301 => Opcode::AccessRead,
            0x0302 => Opcode::AccessBlock,
            0x0303 => Opcode::AccessSeek,
            0x0304 => Opcode::AccessDestroy,
            0x0401 => Opcode::Demux,
            0x0402 => Opcode::DemuxCanSeek,
            0x0403 => Opcode::DemuxCanPause,
            0x0404 => Opcode::DemuxCanControlPace,
            0x0405 => Opcode::DemuxGetPtsDelay,
            0x0406 => Opcode::DemuxSetPauseState,
            other => return Err(CodecError::UnknownOpcode(other)),
        };
        Ok(opcode)
    }
}

/// Status code plus out-value returned by a relayed control query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlReply<T> {
    /// The host call's own status, never reinterpreted.
    pub status: i64,
    /// The out-parameter the host filled in.
    pub value: T,
}

impl<T> ControlReply<T> {
    pub fn new(status: i64, value: T) -> Self {
        Self { status, value }
    }
}

/// A request issued by the isolated module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    EsOutAdd { format: Option<EsFormat> },
    EsOutSend { handle: u64, block: Option<EsBlock> },
    EsOutDel { handle: u64 },
    EsOutDestroy,
    EsOutSetPcr { pcr: i64 },
    EsOutSetNextDisplayTime { pts: i64 },

    CanSeek,
    CanFastSeek,
    CanPause,
    CanControlPace,
    GetSize,
    GetPtsDelay,
    SetPauseState { state: bool },

    AccessRead { length: u64 },
    AccessBlock,
    AccessSeek { offset: u64 },
    AccessDestroy,

    Demux,
    /// Control queries addressed to the demuxer rather than the stream.
    DemuxCanSeek,
    DemuxCanPause,
    DemuxCanControlPace,
    DemuxGetPtsDelay,
    DemuxSetPauseState { state: bool },
}

impl Request {
    pub fn opcode(&self) -> Opcode {
        match self {
            Request::EsOutAdd { .. } => Opcode::EsOutAdd,
            Request::EsOutSend { .. } => Opcode::EsOutSend,
            Request::EsOutDel { .. } => Opcode::EsOutDel,
            Request::EsOutDestroy => Opcode::EsOutDestroy,
            Request::EsOutSetPcr { .. } => Opcode::EsOutSetPcr,
            Request::EsOutSetNextDisplayTime { .. } => Opcode::EsOutSetNextDisplayTime,
            Request::CanSeek => Opcode::CanSeek,
            Request::CanFastSeek => Opcode::CanFastSeek,
            Request::CanPause => Opcode::CanPause,
            Request::CanControlPace => Opcode::CanControlPace,
            Request::GetSize => Opcode::GetSize,
            Request::GetPtsDelay => Opcode::GetPtsDelay,
            Request::SetPauseState { .. } => Opcode::SetPauseState,
            Request::AccessRead { .. } => Opcode::AccessRead,
            Request::AccessBlock => Opcode::AccessBlock,
            Request::AccessSeek { .. } => Opcode::AccessSeek,
            Request::AccessDestroy => Opcode::AccessDestroy,
            Request::Demux => Opcode::Demux,
            Request::DemuxCanSeek => Opcode::DemuxCanSeek,
            Request::DemuxCanPause => Opcode::DemuxCanPause,
            Request::DemuxCanControlPace => Opcode::DemuxCanControlPace,
            Request::DemuxGetPtsDelay => Opcode::DemuxGetPtsDelay,
            Request::DemuxSetPauseState { .. } => Opcode::DemuxSetPauseState,
        }
    }

    /// Raw opcode of a frame, if it is at least two bytes long.
    ///
    /// Used to address a rejection when the rest of the frame is unreadable.
    pub fn peek_opcode(frame: &[u8]) -> Option<u16> {
        let bytes = frame.get(..2)?;
        Some(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn encode(&self) -> Result<Bytes> {
        let mut w = WireWriter::new();
        w.put_u16(self.opcode().as_u16());

        match self {
            Request::EsOutAdd { format } => {
                w.put_option(format.as_ref(), write_format)?;
            }
            Request::EsOutSend { handle, block } => {
                w.put_u64(*handle);
                w.put_option(block.as_ref(), write_block)?;
            }
            Request::EsOutDel { handle } => w.put_u64(*handle),
            Request::EsOutSetPcr { pcr } => w.put_i64(*pcr),
            Request::EsOutSetNextDisplayTime { pts } => w.put_i64(*pts),
            Request::SetPauseState { state } | Request::DemuxSetPauseState { state } => {
                w.put_bool(*state)
            }
            Request::AccessRead { length } => w.put_u64(*length),
            Request::AccessSeek { offset } => w.put_u64(*offset),
            Request::EsOutDestroy
            | Request::CanSeek
            | Request::CanFastSeek
            | Request::CanPause
            | Request::CanControlPace
            | Request::GetSize
            | Request::GetPtsDelay
            | Request::AccessBlock
            | Request::AccessDestroy
            | Request::Demux
            | Request::DemuxCanSeek
            | Request::DemuxCanPause
            | Request::DemuxCanControlPace
            | Request::DemuxGetPtsDelay => {}
        }

        Ok(w.finish())
    }

    /// Decode a request frame no larger than `max_frame_bytes`.
    pub fn decode(frame: Bytes, max_frame_bytes: usize) -> Result<Self> {
        if frame.len() > max_frame_bytes {
            return Err(CodecError::FrameTooLarge {
                size: frame.len(),
                max: max_frame_bytes,
            });
        }

        let mut r = WireReader::new(frame);
        let opcode = Opcode::try_from(r.read_u16()?)?;

        let request = match opcode {
            Opcode::EsOutAdd => Request::EsOutAdd {
                format: r.read_option(read_format)?,
            },
            Opcode::EsOutSend => Request::EsOutSend {
                handle: r.read_u64()?,
                block: r.read_option(read_block)?,
            },
            Opcode::EsOutDel => Request::EsOutDel {
                handle: r.read_u64()?,
            },
            Opcode::EsOutDestroy => Request::EsOutDestroy,
            Opcode::EsOutSetPcr => Request::EsOutSetPcr { pcr: r.read_i64()? },
            Opcode::EsOutSetNextDisplayTime => Request::EsOutSetNextDisplayTime {
                pts: r.read_i64()?,
            },
            Opcode::CanSeek => Request::CanSeek,
            Opcode::CanFastSeek => Request::CanFastSeek,
            Opcode::CanPause => Request::CanPause,
            Opcode::CanControlPace => Request::CanControlPace,
            Opcode::GetSize => Request::GetSize,
            Opcode::GetPtsDelay => Request::GetPtsDelay,
            Opcode::SetPauseState => Request::SetPauseState {
                state: r.read_bool()?,
            },
            Opcode::AccessRead => Request::AccessRead {
                length: r.read_u64()?,
            },
            Opcode::AccessBlock => Request::AccessBlock,
            Opcode::AccessSeek => Request::AccessSeek {
                offset: r.read_u64()?,
            },
            Opcode::AccessDestroy => Request::AccessDestroy,
            Opcode::Demux => Request::Demux,
            Opcode::DemuxCanSeek => Request::DemuxCanSeek,
            Opcode::DemuxCanPause => Request::DemuxCanPause,
            Opcode::DemuxCanControlPace => Request::DemuxCanControlPace,
            Opcode::DemuxGetPtsDelay => Request::DemuxGetPtsDelay,
            Opcode::DemuxSetPauseState => Request::DemuxSetPauseState {
                state: r.read_bool()?,
            },
        };

        r.finish()?;
        Ok(request)
    }
}

/// Typed result of a serviced request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    EsOutAdd { handle: u64 },
    EsOutSend { status: i32 },
    EsOutDel,
    EsOutDestroy,
    EsOutSetPcr { status: i64 },
    EsOutSetNextDisplayTime { status: i64 },

    CanSeek(ControlReply<bool>),
    CanFastSeek(ControlReply<bool>),
    CanPause(ControlReply<bool>),
    CanControlPace(ControlReply<bool>),
    GetSize(ControlReply<u64>),
    GetPtsDelay(ControlReply<i64>),
    SetPauseState { status: i64 },

    AccessRead { status: i64, data: Bytes },
    AccessBlock { eof: bool, block: Option<EsBlock> },
    AccessSeek { status: i32 },
    AccessDestroy,

    Demux { result: i32 },
    DemuxCanSeek(ControlReply<bool>),
    DemuxCanPause(ControlReply<bool>),
    DemuxCanControlPace(ControlReply<bool>),
    DemuxGetPtsDelay(ControlReply<i64>),
    DemuxSetPauseState { status: i64 },
}

impl Response {
    pub fn opcode(&self) -> Opcode {
        match self {
            Response::EsOutAdd { .. } => Opcode::EsOutAdd,
            Response::EsOutSend { .. } => Opcode::EsOutSend,
            Response::EsOutDel => Opcode::EsOutDel,
            Response::EsOutDestroy => Opcode::EsOutDestroy,
            Response::EsOutSetPcr { .. } => Opcode::EsOutSetPcr,
            Response::EsOutSetNextDisplayTime { .. } => Opcode::EsOutSetNextDisplayTime,
            Response::CanSeek(_) => Opcode::CanSeek,
            Response::CanFastSeek(_) => Opcode::CanFastSeek,
            Response::CanPause(_) => Opcode::CanPause,
            Response::CanControlPace(_) => Opcode::CanControlPace,
            Response::GetSize(_) => Opcode::GetSize,
            Response::GetPtsDelay(_) => Opcode::GetPtsDelay,
            Response::SetPauseState { .. } => Opcode::SetPauseState,
            Response::AccessRead { .. } => Opcode::AccessRead,
            Response::AccessBlock { .. } => Opcode::AccessBlock,
            Response::AccessSeek { .. } => Opcode::AccessSeek,
            Response::AccessDestroy => Opcode::AccessDestroy,
            Response::Demux { .. } => Opcode::Demux,
            Response::DemuxCanSeek(_) => Opcode::DemuxCanSeek,
            Response::DemuxCanPause(_) => Opcode::DemuxCanPause,
            Response::DemuxCanControlPace(_) => Opcode::DemuxCanControlPace,
            Response::DemuxGetPtsDelay(_) => Opcode::DemuxGetPtsDelay,
            Response::DemuxSetPauseState { .. } => Opcode::DemuxSetPauseState,
        }
    }

    fn write_payload(&self, w: &mut WireWriter) -> Result<()> {
        match self {
            Response::EsOutAdd { handle } => w.put_u64(*handle),
            Response::EsOutSend { status } => w.put_i32(*status),
            Response::EsOutSetPcr { status }
            | Response::EsOutSetNextDisplayTime { status }
            | Response::SetPauseState { status }
            | Response::DemuxSetPauseState { status } => w.put_i64(*status),
            Response::CanSeek(reply)
            | Response::CanFastSeek(reply)
            | Response::CanPause(reply)
            | Response::CanControlPace(reply)
            | Response::DemuxCanSeek(reply)
            | Response::DemuxCanPause(reply)
            | Response::DemuxCanControlPace(reply) => {
                w.put_i64(reply.status);
                w.put_bool(reply.value);
            }
            Response::GetSize(reply) => {
                w.put_i64(reply.status);
                w.put_u64(reply.value);
            }
            Response::GetPtsDelay(reply) | Response::DemuxGetPtsDelay(reply) => {
                w.put_i64(reply.status);
                w.put_i64(reply.value);
            }
            Response::AccessRead { status, data } => {
                w.put_i64(*status);
                w.put_bytes(data)?;
            }
            Response::AccessBlock { eof, block } => {
                w.put_bool(*eof);
                w.put_option(block.as_ref(), write_block)?;
            }
            Response::AccessSeek { status } => w.put_i32(*status),
            Response::Demux { result } => w.put_i32(*result),
            Response::EsOutDel | Response::EsOutDestroy | Response::AccessDestroy => {}
        }
        Ok(())
    }

    fn read_payload(opcode: Opcode, r: &mut WireReader) -> Result<Self> {
        let response = match opcode {
            Opcode::EsOutAdd => Response::EsOutAdd {
                handle: r.read_u64()?,
            },
            Opcode::EsOutSend => Response::EsOutSend {
                status: r.read_i32()?,
            },
            Opcode::EsOutDel => Response::EsOutDel,
            Opcode::EsOutDestroy => Response::EsOutDestroy,
            Opcode::EsOutSetPcr => Response::EsOutSetPcr {
                status: r.read_i64()?,
            },
            Opcode::EsOutSetNextDisplayTime => Response::EsOutSetNextDisplayTime {
                status: r.read_i64()?,
            },
            Opcode::CanSeek => Response::CanSeek(read_bool_reply(r)?),
            Opcode::CanFastSeek => Response::CanFastSeek(read_bool_reply(r)?),
            Opcode::CanPause => Response::CanPause(read_bool_reply(r)?),
            Opcode::CanControlPace => Response::CanControlPace(read_bool_reply(r)?),
            Opcode::GetSize => {
                let status = r.read_i64()?;
                Response::GetSize(ControlReply::new(status, r.read_u64()?))
            }
            Opcode::GetPtsDelay => {
                let status = r.read_i64()?;
                Response::GetPtsDelay(ControlReply::new(status, r.read_i64()?))
            }
            Opcode::SetPauseState => Response::SetPauseState {
                status: r.read_i64()?,
            },
            Opcode::AccessRead => Response::AccessRead {
                status: r.read_i64()?,
                data: r.read_bytes()?,
            },
            Opcode::AccessBlock => Response::AccessBlock {
                eof: r.read_bool()?,
                block: r.read_option(read_block)?,
            },
            Opcode::AccessSeek => Response::AccessSeek {
                status: r.read_i32()?,
            },
            Opcode::AccessDestroy => Response::AccessDestroy,
            Opcode::Demux => Response::Demux {
                result: r.read_i32()?,
            },
            Opcode::DemuxCanSeek => Response::DemuxCanSeek(read_bool_reply(r)?),
            Opcode::DemuxCanPause => Response::DemuxCanPause(read_bool_reply(r)?),
            Opcode::DemuxCanControlPace => Response::DemuxCanControlPace(read_bool_reply(r)?),
            Opcode::DemuxGetPtsDelay => {
                let status = r.read_i64()?;
                Response::DemuxGetPtsDelay(ControlReply::new(status, r.read_i64()?))
            }
            Opcode::DemuxSetPauseState => Response::DemuxSetPauseState {
                status: r.read_i64()?,
            },
        };
        Ok(response)
    }
}

/// A response frame: either a serviced result or a rejection.
///
/// Transport success and operation status are kept apart: a serviced
/// response may still carry a failing host status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    Serviced(Response),
    Rejected { opcode: u16 },
}

impl Envelope {
    pub fn is_serviced(&self) -> bool {
        matches!(self, Envelope::Serviced(_))
    }

    pub fn opcode(&self) -> u16 {
        match self {
            Envelope::Serviced(response) => response.opcode().as_u16(),
            Envelope::Rejected { opcode } => *opcode,
        }
    }

    pub fn encode(&self) -> Result<Bytes> {
        let mut w = WireWriter::new();
        w.put_u16(self.opcode());

        match self {
            Envelope::Serviced(response) => {
                w.put_bool(true);
                response.write_payload(&mut w)?;
            }
            Envelope::Rejected { .. } => w.put_bool(false),
        }

        Ok(w.finish())
    }

    pub fn decode(frame: Bytes) -> Result<Self> {
        let mut r = WireReader::new(frame);
        let raw_opcode = r.read_u16()?;

        let envelope = if r.read_bool()? {
            let opcode = Opcode::try_from(raw_opcode)?;
            Envelope::Serviced(Response::read_payload(opcode, &mut r)?)
        } else {
            Envelope::Rejected { opcode: raw_opcode }
        };

        r.finish()?;
        Ok(envelope)
    }
}

fn read_bool_reply(r: &mut WireReader) -> Result<ControlReply<bool>> {
    let status = r.read_i64()?;
    Ok(ControlReply::new(status, r.read_bool()?))
}

fn write_format(w: &mut WireWriter, format: &EsFormat) -> Result<()> {
    w.put_bytes(&format.raw_struct)?;
    w.put_option(format.extra.as_ref(), |w, b| w.put_bytes(b))?;
    w.put_option(format.extra_languages.as_ref(), |w, b| w.put_bytes(b))
}

fn read_format(r: &mut WireReader) -> Result<EsFormat> {
    Ok(EsFormat {
        raw_struct: r.read_bytes()?,
        extra: r.read_option(WireReader::read_bytes)?,
        extra_languages: r.read_option(WireReader::read_bytes)?,
    })
}

fn write_block(w: &mut WireWriter, block: &EsBlock) -> Result<()> {
    w.put_bytes(&block.buffer)?;
    w.put_u32(block.flags);
    w.put_u32(block.nb_samples);
    w.put_i64(block.pts);
    w.put_i64(block.dts);
    w.put_i64(block.length);
    Ok(())
}

fn read_block(r: &mut WireReader) -> Result<EsBlock> {
    Ok(EsBlock {
        buffer: r.read_bytes()?,
        flags: r.read_u32()?,
        nb_samples: r.read_u32()?,
        pts: r.read_i64()?,
        dts: r.read_i64()?,
        length: r.read_i64()?,
    })
}
