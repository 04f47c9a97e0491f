//! End-to-end tests for BridgeSession
//!
//! Frames go in, frames come out. A fake host records every call so the
//! tests can check that rejected requests never reach it.

use std::sync::Arc;

use bridge_traits::access::StreamAccess;
use bridge_traits::control::{StreamControl, StreamQuery};
use bridge_traits::es_out::EsOutput;
use bridge_traits::media::{status, EsOutId, FieldSpan, FormatLayout, HostBlock, HostFormat};
use bytes::Bytes;
use core_codec::{ControlReply, Envelope, EsBlock, EsFormat, Request, Response};
use core_runtime::config::BridgeConfig;
use core_service::{BridgeSession, HostServices};
use parking_lot::Mutex;

// ============================================================================
// Fake host
// ============================================================================

#[derive(Default)]
struct FakeHost {
    log: Mutex<Vec<String>>,
    outputs: Mutex<u64>,
    paused: Mutex<bool>,
}

impl FakeHost {
    fn log(&self) -> Vec<String> {
        self.log.lock().clone()
    }

    fn record(&self, entry: impl Into<String>) {
        self.log.lock().push(entry.into());
    }
}

impl EsOutput for FakeHost {
    fn add(&self, format: &HostFormat) -> Option<EsOutId> {
        self.record(format!("add extra={:?}", format.extra().map(<[u8]>::len)));
        let mut outputs = self.outputs.lock();
        *outputs += 1;
        Some(EsOutId::new(0xabc0 + *outputs))
    }

    fn send(&self, id: EsOutId, block: Option<HostBlock>) -> i32 {
        match block {
            Some(block) => self.record(format!("send {} {}b", id, block.buffer.len())),
            None => self.record(format!("flush {}", id)),
        }
        0
    }

    fn del(&self, id: EsOutId) {
        self.record(format!("del {}", id));
    }

    fn destroy(&self) {
        self.record("destroy");
    }

    fn set_pcr(&self, pcr: i64) -> i64 {
        self.record(format!("pcr {}", pcr));
        status::SUCCESS
    }

    fn set_next_display_time(&self, pts: i64) -> i64 {
        self.record(format!("next_display {}", pts));
        status::EGENERIC
    }
}

impl StreamControl for FakeHost {
    fn control(&self, query: StreamQuery<'_>) -> i64 {
        self.record(query.name());
        match query {
            StreamQuery::CanSeek(out) => {
                *out = true;
                status::SUCCESS
            }
            StreamQuery::CanPause(out) => {
                *out = false;
                status::EGENERIC
            }
            StreamQuery::GetPtsDelay(out) => {
                *out = 300_000;
                status::SUCCESS
            }
            StreamQuery::GetSize(out) => {
                *out = 1 << 40;
                status::SUCCESS
            }
            StreamQuery::SetPauseState(paused) => {
                *self.paused.lock() = paused;
                status::SUCCESS
            }
            StreamQuery::CanFastSeek(_) | StreamQuery::CanControlPace(_) => status::EGENERIC,
        }
    }
}

impl StreamAccess for FakeHost {
    fn read(&self, buf: &mut [u8]) -> i64 {
        self.record(format!("read {}", buf.len()));
        let data = b"0123456789";
        let n = buf.len().min(data.len());
        buf[..n].copy_from_slice(&data[..n]);
        n as i64
    }

    fn read_block(&self) -> Option<HostBlock> {
        self.record("read_block");
        Some(HostBlock {
            buffer: vec![1, 2, 3],
            pts: 10,
            dts: 10,
            ..Default::default()
        })
    }

    fn eof(&self) -> bool {
        false
    }

    fn seek(&self, offset: u64) -> i32 {
        self.record(format!("seek {}", offset));
        0
    }
}

/// Demuxer-side control: can seek and pause, never controls pace.
#[derive(Default)]
struct DemuxControlHost {
    queries: Mutex<Vec<&'static str>>,
    paused: Mutex<Option<bool>>,
}

impl StreamControl for DemuxControlHost {
    fn control(&self, query: StreamQuery<'_>) -> i64 {
        self.queries.lock().push(query.name());
        match query {
            StreamQuery::CanSeek(out) | StreamQuery::CanPause(out) => *out = true,
            StreamQuery::CanControlPace(out) => *out = false,
            StreamQuery::GetPtsDelay(out) => *out = 1_000,
            StreamQuery::SetPauseState(paused) => *self.paused.lock() = Some(paused),
            StreamQuery::CanFastSeek(_) | StreamQuery::GetSize(_) => return status::EGENERIC,
        }
        status::SUCCESS
    }
}

// ============================================================================
// Helpers
// ============================================================================

const HEADER: usize = 40;

fn config() -> BridgeConfig {
    BridgeConfig::builder()
        .format_layout(FormatLayout {
            header_size: HEADER,
            extra_len: FieldSpan::new(8, 4),
            extra_ptr: FieldSpan::new(16, 8),
            extra_languages_len: FieldSpan::new(12, 4),
            extra_languages_ptr: FieldSpan::new(24, 8),
        })
        .max_frame_bytes(4096)
        .max_read_bytes(64)
        .build()
        .unwrap()
}

fn full_session() -> (Arc<FakeHost>, BridgeSession) {
    let host = Arc::new(FakeHost::default());
    let hosts = HostServices::new()
        .with_es_out(host.clone())
        .with_control(host.clone())
        .with_access(host.clone());
    (host, BridgeSession::new(config(), hosts).unwrap())
}

fn call(session: &mut BridgeSession, request: Request) -> Envelope {
    let frame = request.encode().unwrap();
    Envelope::decode(session.handle_frame(frame).unwrap()).unwrap()
}

fn add_request() -> Request {
    Request::EsOutAdd {
        format: Some(EsFormat::new(vec![0u8; HEADER]).with_extra(&b"cfg"[..])),
    }
}

// ============================================================================
// Stream output over frames
// ============================================================================

#[test]
fn test_stream_output_lifecycle() {
    let (host, mut session) = full_session();

    assert_eq!(
        call(&mut session, add_request()),
        Envelope::Serviced(Response::EsOutAdd { handle: 1 })
    );
    assert_eq!(
        call(&mut session, add_request()),
        Envelope::Serviced(Response::EsOutAdd { handle: 2 })
    );

    let send = Request::EsOutSend {
        handle: 1,
        block: Some(EsBlock::new(&b"hello"[..]).with_timing(1000, 1000, 40)),
    };
    assert_eq!(
        call(&mut session, send.clone()),
        Envelope::Serviced(Response::EsOutSend { status: 0 })
    );
    assert_eq!(
        call(&mut session, Request::EsOutDel { handle: 1 }),
        Envelope::Serviced(Response::EsOutDel)
    );
    // A dead handle is a serviced request with a failing status
    assert_eq!(
        call(&mut session, send),
        Envelope::Serviced(Response::EsOutSend { status: -1 })
    );
    assert_eq!(
        call(&mut session, Request::EsOutSend { handle: 2, block: None }),
        Envelope::Serviced(Response::EsOutSend { status: 0 })
    );

    assert_eq!(
        host.log(),
        vec![
            "add extra=Some(3)",
            "add extra=Some(3)",
            "send es#43969 5b",
            "del es#43969",
            "flush es#43970",
        ]
    );
}

#[test]
fn test_size_mismatch_is_not_serviced() {
    let (host, mut session) = full_session();

    let request = Request::EsOutAdd {
        format: Some(EsFormat::new(vec![0u8; HEADER + 1])),
    };
    assert_eq!(
        call(&mut session, request),
        Envelope::Rejected { opcode: 0x0101 }
    );
    assert!(host.log().is_empty());
}

#[test]
fn test_missing_format_is_not_serviced() {
    let (host, mut session) = full_session();

    assert_eq!(
        call(&mut session, Request::EsOutAdd { format: None }),
        Envelope::Rejected { opcode: 0x0101 }
    );
    assert!(host.log().is_empty());
}

#[test]
fn test_destroy_then_add() {
    let (host, mut session) = full_session();
    call(&mut session, add_request());

    assert_eq!(
        call(&mut session, Request::EsOutDestroy),
        Envelope::Serviced(Response::EsOutDestroy)
    );
    assert_eq!(
        call(&mut session, Request::EsOutDestroy),
        Envelope::Serviced(Response::EsOutDestroy)
    );
    assert_eq!(
        call(&mut session, add_request()),
        Envelope::Rejected { opcode: 0x0101 }
    );
    assert_eq!(host.log(), vec!["add extra=Some(3)", "destroy"]);
}

#[test]
fn test_clock_statuses_relayed() {
    let (_host, mut session) = full_session();

    assert_eq!(
        call(&mut session, Request::EsOutSetPcr { pcr: 90_000 }),
        Envelope::Serviced(Response::EsOutSetPcr { status: 0 })
    );
    assert_eq!(
        call(&mut session, Request::EsOutSetNextDisplayTime { pts: 5 }),
        Envelope::Serviced(Response::EsOutSetNextDisplayTime { status: -1 })
    );
}

// ============================================================================
// Control and access over frames
// ============================================================================

#[test]
fn test_control_replies() {
    let (host, mut session) = full_session();

    assert_eq!(
        call(&mut session, Request::CanSeek),
        Envelope::Serviced(Response::CanSeek(ControlReply::new(0, true)))
    );
    assert_eq!(
        call(&mut session, Request::CanPause),
        Envelope::Serviced(Response::CanPause(ControlReply::new(-1, false)))
    );
    assert_eq!(
        call(&mut session, Request::CanControlPace),
        Envelope::Serviced(Response::CanControlPace(ControlReply::new(-1, false)))
    );
    assert_eq!(
        call(&mut session, Request::GetPtsDelay),
        Envelope::Serviced(Response::GetPtsDelay(ControlReply::new(0, 300_000)))
    );
    assert_eq!(
        call(&mut session, Request::GetSize),
        Envelope::Serviced(Response::GetSize(ControlReply::new(0, 1 << 40)))
    );
    assert_eq!(
        call(&mut session, Request::SetPauseState { state: true }),
        Envelope::Serviced(Response::SetPauseState { status: 0 })
    );
    assert!(*host.paused.lock());
}

#[test]
fn test_access_replies() {
    let (host, mut session) = full_session();

    assert_eq!(
        call(&mut session, Request::AccessRead { length: 4 }),
        Envelope::Serviced(Response::AccessRead {
            status: 4,
            data: Bytes::from_static(b"0123"),
        })
    );
    assert_eq!(
        call(&mut session, Request::AccessRead { length: 65 }),
        Envelope::Rejected { opcode: 0x0301 }
    );
    assert_eq!(
        call(&mut session, Request::AccessSeek { offset: 7 }),
        Envelope::Serviced(Response::AccessSeek { status: 0 })
    );

    let Envelope::Serviced(Response::AccessBlock { eof, block }) =
        call(&mut session, Request::AccessBlock)
    else {
        panic!("expected a serviced block reply");
    };
    assert!(!eof);
    let block = block.unwrap();
    assert_eq!(&block.buffer[..], &[1, 2, 3]);
    assert_eq!(block.pts, 10);

    assert_eq!(
        call(&mut session, Request::AccessDestroy),
        Envelope::Serviced(Response::AccessDestroy)
    );
    assert_eq!(host.log(), vec!["read 4", "seek 7", "read_block"]);
}

#[test]
fn test_stream_and_demux_control_are_relayed_independently() {
    let host = Arc::new(FakeHost::default());
    let demux = Arc::new(DemuxControlHost::default());
    let hosts = HostServices::new()
        .with_control(host.clone())
        .with_demux_control(demux.clone());
    let mut session = BridgeSession::new(config(), hosts).unwrap();

    assert_eq!(
        call(&mut session, Request::CanPause),
        Envelope::Serviced(Response::CanPause(ControlReply::new(-1, false)))
    );
    assert_eq!(
        call(&mut session, Request::DemuxCanPause),
        Envelope::Serviced(Response::DemuxCanPause(ControlReply::new(0, true)))
    );
    assert_eq!(
        call(&mut session, Request::DemuxCanSeek),
        Envelope::Serviced(Response::DemuxCanSeek(ControlReply::new(0, true)))
    );
    assert_eq!(
        call(&mut session, Request::DemuxCanControlPace),
        Envelope::Serviced(Response::DemuxCanControlPace(ControlReply::new(0, false)))
    );
    assert_eq!(
        call(&mut session, Request::GetPtsDelay),
        Envelope::Serviced(Response::GetPtsDelay(ControlReply::new(0, 300_000)))
    );
    assert_eq!(
        call(&mut session, Request::DemuxGetPtsDelay),
        Envelope::Serviced(Response::DemuxGetPtsDelay(ControlReply::new(0, 1_000)))
    );
    assert_eq!(
        call(&mut session, Request::DemuxSetPauseState { state: true }),
        Envelope::Serviced(Response::DemuxSetPauseState { status: 0 })
    );

    // Pausing the demuxer leaves the stream untouched
    assert!(!*host.paused.lock());
    assert_eq!(*demux.paused.lock(), Some(true));
    assert_eq!(host.log(), vec!["can_pause", "get_pts_delay"]);
    assert_eq!(
        *demux.queries.lock(),
        vec![
            "can_pause",
            "can_seek",
            "can_control_pace",
            "get_pts_delay",
            "set_pause_state"
        ]
    );
}

#[test]
fn test_demux_control_requires_its_own_host() {
    let (host, mut session) = full_session();

    assert_eq!(
        call(&mut session, Request::DemuxCanSeek),
        Envelope::Rejected { opcode: 0x0402 }
    );
    assert_eq!(
        call(&mut session, Request::DemuxSetPauseState { state: true }),
        Envelope::Rejected { opcode: 0x0406 }
    );
    assert!(host.log().is_empty());
    assert!(!*host.paused.lock());
}

// ============================================================================
// Malformed frames
// ============================================================================

#[test]
fn test_malformed_frames_are_rejected_without_host_calls() {
    let (host, mut session) = full_session();

    let cases: Vec<(Vec<u8>, u16)> = vec![
        (vec![], 0),
        (vec![0x99, 0x99], 0x9999),
        (vec![0x07, 0x02, 0x02], 0x0207),
        (vec![0x01, 0x02, 0x01], 0x0201),
        (vec![0x01, 0x01, 0x05], 0x0101),
    ];

    for (frame, opcode) in cases {
        let reply = session.handle_frame(Bytes::from(frame)).unwrap();
        assert_eq!(Envelope::decode(reply).unwrap(), Envelope::Rejected { opcode });
    }
    assert!(host.log().is_empty());
}

#[test]
fn test_oversized_frame_is_rejected() {
    let (host, mut session) = full_session();
    let mut frame = vec![0x01, 0x01, 0x01];
    frame.resize(4097, 0);

    let reply = session.handle_frame(Bytes::from(frame)).unwrap();
    assert_eq!(
        Envelope::decode(reply).unwrap(),
        Envelope::Rejected { opcode: 0x0101 }
    );
    assert!(host.log().is_empty());
}

#[test]
fn test_session_without_control_rejects_queries() {
    let host = Arc::new(FakeHost::default());
    let mut session =
        BridgeSession::new(config(), HostServices::new().with_es_out(host.clone())).unwrap();

    assert_eq!(
        call(&mut session, Request::CanSeek),
        Envelope::Rejected { opcode: 0x0201 }
    );
    assert_eq!(
        call(&mut session, Request::Demux),
        Envelope::Rejected { opcode: 0x0401 }
    );
    assert!(host.log().is_empty());
}
