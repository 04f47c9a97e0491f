//! Elementary-Stream-Output Service
//!
//! Create, feed and tear down host stream outputs on behalf of the isolated
//! module. Host identifiers stay in the service's [`HandleTable`]; only the
//! virtual handles cross the boundary.
//!
//! ## Status contract
//!
//! - A malformed request (missing or undecodable format, allocation failure)
//!   is a [`RequestError`] and no host call is made.
//! - An unresolvable handle on `send` yields [`status::EGENERIC`] without a
//!   host call; on `del` it is a no-op.
//! - Whatever the host returns is relayed untouched.

use std::sync::Arc;

use bridge_traits::es_out::EsOutput;
use bridge_traits::media::{status, EsOutId, FormatLayout};
use core_codec::{decode_block, decode_format, EsBlock, EsFormat};
use tracing::{debug, warn};

use crate::error::{HandleError, RequestError, Result};
use crate::handles::{HandleTable, NO_HANDLE};

/// Stream-output service bound to one host sink.
pub struct EsOutService {
    sink: Arc<dyn EsOutput>,
    layout: FormatLayout,
    handles: HandleTable<EsOutId>,
    destroyed: bool,
}

impl EsOutService {
    pub fn new(sink: Arc<dyn EsOutput>, layout: FormatLayout) -> Self {
        Self {
            sink,
            layout,
            handles: HandleTable::new(),
            destroyed: false,
        }
    }

    /// Create a stream output for `format`.
    ///
    /// Returns [`NO_HANDLE`] when the host refuses the format. The decoded
    /// format is dropped as soon as the host call returns.
    pub fn add(&mut self, format: Option<&EsFormat>) -> Result<u64> {
        if self.destroyed {
            warn!("es_out.add after sink destroy");
            return Err(RequestError::SinkDestroyed);
        }

        let format = format.ok_or(RequestError::MissingField("format"))?;
        let host_format = decode_format(&self.layout, format).map_err(|err| {
            warn!(error = %err, "es_out.add rejected");
            RequestError::from(err)
        })?;

        let handle = match self.sink.add(&host_format) {
            Some(id) => {
                let handle = self.handles.allocate(id);
                debug!(handle, host_id = %id, "stream output created");
                handle
            }
            None => {
                debug!("host refused stream output");
                NO_HANDLE
            }
        };

        Ok(handle)
    }

    /// Push `block` into the output behind `handle`; `None` flushes it.
    pub fn send(&self, handle: u64, block: Option<&EsBlock>) -> Result<i32> {
        let id = match self.handles.resolve(handle) {
            Ok(id) => id,
            Err(err) => {
                debug!(error = %err, "es_out.send on dead handle");
                return Ok(status::EGENERIC as i32);
            }
        };

        let block = block.map(decode_block).transpose()?;
        let flush = block.is_none();
        let result = self.sink.send(id, block);
        debug!(handle, flush, status = result, "es_out.send");
        Ok(result)
    }

    /// Delete the output behind `handle`. Unknown handles are ignored.
    pub fn del(&mut self, handle: u64) {
        match self.handles.resolve(handle) {
            Ok(id) => {
                self.sink.del(id);
                self.handles.free(handle);
                debug!(handle, host_id = %id, "stream output deleted");
            }
            Err(_) => debug!(handle, "es_out.del on dead handle ignored"),
        }
    }

    /// Tear down the host sink and every output it holds.
    ///
    /// Outputs are not deleted one by one; the host invalidates them all.
    /// Calling this again does nothing.
    pub fn destroy(&mut self) {
        if self.destroyed {
            debug!("es_out.destroy repeated");
            return;
        }

        self.sink.destroy();
        self.destroyed = true;
        let live = self.handles.destroy_all();
        debug!(live, "stream output sink destroyed");
    }

    pub fn control_set_pcr(&self, pcr: i64) -> Result<i64> {
        self.ensure_live()?;
        let result = self.sink.set_pcr(pcr);
        debug!(pcr, status = result, "es_out.set_pcr");
        Ok(result)
    }

    pub fn control_set_next_display_time(&self, pts: i64) -> Result<i64> {
        self.ensure_live()?;
        let result = self.sink.set_next_display_time(pts);
        debug!(pts, status = result, "es_out.set_next_display_time");
        Ok(result)
    }

    /// Look up the host identifier behind `handle`.
    pub fn resolve(&self, handle: u64) -> std::result::Result<EsOutId, HandleError> {
        self.handles.resolve(handle)
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Number of outputs currently alive.
    pub fn live_outputs(&self) -> usize {
        self.handles.live()
    }

    fn ensure_live(&self) -> Result<()> {
        if self.destroyed {
            warn!("es_out control after sink destroy");
            return Err(RequestError::SinkDestroyed);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::media::{FieldSpan, HostBlock, HostFormat};
    use core_codec::CodecError;
    use mockall::mock;
    use mockall::predicate::*;

    mock! {
        pub Sink {}

        impl EsOutput for Sink {
            fn add(&self, format: &HostFormat) -> Option<EsOutId>;
            fn send(&self, id: EsOutId, block: Option<HostBlock>) -> i32;
            fn del(&self, id: EsOutId);
            fn destroy(&self);
            fn set_pcr(&self, pcr: i64) -> i64;
            fn set_next_display_time(&self, pts: i64) -> i64;
        }
    }

    fn layout() -> FormatLayout {
        FormatLayout {
            header_size: 32,
            extra_len: FieldSpan::new(0, 4),
            extra_ptr: FieldSpan::new(8, 8),
            extra_languages_len: FieldSpan::new(4, 4),
            extra_languages_ptr: FieldSpan::new(16, 8),
        }
    }

    fn format() -> EsFormat {
        EsFormat::new(vec![0u8; 32])
    }

    fn counting_sink() -> MockSink {
        let mut sink = MockSink::new();
        let mut next = 100;
        sink.expect_add().returning(move |_| {
            next += 1;
            Some(EsOutId::new(next))
        });
        sink
    }

    #[test]
    fn test_add_returns_dense_handles() {
        let mut service = EsOutService::new(Arc::new(counting_sink()), layout());

        assert_eq!(service.add(Some(&format())).unwrap(), 1);
        assert_eq!(service.add(Some(&format())).unwrap(), 2);
        assert_eq!(service.resolve(1), Ok(EsOutId::new(101)));
        assert_eq!(service.resolve(2), Ok(EsOutId::new(102)));
    }

    #[test]
    fn test_add_without_format_is_request_error() {
        let mut sink = MockSink::new();
        sink.expect_add().times(0);
        let mut service = EsOutService::new(Arc::new(sink), layout());

        assert_eq!(
            service.add(None),
            Err(RequestError::MissingField("format"))
        );
    }

    #[test]
    fn test_add_size_mismatch_skips_host() {
        let mut sink = MockSink::new();
        sink.expect_add().times(0);
        let mut service = EsOutService::new(Arc::new(sink), layout());

        let err = service.add(Some(&EsFormat::new(vec![0u8; 33]))).unwrap_err();
        assert_eq!(
            err,
            RequestError::Codec(CodecError::SizeMismatch {
                expected: 32,
                actual: 33
            })
        );
        assert!(err.is_abi_mismatch());
    }

    #[test]
    fn test_host_refusal_returns_zero_handle() {
        let mut sink = MockSink::new();
        sink.expect_add().times(1).returning(|_| None);
        let mut service = EsOutService::new(Arc::new(sink), layout());

        assert_eq!(service.add(Some(&format())), Ok(NO_HANDLE));
        assert_eq!(service.live_outputs(), 0);
    }

    #[test]
    fn test_host_sees_sanitized_format() {
        let mut sink = MockSink::new();
        sink.expect_add()
            .withf(|format: &HostFormat| {
                format.header()[8..24].iter().all(|b| *b == 0)
                    && format.header()[..4] == 3u32.to_ne_bytes()
                    && format.extra() == Some(&b"abc"[..])
            })
            .times(1)
            .returning(|_| Some(EsOutId::new(1)));
        let mut service = EsOutService::new(Arc::new(sink), layout());

        let wire = EsFormat::new(vec![0xeeu8; 32]).with_extra(&b"abc"[..]);
        assert_eq!(service.add(Some(&wire)), Ok(1));
    }

    #[test]
    fn test_send_forwards_block_and_status() {
        let mut sink = counting_sink();
        sink.expect_send()
            .with(
                eq(EsOutId::new(101)),
                eq(Some(HostBlock {
                    buffer: b"hello".to_vec(),
                    flags: 0x1,
                    nb_samples: 1,
                    pts: 1000,
                    dts: 1000,
                    length: 40,
                })),
            )
            .times(1)
            .returning(|_, _| -7);
        let mut service = EsOutService::new(Arc::new(sink), layout());
        let handle = service.add(Some(&format())).unwrap();

        let block = EsBlock::new(&b"hello"[..])
            .with_flags(0x1)
            .with_samples(1)
            .with_timing(1000, 1000, 40);
        assert_eq!(service.send(handle, Some(&block)), Ok(-7));
    }

    #[test]
    fn test_send_without_block_flushes() {
        let mut sink = counting_sink();
        sink.expect_send()
            .with(eq(EsOutId::new(101)), eq(None))
            .times(1)
            .returning(|_, _| 0);
        let mut service = EsOutService::new(Arc::new(sink), layout());
        let handle = service.add(Some(&format())).unwrap();

        assert_eq!(service.send(handle, None), Ok(0));
    }

    #[test]
    fn test_send_after_del_fails_resolution() {
        let mut sink = counting_sink();
        sink.expect_send().times(1).returning(|_, _| 0);
        sink.expect_del().with(eq(EsOutId::new(101))).times(1).return_const(());
        let mut service = EsOutService::new(Arc::new(sink), layout());
        let handle = service.add(Some(&format())).unwrap();
        let block = EsBlock::new(&b"a"[..]);

        assert_eq!(service.send(handle, Some(&block)), Ok(0));
        service.del(handle);
        assert_eq!(
            service.send(handle, Some(&block)),
            Ok(status::EGENERIC as i32)
        );
    }

    #[test]
    fn test_del_is_idempotent() {
        let mut sink = counting_sink();
        sink.expect_del().times(1).return_const(());
        let mut service = EsOutService::new(Arc::new(sink), layout());
        let handle = service.add(Some(&format())).unwrap();

        service.del(handle);
        service.del(handle);
        service.del(NO_HANDLE);
        service.del(99);
        assert_eq!(service.resolve(handle), Err(HandleError::InvalidHandle(1)));
    }

    #[test]
    fn test_scenario_add_add_del() {
        let mut sink = counting_sink();
        sink.expect_del().times(1).return_const(());
        let mut service = EsOutService::new(Arc::new(sink), layout());

        assert_eq!(service.add(Some(&format())), Ok(1));
        assert_eq!(service.add(Some(&format())), Ok(2));
        service.del(1);

        assert!(service.resolve(1).is_err());
        assert!(service.resolve(2).is_ok());
        assert_eq!(service.add(Some(&format())), Ok(3));
        assert!(service.resolve(1).is_err());
    }

    #[test]
    fn test_destroy_invalidates_everything_once() {
        let mut sink = counting_sink();
        sink.expect_destroy().times(1).return_const(());
        sink.expect_del().times(0);
        sink.expect_send().times(0);
        sink.expect_set_pcr().times(0);
        let mut service = EsOutService::new(Arc::new(sink), layout());
        service.add(Some(&format())).unwrap();
        service.add(Some(&format())).unwrap();

        service.destroy();
        service.destroy();

        assert!(service.is_destroyed());
        assert!(service.resolve(1).is_err());
        assert!(service.resolve(2).is_err());
        assert_eq!(service.send(1, None), Ok(status::EGENERIC as i32));
        service.del(2);
        assert_eq!(service.add(Some(&format())), Err(RequestError::SinkDestroyed));
        assert_eq!(service.control_set_pcr(0), Err(RequestError::SinkDestroyed));
    }

    #[test]
    fn test_clock_controls_are_relayed() {
        let mut sink = MockSink::new();
        sink.expect_set_pcr().with(eq(90_000)).times(1).returning(|_| 0);
        sink.expect_set_next_display_time()
            .with(eq(120_000))
            .times(1)
            .returning(|_| -1);
        let service = EsOutService::new(Arc::new(sink), layout());

        assert_eq!(service.control_set_pcr(90_000), Ok(0));
        assert_eq!(service.control_set_next_display_time(120_000), Ok(-1));
    }
}
