//! Format descriptor marshaling.
//!
//! A format descriptor travels as the raw bytes of the host structure plus two
//! optional side-buffers. The raw header may contain pointer fields written by
//! the sender's address space; they are never trusted. Decoding zeroes them
//! right after the copy and rebuilds ownership locally.

use bridge_traits::media::{FieldSpan, FormatLayout, HostFormat};
use bytes::Bytes;
use tracing::trace;

use crate::error::{CodecError, Result};

/// Format descriptor as carried on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EsFormat {
    /// Raw bytes of the host format structure.
    pub raw_struct: Bytes,
    /// Codec-private extra data.
    pub extra: Option<Bytes>,
    /// Extra language metadata.
    pub extra_languages: Option<Bytes>,
}

impl EsFormat {
    pub fn new(raw_struct: impl Into<Bytes>) -> Self {
        Self {
            raw_struct: raw_struct.into(),
            extra: None,
            extra_languages: None,
        }
    }

    pub fn with_extra(mut self, extra: impl Into<Bytes>) -> Self {
        self.extra = Some(extra.into());
        self
    }

    pub fn with_extra_languages(mut self, extra_languages: impl Into<Bytes>) -> Self {
        self.extra_languages = Some(extra_languages.into());
        self
    }
}

/// Copy `src` into a freshly allocated, exactly sized buffer.
///
/// Allocation failure is reported instead of aborting, so an oversized
/// side-buffer turns into a rejected request.
pub fn copy_buffer(src: &[u8]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(src.len())
        .map_err(|_| CodecError::OutOfMemory {
            requested: src.len(),
        })?;
    buf.extend_from_slice(src);
    Ok(buf)
}

/// Read an unsigned scalar field from a header, in host byte order.
pub fn header_field(header: &[u8], span: FieldSpan) -> Option<u64> {
    let bytes = header.get(span.offset..span.end()?)?;
    match span.width {
        4 => bytes.try_into().ok().map(|b| u32::from_ne_bytes(b) as u64),
        8 => bytes.try_into().ok().map(u64::from_ne_bytes),
        _ => None,
    }
}

fn field_mut(header: &mut [u8], span: FieldSpan) -> Result<&mut [u8]> {
    span.end()
        .and_then(|end| header.get_mut(span.offset..end))
        .ok_or_else(|| {
            CodecError::InvalidLayout(format!(
                "field at offset {} is outside the header",
                span.offset
            ))
        })
}

fn zero_field(header: &mut [u8], span: FieldSpan) -> Result<()> {
    field_mut(header, span)?.fill(0);
    Ok(())
}

fn write_length(header: &mut [u8], span: FieldSpan, length: usize) -> Result<()> {
    let overflow = CodecError::LengthOverflow {
        length,
        width: span.width,
    };
    let field = field_mut(header, span)?;
    match span.width {
        4 => {
            let value = u32::try_from(length).map_err(|_| overflow)?;
            field.copy_from_slice(&value.to_ne_bytes());
        }
        8 => {
            let value = u64::try_from(length).map_err(|_| overflow)?;
            field.copy_from_slice(&value.to_ne_bytes());
        }
        width => {
            return Err(CodecError::InvalidLayout(format!(
                "unsupported field width {}",
                width
            )))
        }
    }
    Ok(())
}

fn sanitize_header(layout: &FormatLayout, header: &mut [u8]) -> Result<()> {
    for span in layout.side_buffer_fields() {
        zero_field(header, span)?;
    }
    Ok(())
}

fn check_header_size(layout: &FormatLayout, actual: usize) -> Result<()> {
    layout.validate().map_err(CodecError::InvalidLayout)?;
    if actual != layout.header_size {
        return Err(CodecError::SizeMismatch {
            expected: layout.header_size,
            actual,
        });
    }
    Ok(())
}

/// Convert a wire format descriptor into a host-owned one.
///
/// The header length must equal `layout.header_size` exactly; nothing is
/// copied otherwise. In the copied header the pointer fields stay zero and
/// the length fields describe the side-buffers owned by the result.
pub fn decode_format(layout: &FormatLayout, wire: &EsFormat) -> Result<HostFormat> {
    check_header_size(layout, wire.raw_struct.len())?;

    let mut header = copy_buffer(&wire.raw_struct)?;
    sanitize_header(layout, &mut header)?;

    let extra = wire.extra.as_deref().map(copy_buffer).transpose()?;
    let extra_languages = wire
        .extra_languages
        .as_deref()
        .map(copy_buffer)
        .transpose()?;

    write_length(
        &mut header,
        layout.extra_len,
        extra.as_ref().map_or(0, Vec::len),
    )?;
    write_length(
        &mut header,
        layout.extra_languages_len,
        extra_languages.as_ref().map_or(0, Vec::len),
    )?;

    trace!(
        header = header.len(),
        extra = extra.as_ref().map_or(0, Vec::len),
        extra_languages = extra_languages.as_ref().map_or(0, Vec::len),
        "decoded format"
    );

    Ok(HostFormat::from_parts(header, extra, extra_languages))
}

/// Convert a host format descriptor into its wire form.
///
/// Pointer and length fields are zeroed in the emitted header; the receiver
/// learns the side-buffer sizes from the length prefixes alone.
pub fn encode_format(layout: &FormatLayout, host: &HostFormat) -> Result<EsFormat> {
    check_header_size(layout, host.header().len())?;

    let mut header = host.header().to_vec();
    sanitize_header(layout, &mut header)?;

    Ok(EsFormat {
        raw_struct: Bytes::from(header),
        extra: host.extra().map(Bytes::copy_from_slice),
        extra_languages: host.extra_languages().map(Bytes::copy_from_slice),
    })
}
