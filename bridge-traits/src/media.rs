//! Host-native media types handed across the bridge seams.
//!
//! These are the values a host engine actually consumes: a format descriptor
//! whose fixed header mirrors the host's compiled structure, a media block
//! with its timing fields, and the opaque token the host uses to name a live
//! elementary-stream output.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status codes shared with the host engine.
pub mod status {
    /// Operation completed.
    pub const SUCCESS: i64 = 0;
    /// Unspecified failure.
    pub const EGENERIC: i64 = -1;
}

/// Opaque identifier of a host-owned elementary-stream output.
///
/// The value is meaningful only to the host that issued it. The bridge never
/// forwards it to the isolated side; it is stored in the handle table instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EsOutId(u64);

impl EsOutId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EsOutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "es#{}", self.0)
    }
}

/// Byte range of a scalar field inside the fixed format header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpan {
    /// Offset from the start of the header, in bytes.
    pub offset: usize,
    /// Field width in bytes (4 or 8).
    pub width: usize,
}

impl FieldSpan {
    pub const fn new(offset: usize, width: usize) -> Self {
        Self { offset, width }
    }

    /// One past the last byte covered by the field, or `None` if that
    /// position is not addressable.
    pub fn end(&self) -> Option<usize> {
        self.offset.checked_add(self.width)
    }

    /// Whether two spans share at least one byte.
    pub fn overlaps(&self, other: &FieldSpan) -> bool {
        self.offset < other.offset.saturating_add(other.width)
            && other.offset < self.offset.saturating_add(self.width)
    }
}

/// Compiled layout of the host's format header.
///
/// Only the size and the four side-buffer fields are known to the bridge; the
/// rest of the header is carried verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatLayout {
    /// Exact size of the host structure, in bytes.
    pub header_size: usize,
    /// Length of the codec-private `extra` buffer.
    pub extra_len: FieldSpan,
    /// Pointer to the codec-private `extra` buffer.
    pub extra_ptr: FieldSpan,
    /// Length of the `extra languages` buffer.
    pub extra_languages_len: FieldSpan,
    /// Pointer to the `extra languages` buffer.
    pub extra_languages_ptr: FieldSpan,
}

impl FormatLayout {
    /// All side-buffer fields, in header order of declaration.
    pub fn side_buffer_fields(&self) -> [FieldSpan; 4] {
        [
            self.extra_len,
            self.extra_ptr,
            self.extra_languages_len,
            self.extra_languages_ptr,
        ]
    }

    /// Check that every field lies inside the header, has a supported width,
    /// and does not overlap another field.
    pub fn validate(&self) -> Result<(), String> {
        if self.header_size == 0 {
            return Err("header_size must be > 0".to_string());
        }

        let fields = self.side_buffer_fields();
        for field in &fields {
            if field.width != 4 && field.width != 8 {
                return Err(format!(
                    "field at offset {} has width {} (expected 4 or 8)",
                    field.offset, field.width
                ));
            }
            match field.end() {
                Some(end) if end <= self.header_size => {}
                Some(end) => {
                    return Err(format!(
                        "field at offset {} ends at {} past header_size {}",
                        field.offset, end, self.header_size
                    ));
                }
                None => {
                    return Err(format!(
                        "field at offset {} with width {} overflows the address space",
                        field.offset, field.width
                    ));
                }
            }
        }

        for (i, a) in fields.iter().enumerate() {
            for b in &fields[i + 1..] {
                if a.overlaps(b) {
                    return Err(format!(
                        "fields at offsets {} and {} overlap",
                        a.offset, b.offset
                    ));
                }
            }
        }

        Ok(())
    }
}

/// Format descriptor owned by the host side of the bridge.
///
/// The header is a sanitized copy of the host structure: pointer fields are
/// always zero and length fields match the side-buffers held here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostFormat {
    header: Vec<u8>,
    extra: Option<Vec<u8>>,
    extra_languages: Option<Vec<u8>>,
}

impl HostFormat {
    pub fn from_parts(
        header: Vec<u8>,
        extra: Option<Vec<u8>>,
        extra_languages: Option<Vec<u8>>,
    ) -> Self {
        Self {
            header,
            extra,
            extra_languages,
        }
    }

    pub fn header(&self) -> &[u8] {
        &self.header
    }

    pub fn extra(&self) -> Option<&[u8]> {
        self.extra.as_deref()
    }

    pub fn extra_languages(&self) -> Option<&[u8]> {
        self.extra_languages.as_deref()
    }
}

/// One chunk of stream data in host-native form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HostBlock {
    /// Payload bytes, sized exactly to the data.
    pub buffer: Vec<u8>,
    /// Host block flags.
    pub flags: u32,
    /// Number of samples carried by the block.
    pub nb_samples: u32,
    /// Presentation time stamp.
    pub pts: i64,
    /// Decode time stamp.
    pub dts: i64,
    /// Nominal duration.
    pub length: i64,
}
