//! Primitive wire encoding shared by every message.
//!
//! All integers are little-endian. Booleans and option tags are a single byte
//! that must be 0 or 1. Byte sequences carry a `u32` length prefix.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{CodecError, Result};

/// Bounds-checked reader over a received frame.
///
/// Byte sequences are returned as slices of the frame, so decoding a message
/// never copies payloads; the copy into host-owned memory happens once, in
/// the format and block decoders.
#[derive(Debug, Clone)]
pub struct WireReader {
    buf: Bytes,
}

impl WireReader {
    pub fn new(buf: Bytes) -> Self {
        Self { buf }
    }

    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        let remaining = self.buf.remaining();
        if remaining < needed {
            return Err(CodecError::Truncated { needed, remaining });
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.buf.get_u8())
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.ensure(2)?;
        Ok(self.buf.get_u16_le())
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.ensure(4)?;
        Ok(self.buf.get_u32_le())
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.ensure(8)?;
        Ok(self.buf.get_u64_le())
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.ensure(4)?;
        Ok(self.buf.get_i32_le())
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        self.ensure(8)?;
        Ok(self.buf.get_i64_le())
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CodecError::InvalidBool(other)),
        }
    }

    /// Read a `u32`-length-prefixed byte sequence.
    pub fn read_bytes(&mut self) -> Result<Bytes> {
        let len = self.read_u32()? as usize;
        self.ensure(len)?;
        Ok(self.buf.split_to(len))
    }

    /// Read an optional value: a 0/1 tag followed by the value when present.
    pub fn read_option<T>(
        &mut self,
        read: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<Option<T>> {
        match self.read_u8()? {
            0 => Ok(None),
            1 => read(self).map(Some),
            other => Err(CodecError::InvalidTag(other)),
        }
    }

    /// Consume the reader, failing if any bytes are left.
    pub fn finish(self) -> Result<()> {
        match self.buf.remaining() {
            0 => Ok(()),
            left => Err(CodecError::TrailingBytes(left)),
        }
    }
}

/// Growable frame writer.
#[derive(Debug, Default)]
pub struct WireWriter {
    buf: BytesMut,
}

impl WireWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    pub fn put_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    pub fn put_u16(&mut self, value: u16) {
        self.buf.put_u16_le(value);
    }

    pub fn put_u32(&mut self, value: u32) {
        self.buf.put_u32_le(value);
    }

    pub fn put_u64(&mut self, value: u64) {
        self.buf.put_u64_le(value);
    }

    pub fn put_i32(&mut self, value: i32) {
        self.buf.put_i32_le(value);
    }

    pub fn put_i64(&mut self, value: i64) {
        self.buf.put_i64_le(value);
    }

    pub fn put_bool(&mut self, value: bool) {
        self.buf.put_u8(u8::from(value));
    }

    /// Write a `u32`-length-prefixed byte sequence.
    pub fn put_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let len = u32::try_from(bytes.len()).map_err(|_| CodecError::LengthOverflow {
            length: bytes.len(),
            width: 4,
        })?;
        self.buf.put_u32_le(len);
        self.buf.put_slice(bytes);
        Ok(())
    }

    /// Write an optional value as a 0/1 tag followed by the value.
    pub fn put_option<T>(
        &mut self,
        value: Option<&T>,
        write: impl FnOnce(&mut Self, &T) -> Result<()>,
    ) -> Result<()> {
        match value {
            None => {
                self.put_u8(0);
                Ok(())
            }
            Some(value) => {
                self.put_u8(1);
                write(self, value)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integers_are_little_endian() {
        let mut writer = WireWriter::new();
        writer.put_u16(0x0102);
        writer.put_i32(-2);
        let frame = writer.finish();

        assert_eq!(&frame[..], &[0x02, 0x01, 0xfe, 0xff, 0xff, 0xff]);
    }

    #[test]
    fn test_truncated_read() {
        let mut reader = WireReader::new(Bytes::from_static(&[1, 2, 3]));
        assert_eq!(
            reader.read_u64(),
            Err(CodecError::Truncated {
                needed: 8,
                remaining: 3
            })
        );
    }

    #[test]
    fn test_byte_sequence_length_checked() {
        // Declares 10 bytes, carries 2
        let mut reader = WireReader::new(Bytes::from_static(&[10, 0, 0, 0, 0xaa, 0xbb]));
        assert!(matches!(
            reader.read_bytes(),
            Err(CodecError::Truncated { needed: 10, .. })
        ));
    }

    #[test]
    fn test_invalid_bool_and_tag() {
        let mut reader = WireReader::new(Bytes::from_static(&[2]));
        assert_eq!(reader.read_bool(), Err(CodecError::InvalidBool(2)));

        let mut reader = WireReader::new(Bytes::from_static(&[7]));
        assert_eq!(
            reader.read_option(|r| r.read_u8()),
            Err(CodecError::InvalidTag(7))
        );
    }

    #[test]
    fn test_option_and_bytes() {
        let mut writer = WireWriter::new();
        writer
            .put_option(Some(&Bytes::from_static(b"abc")), |w, b| w.put_bytes(b))
            .unwrap();
        writer
            .put_option::<Bytes>(None, |w, b| w.put_bytes(b))
            .unwrap();

        let mut reader = WireReader::new(writer.finish());
        let first = reader.read_option(|r| r.read_bytes()).unwrap();
        let second = reader.read_option(|r| r.read_bytes()).unwrap();

        assert_eq!(first.as_deref(), Some(&b"abc"[..]));
        assert!(second.is_none());
        assert!(reader.finish().is_ok());
    }

    #[test]
    fn test_trailing_bytes() {
        let mut reader = WireReader::new(Bytes::from_static(&[1, 0, 9]));
        reader.read_u16().unwrap();
        assert_eq!(reader.finish(), Err(CodecError::TrailingBytes(1)));
    }
}
