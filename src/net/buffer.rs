//! Packet buffer implementation
//!
//! Provides a byte buffer with the typed field operations used by the
//! Aurora wire format:
//! - Fixed-width big-endian integers (byte, short, int, long)
//! - Booleans encoded as a single byte
//! - `u16` length-prefixed UTF-8 strings and opaque blobs
//! - Millisecond timestamps
//! - `u16` count-prefixed lists
//!
//! Reads are forward-only and return `PacketError::TruncatedPacket` instead
//! of a default value when the payload runs out.

use bytes::{Buf, BufMut, BytesMut};
use chrono::{DateTime, TimeZone, Utc};

use crate::error::{PacketError, PacketResult};

/// Maximum length of a string, blob or list (16-bit prefix)
pub const MAX_FIELD_LEN: usize = u16::MAX as usize;

/// Packet buffer for reading and writing protocol fields
#[derive(Debug, Clone, Default)]
pub struct PacketBuffer {
    /// Internal byte buffer
    data: BytesMut,
    /// Current read position
    read_pos: usize,
}

impl PacketBuffer {
    /// Create a new empty packet buffer
    pub fn new() -> Self {
        Self {
            data: BytesMut::new(),
            read_pos: 0,
        }
    }

    /// Create a packet buffer with a specific capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: BytesMut::with_capacity(capacity),
            read_pos: 0,
        }
    }

    /// Create a packet buffer from existing bytes
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            data: BytesMut::from(bytes),
            read_pos: 0,
        }
    }

    /// Create a packet buffer by wrapping a BytesMut
    pub fn wrap(data: BytesMut) -> Self {
        Self { data, read_pos: 0 }
    }

    // ============ Properties ============

    /// Get the current read position
    #[inline]
    pub fn read_position(&self) -> usize {
        self.read_pos
    }

    /// Get the total length of the buffer
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the buffer is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the number of bytes remaining to read
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.read_pos)
    }

    /// Check if there are bytes remaining to read
    #[inline]
    pub fn has_remaining(&self) -> bool {
        self.remaining() > 0
    }

    /// Get a reference to the underlying bytes
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Get the underlying BytesMut
    #[inline]
    pub fn into_inner(self) -> BytesMut {
        self.data
    }

    /// Uppercase hex dump of the whole payload, for diagnostics
    pub fn hex_dump(&self) -> String {
        let mut out = String::with_capacity(self.data.len() * 3);
        for (i, b) in self.data.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            out.push_str(&format!("{:02X}", b));
        }
        out
    }

    /// Take the next `count` bytes, advancing the cursor
    fn take(&mut self, count: usize) -> PacketResult<&[u8]> {
        let remaining = self.remaining();
        if remaining < count {
            return Err(PacketError::truncated(count, remaining));
        }
        let start = self.read_pos;
        self.read_pos += count;
        Ok(&self.data[start..start + count])
    }

    // ============ Reading Methods (Big-Endian) ============

    /// Read an unsigned byte
    pub fn get_byte(&mut self) -> PacketResult<u8> {
        Ok(self.take(1)?[0])
    }

    /// Read a big-endian short (2 bytes)
    pub fn get_short(&mut self) -> PacketResult<u16> {
        Ok(self.take(2)?.get_u16())
    }

    /// Read a big-endian int (4 bytes)
    pub fn get_int(&mut self) -> PacketResult<u32> {
        Ok(self.take(4)?.get_u32())
    }

    /// Read a big-endian long (8 bytes)
    pub fn get_long(&mut self) -> PacketResult<u64> {
        Ok(self.take(8)?.get_u64())
    }

    /// Read a boolean (one byte, non-zero is true)
    pub fn get_bool(&mut self) -> PacketResult<bool> {
        Ok(self.get_byte()? != 0)
    }

    /// Read a length-prefixed UTF-8 string
    pub fn get_string(&mut self) -> PacketResult<String> {
        let len = self.get_short()? as usize;
        let bytes = self.take(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|e| PacketError::InvalidEncoding(e.to_string()))
    }

    /// Read a length-prefixed opaque blob
    pub fn get_bin(&mut self) -> PacketResult<Vec<u8>> {
        let len = self.get_short()? as usize;
        Ok(self.take(len)?.to_vec())
    }

    /// Read a timestamp (signed milliseconds since the Unix epoch)
    pub fn get_date_time(&mut self) -> PacketResult<DateTime<Utc>> {
        let millis = self.get_long()? as i64;
        Utc.timestamp_millis_opt(millis)
            .single()
            .ok_or_else(|| PacketError::InvalidValue {
                field: "date_time",
                value: millis.to_string(),
            })
    }

    /// Read a count-prefixed list of records.
    ///
    /// The list is only returned once every element decoded; a failure on
    /// any element discards the elements read before it.
    pub fn get_list<T, F>(&mut self, mut decode: F) -> PacketResult<Vec<T>>
    where
        F: FnMut(&mut Self) -> PacketResult<T>,
    {
        let count = self.get_short()? as usize;
        // Cap the preallocation, the count is untrusted
        let mut items = Vec::with_capacity(count.min(self.remaining()));
        for _ in 0..count {
            items.push(decode(self)?);
        }
        Ok(items)
    }

    // ============ Writing Methods (Big-Endian) ============

    /// Write an unsigned byte
    pub fn put_byte(&mut self, value: u8) {
        self.data.put_u8(value);
    }

    /// Write a big-endian short (2 bytes)
    pub fn put_short(&mut self, value: u16) {
        self.data.put_u16(value);
    }

    /// Write a big-endian int (4 bytes)
    pub fn put_int(&mut self, value: u32) {
        self.data.put_u32(value);
    }

    /// Write a big-endian long (8 bytes)
    pub fn put_long(&mut self, value: u64) {
        self.data.put_u64(value);
    }

    /// Write a boolean as one byte
    pub fn put_bool(&mut self, value: bool) {
        self.put_byte(u8::from(value));
    }

    /// Write a length-prefixed UTF-8 string
    pub fn put_string(&mut self, value: &str) -> PacketResult<()> {
        self.put_bin(value.as_bytes())
    }

    /// Write a length-prefixed opaque blob
    pub fn put_bin(&mut self, value: &[u8]) -> PacketResult<()> {
        self.put_len(value.len())?;
        self.data.extend_from_slice(value);
        Ok(())
    }

    /// Write a timestamp as milliseconds since the Unix epoch
    pub fn put_date_time(&mut self, value: DateTime<Utc>) {
        self.put_long(value.timestamp_millis() as u64);
    }

    /// Write a count-prefixed list of records
    pub fn put_list<T, F>(&mut self, items: &[T], mut encode: F) -> PacketResult<()>
    where
        F: FnMut(&mut Self, &T) -> PacketResult<()>,
    {
        self.put_len(items.len())?;
        for item in items {
            encode(self, item)?;
        }
        Ok(())
    }

    /// Write raw bytes without a prefix
    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    fn put_len(&mut self, len: usize) -> PacketResult<()> {
        if len > MAX_FIELD_LEN {
            return Err(PacketError::FieldTooLong {
                len,
                max: MAX_FIELD_LEN,
            });
        }
        self.put_short(len as u16);
        Ok(())
    }
}

impl From<Vec<u8>> for PacketBuffer {
    fn from(vec: Vec<u8>) -> Self {
        Self::from_bytes(&vec)
    }
}

impl From<&[u8]> for PacketBuffer {
    fn from(slice: &[u8]) -> Self {
        Self::from_bytes(slice)
    }
}

impl AsRef<[u8]> for PacketBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(buf: &PacketBuffer) -> PacketBuffer {
        PacketBuffer::from_bytes(buf.as_bytes())
    }

    #[test]
    fn test_basic_read_write() {
        let mut buf = PacketBuffer::new();

        buf.put_byte(42);
        buf.put_short(1234);
        buf.put_int(987654);
        buf.put_long(123456789012345);
        buf.put_bool(true);
        buf.put_bool(false);

        let mut buf = reader(&buf);

        assert_eq!(buf.get_byte(), Ok(42));
        assert_eq!(buf.get_short(), Ok(1234));
        assert_eq!(buf.get_int(), Ok(987654));
        assert_eq!(buf.get_long(), Ok(123456789012345));
        assert_eq!(buf.get_bool(), Ok(true));
        assert_eq!(buf.get_bool(), Ok(false));
        assert!(!buf.has_remaining());
    }

    #[test]
    fn test_big_endian_layout() {
        let mut buf = PacketBuffer::new();
        buf.put_short(0x1234);
        buf.put_int(0x0FD1_2002);

        assert_eq!(buf.as_bytes(), &[0x12, 0x34, 0x0F, 0xD1, 0x20, 0x02]);
    }

    #[test]
    fn test_string_and_bin() {
        let mut buf = PacketBuffer::new();

        buf.put_string("Hello, Erinn!").unwrap();
        buf.put_string("").unwrap();
        buf.put_bin(&[1, 2, 3]).unwrap();
        buf.put_bin(&[]).unwrap();

        assert_eq!(&buf.as_bytes()[..2], &[0x00, 13]);

        let mut buf = reader(&buf);
        assert_eq!(buf.get_string().unwrap(), "Hello, Erinn!");
        assert_eq!(buf.get_string().unwrap(), "");
        assert_eq!(buf.get_bin().unwrap(), vec![1, 2, 3]);
        assert!(buf.get_bin().unwrap().is_empty());
    }

    #[test]
    fn test_date_time() {
        let when = Utc.with_ymd_and_hms(2008, 3, 27, 12, 30, 0).unwrap();
        let mut buf = PacketBuffer::new();
        buf.put_date_time(when);
        assert_eq!(buf.len(), 8);

        let mut buf = reader(&buf);
        assert_eq!(buf.get_date_time().unwrap(), when);
    }

    #[test]
    fn test_date_time_out_of_range() {
        let mut buf = PacketBuffer::new();
        buf.put_long(i64::MAX as u64);

        let mut buf = reader(&buf);
        assert!(matches!(
            buf.get_date_time(),
            Err(PacketError::InvalidValue { field: "date_time", .. })
        ));
    }

    #[test]
    fn test_truncated_fixed_width() {
        for width in [1usize, 2, 4, 8] {
            for available in 0..width {
                let mut buf = PacketBuffer::from_bytes(&vec![0xAB; available]);
                let result = match width {
                    1 => buf.get_byte().map(u64::from),
                    2 => buf.get_short().map(u64::from),
                    4 => buf.get_int().map(u64::from),
                    _ => buf.get_long(),
                };
                assert_eq!(
                    result,
                    Err(PacketError::truncated(width, available)),
                    "width {} with {} bytes",
                    width,
                    available
                );
            }
        }
    }

    #[test]
    fn test_truncated_does_not_advance() {
        let mut buf = PacketBuffer::from_bytes(&[0x01, 0x02, 0x03]);
        assert!(buf.get_int().is_err());
        assert_eq!(buf.read_position(), 0);
        assert_eq!(buf.get_short(), Ok(0x0102));
    }

    #[test]
    fn test_truncated_string_body() {
        // Prefix claims 5 bytes, only 2 follow
        let mut buf = PacketBuffer::from_bytes(&[0x00, 0x05, b'h', b'i']);
        assert_eq!(buf.get_string(), Err(PacketError::truncated(5, 2)));
    }

    #[test]
    fn test_invalid_utf8() {
        let mut buf = PacketBuffer::from_bytes(&[0x00, 0x02, 0xC3, 0x28]);
        assert!(matches!(buf.get_string(), Err(PacketError::InvalidEncoding(_))));
    }

    #[test]
    fn test_list_roundtrip() {
        let mut buf = PacketBuffer::new();
        buf.put_list(&[7u32, 8, 9], |b, v| {
            b.put_int(*v);
            Ok(())
        })
        .unwrap();

        let mut buf = reader(&buf);
        assert_eq!(buf.get_list(|b| b.get_int()).unwrap(), vec![7, 8, 9]);
    }

    #[test]
    fn test_empty_list() {
        let mut buf = PacketBuffer::from_bytes(&[0x00, 0x00]);
        let list = buf.get_list(|b| b.get_int()).unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn test_list_is_atomic() {
        // Three elements announced, the third is cut short
        let mut buf = PacketBuffer::new();
        buf.put_short(3);
        buf.put_int(1);
        buf.put_int(2);
        buf.put_short(0xFFFF);

        let mut buf = reader(&buf);
        let mut seen = 0;
        let result = buf.get_list(|b| {
            let v = b.get_int()?;
            seen += 1;
            Ok(v)
        });
        assert_eq!(result, Err(PacketError::truncated(4, 2)));
        assert_eq!(seen, 2);
    }

    #[test]
    fn test_field_too_long() {
        let mut buf = PacketBuffer::new();
        let big = vec![0u8; MAX_FIELD_LEN + 1];
        assert_eq!(
            buf.put_bin(&big),
            Err(PacketError::FieldTooLong {
                len: MAX_FIELD_LEN + 1,
                max: MAX_FIELD_LEN
            })
        );
        assert!(buf.is_empty());
    }

    #[test]
    fn test_remaining() {
        let mut buf = PacketBuffer::new();
        buf.put_int(12345);

        let mut buf = reader(&buf);
        assert_eq!(buf.remaining(), 4);

        buf.get_short().unwrap();
        assert_eq!(buf.remaining(), 2);

        buf.get_short().unwrap();
        assert_eq!(buf.remaining(), 0);
        assert!(!buf.has_remaining());
    }

    #[test]
    fn test_hex_dump() {
        let buf = PacketBuffer::from_bytes(&[0x0C, 0xAB, 0x00]);
        assert_eq!(buf.hex_dump(), "0C AB 00");
        assert_eq!(PacketBuffer::new().hex_dump(), "");
    }
}
