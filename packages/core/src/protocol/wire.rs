// Wire format (TLS presentation language)
// Big-endian integers and length-prefixed opaque vectors, as used by the
// ServerKeyExchange / ClientKeyExchange bodies.

use crate::error::{CryptoError, Result};

/// Cursor over an inbound handshake body. Every read failure is a `Protocol` error.
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.buf.len())
            .ok_or_else(|| {
                CryptoError::Protocol(format!(
                    "Truncated {}: need {} bytes, {} left",
                    what,
                    len,
                    self.buf.len() - self.pos
                ))
            })?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub fn read_u8(&mut self, what: &str) -> Result<u8> {
        Ok(self.take(1, what)?[0])
    }

    pub fn read_u16(&mut self, what: &str) -> Result<u16> {
        let bytes = self.take(2, what)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// `opaque what<1..2^8-1>`
    pub fn read_opaque8(&mut self, what: &str) -> Result<&'a [u8]> {
        let len = self.read_u8(what)? as usize;
        if len == 0 {
            return Err(CryptoError::Protocol(format!("Empty {}", what)));
        }
        self.take(len, what)
    }

    /// `opaque what<1..2^16-1>`
    pub fn read_opaque16(&mut self, what: &str) -> Result<&'a [u8]> {
        let len = self.read_u16(what)? as usize;
        if len == 0 {
            return Err(CryptoError::Protocol(format!("Empty {}", what)));
        }
        self.take(len, what)
    }

    /// Fails if anything is left unread.
    pub fn finish(self) -> Result<()> {
        let left = self.buf.len() - self.pos;
        if left != 0 {
            return Err(CryptoError::Protocol(format!(
                "{} trailing bytes after message",
                left
            )));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn put_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn put_opaque8(&mut self, data: &[u8]) -> Result<()> {
        let len = u8::try_from(data.len())
            .ok()
            .filter(|len| *len > 0)
            .ok_or_else(|| {
                CryptoError::InvalidInput(format!("Opaque8 field of {} bytes", data.len()))
            })?;
        self.put_u8(len);
        self.buf.extend_from_slice(data);
        Ok(())
    }

    pub fn put_opaque16(&mut self, data: &[u8]) -> Result<()> {
        let len = u16::try_from(data.len())
            .ok()
            .filter(|len| *len > 0)
            .ok_or_else(|| {
                CryptoError::InvalidInput(format!("Opaque16 field of {} bytes", data.len()))
            })?;
        self.put_u16(len);
        self.buf.extend_from_slice(data);
        Ok(())
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}
