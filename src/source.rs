use std::io::{self, Read};

use crate::error::{DecodeError, Result};

/// Thin wrapper around the caller-supplied byte stream that tracks the
/// current offset, used only to attach position information to error
/// messages. Decoding itself never seeks backwards; `skip` is a forward
/// read-and-discard, matching the "sequential read and forward skip"
/// requirement on the input source.
pub struct ByteSource<R> {
    inner: R,
    offset: u64,
}

impl<R: Read> ByteSource<R> {
    pub fn new(inner: R) -> Self {
        ByteSource { inner, offset: 0 }
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    pub fn read_u16_le(&mut self) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.read_exact(&mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.inner.read_exact(buf).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                DecodeError::malformed(self.offset, "unexpected end of stream")
            } else {
                DecodeError::Io(e)
            }
        })?;
        self.offset += buf.len() as u64;
        Ok(())
    }

    /// Read and discard `n` bytes.
    pub fn skip(&mut self, n: u64) -> Result<()> {
        let mut remaining = n;
        let mut scratch = [0u8; 256];
        while remaining > 0 {
            let chunk = remaining.min(scratch.len() as u64) as usize;
            self.read_exact(&mut scratch[..chunk])?;
            remaining -= chunk as u64;
        }
        Ok(())
    }

    /// Read one length-prefixed sub-block's payload, or `None` at the
    /// chain terminator (`len == 0`).
    pub fn read_sub_block(&mut self) -> Result<Option<Vec<u8>>> {
        let len = self.read_u8()?;
        if len == 0 {
            return Ok(None);
        }
        let mut buf = vec![0u8; len as usize];
        self.read_exact(&mut buf)?;
        Ok(Some(buf))
    }

    /// Skip an entire sub-block chain up to and including its terminator.
    pub fn skip_sub_blocks(&mut self) -> Result<()> {
        while self.read_sub_block()?.is_some() {}
        Ok(())
    }
}
