use super::Tag;
use crate::error::{Result, SplitError};
use std::io::{self, Read};

pub struct BinReader<R: Read> {
    inner: R,
}

impl<R: Read> BinReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        self.inner.read_exact(buf).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                SplitError::Format("unexpected end of split map".into())
            } else {
                SplitError::Io(e)
            }
        })
    }

    fn expect(&mut self, expected: Tag) -> Result<()> {
        let mut t = [0u8; 1];
        self.fill(&mut t)?;
        if t[0] != expected as u8 {
            return Err(SplitError::TagMismatch {
                expected,
                found: t[0],
            });
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.expect(Tag::U8)?;
        let mut b = [0u8; 1];
        self.fill(&mut b)?;
        Ok(b[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.expect(Tag::U16)?;
        let mut b = [0u8; 2];
        self.fill(&mut b)?;
        Ok(u16::from_le_bytes(b))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.expect(Tag::U32)?;
        let mut b = [0u8; 4];
        self.fill(&mut b)?;
        Ok(u32::from_le_bytes(b))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.expect(Tag::U64)?;
        let mut b = [0u8; 8];
        self.fill(&mut b)?;
        Ok(u64::from_le_bytes(b))
    }

    pub fn read_str(&mut self) -> Result<String> {
        self.expect(Tag::Str)?;
        let mut b = [0u8; 8];
        self.fill(&mut b)?;
        let size = u64::from_le_bytes(b);
        if size == 0 {
            return Err(SplitError::Format("string without terminator".into()));
        }
        // No up-front allocation sized by the untrusted length.
        let mut bytes = Vec::new();
        (&mut self.inner).take(size).read_to_end(&mut bytes)?;
        if (bytes.len() as u64) < size {
            return Err(SplitError::Format("unexpected end of split map".into()));
        }
        if bytes.pop() != Some(0) {
            return Err(SplitError::Format("string without terminator".into()));
        }
        String::from_utf8(bytes)
            .map_err(|e| SplitError::Format(format!("string is not UTF-8: {e}")))
    }
}
