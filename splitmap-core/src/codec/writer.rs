use super::Tag;
use std::io::{self, Write};

pub struct BinWriter<W: Write> {
    inner: W,
}

impl<W: Write> BinWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    fn tag(&mut self, t: Tag) -> io::Result<()> {
        self.inner.write_all(&[t as u8])
    }

    pub fn write_u8(&mut self, v: u8) -> io::Result<()> {
        self.tag(Tag::U8)?;
        self.inner.write_all(&[v])
    }

    pub fn write_u16(&mut self, v: u16) -> io::Result<()> {
        self.tag(Tag::U16)?;
        self.inner.write_all(&v.to_le_bytes())
    }

    pub fn write_u32(&mut self, v: u32) -> io::Result<()> {
        self.tag(Tag::U32)?;
        self.inner.write_all(&v.to_le_bytes())
    }

    pub fn write_u64(&mut self, v: u64) -> io::Result<()> {
        self.tag(Tag::U64)?;
        self.inner.write_all(&v.to_le_bytes())
    }

    /// Length prefix counts the NUL terminator, so "" encodes as a 1-byte payload.
    pub fn write_str(&mut self, v: &str) -> io::Result<()> {
        self.tag(Tag::Str)?;
        let size = v.len() as u64 + 1;
        self.inner.write_all(&size.to_le_bytes())?;
        self.inner.write_all(v.as_bytes())?;
        self.inner.write_all(&[0])
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
