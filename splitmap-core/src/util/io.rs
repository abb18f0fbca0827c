use crate::error::{Result, SplitError};
use std::io::{self, Read, Write};

pub const COPY_BUF_LEN: usize = 64 * 1024;

/// Zeroed buffer; allocation failure is reported instead of aborting.
pub fn alloc_buffer(len: usize) -> Result<Vec<u8>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|_| SplitError::Alloc { bytes: len })?;
    v.resize(len, 0);
    Ok(v)
}

/// Move exactly `len` bytes from `src` to `dst`; a short source is an error.
pub fn copy_exact<R, W>(src: &mut R, dst: &mut W, len: u64, buf: &mut [u8]) -> io::Result<()>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let mut left = len;
    while left > 0 {
        let n = (buf.len() as u64).min(left) as usize;
        src.read_exact(&mut buf[..n])?;
        dst.write_all(&buf[..n])?;
        left -= n as u64;
    }
    Ok(())
}
