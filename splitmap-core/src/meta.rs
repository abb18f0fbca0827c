//! Native metadata capture and restore: the nine POSIX permission bits as an
//! `ls`-style string, and modification times as signed nanosecond ticks since
//! the Unix epoch (stored in the map as the two's-complement `u64`).

use crate::error::{Result, SplitError};
use filetime::FileTime;
use std::fs::Metadata;
use std::io;
use std::path::Path;

pub const PERM_LEN: usize = 9;

const NANOS_PER_SEC: i64 = 1_000_000_000;
const PERM_CHARS: [(u32, char); PERM_LEN] = [
    (0o400, 'r'),
    (0o200, 'w'),
    (0o100, 'x'),
    (0o040, 'r'),
    (0o020, 'w'),
    (0o010, 'x'),
    (0o004, 'r'),
    (0o002, 'w'),
    (0o001, 'x'),
];

/// `0o754` -> `"rwxr-xr--"`. Bits above the low nine are ignored.
pub fn perms_to_string(mode: u32) -> String {
    PERM_CHARS
        .iter()
        .map(|&(bit, c)| if mode & bit != 0 { c } else { '-' })
        .collect()
}

pub fn perms_from_str(s: &str) -> Result<u32> {
    if s.len() != PERM_LEN {
        return Err(SplitError::Format(format!("bad permission string: {s:?}")));
    }
    let mut mode = 0u32;
    for (ch, &(bit, c)) in s.chars().zip(PERM_CHARS.iter()) {
        if ch == c {
            mode |= bit;
        } else if ch != '-' {
            return Err(SplitError::Format(format!("bad permission string: {s:?}")));
        }
    }
    Ok(mode)
}

pub fn mode_of(md: &Metadata) -> u32 {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        md.permissions().mode() & 0o777
    }
    #[cfg(not(unix))]
    {
        let base = if md.is_dir() { 0o777 } else { 0o666 };
        if md.permissions().readonly() {
            base & !0o222
        } else {
            base
        }
    }
}

pub fn apply_mode(path: &Path, mode: u32) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode & 0o777))
    }
    #[cfg(not(unix))]
    {
        let mut perms = std::fs::metadata(path)?.permissions();
        perms.set_readonly(mode & 0o222 == 0);
        std::fs::set_permissions(path, perms)
    }
}

pub fn mtime_ticks(md: &Metadata) -> u64 {
    filetime_to_ticks(FileTime::from_last_modification_time(md))
}

pub fn filetime_to_ticks(ft: FileTime) -> u64 {
    ft.unix_seconds()
        .saturating_mul(NANOS_PER_SEC)
        .saturating_add(i64::from(ft.nanoseconds())) as u64
}

pub fn ticks_to_filetime(ticks: u64) -> FileTime {
    let t = ticks as i64;
    FileTime::from_unix_time(
        t.div_euclid(NANOS_PER_SEC),
        t.rem_euclid(NANOS_PER_SEC) as u32,
    )
}

pub fn apply_mtime(path: &Path, ticks: u64) -> io::Result<()> {
    filetime::set_file_mtime(path, ticks_to_filetime(ticks))
}

/// RFC 3339 rendering for listings; falls back to the raw tick count when out of range.
pub fn format_ticks(ticks: u64) -> String {
    let nanos = i128::from(ticks as i64);
    time::OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .ok()
        .and_then(|t| {
            t.format(&time::format_description::well_known::Rfc3339)
                .ok()
        })
        .unwrap_or_else(|| ticks.to_string())
}
