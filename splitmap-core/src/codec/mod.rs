//! Tagged primitive encoding used by the split map.
//!
//! Every value is written as a one-byte [`Tag`] followed by its payload.
//! Integers are fixed width little-endian. Strings carry an 8-byte length
//! that counts the trailing NUL, then the raw bytes and the NUL itself.
//! The stream is positional: a reader must ask for exactly the kind that
//! was written at that position, otherwise decoding fails.

use std::fmt;

#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Tag {
    U8 = 0,
    U16 = 1,
    U32 = 2,
    U64 = 3,
    Str = 4,
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tag::U8 => "U8",
            Tag::U16 => "U16",
            Tag::U32 => "U32",
            Tag::U64 => "U64",
            Tag::Str => "STR",
        };
        f.write_str(name)
    }
}

pub mod reader;
pub mod writer;

pub use reader::BinReader;
pub use writer::BinWriter;
