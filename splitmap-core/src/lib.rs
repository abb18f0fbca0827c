#![forbid(unsafe_code)]

pub mod error;
pub mod meta;
pub mod naming;
pub mod stats;

pub mod util {
    pub mod io;
}

pub mod codec;
pub mod index;
pub mod net;

pub mod pack {
    pub mod splitter;
    pub mod walker;
    pub mod writer;
}

pub mod read {
    pub mod containers;
    pub mod extract;
    pub mod remote;
}

pub mod list;

// Re-exports: stable API surface
pub use error::{Result, SplitError};
pub use index::SplitMap;
pub use list::{ListOptions, list};
pub use naming::IndexSource;
pub use pack::writer::{SplitOptions, pack};
pub use read::extract::{JoinOptions, extract, join};
pub use read::remote::join_remote;
pub use stats::{JoinReport, PackReport};
