use crate::error::{Result, SplitError};
use std::path::PathBuf;
use url::Url;

/// Capacity used when the caller asks for 0.
pub const DEFAULT_CAPACITY: u64 = 4096 * 1024;

pub const URL_SCHEMES: [&str; 4] = ["http://", "https://", "ftp://", "ftps://"];

/// A user-facing name `N` becomes the prefix `N.`; an empty name stays empty.
pub fn prefix_from_name(name: &str) -> String {
    if name.is_empty() {
        String::new()
    } else {
        format!("{name}.")
    }
}

pub fn index_file_name(prefix: &str) -> String {
    format!("{prefix}split.map")
}

pub fn container_file_name(prefix: &str, n: u64) -> String {
    format!("{prefix}split.{n}")
}

/// Where a split map comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IndexSource {
    Local(PathBuf),
    Remote(Url),
}

impl IndexSource {
    pub fn parse(s: &str) -> Result<Self> {
        let lower = s.to_ascii_lowercase();
        if URL_SCHEMES.iter().any(|scheme| lower.starts_with(scheme)) {
            let url = Url::parse(s)?;
            if url.path_segments().and_then(|mut p| p.next_back()).is_none_or(str::is_empty) {
                return Err(SplitError::Precondition(format!(
                    "URL does not name a split map: {s}"
                )));
            }
            Ok(Self::Remote(url))
        } else {
            Ok(Self::Local(PathBuf::from(s)))
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names() {
        assert_eq!(prefix_from_name(""), "");
        assert_eq!(prefix_from_name("backup"), "backup.");
        assert_eq!(index_file_name("backup."), "backup.split.map");
        assert_eq!(container_file_name("", 12), "split.12");
    }

    #[test]
    fn sources_are_told_apart_by_scheme() {
        assert_eq!(
            IndexSource::parse("dir/split.map").unwrap(),
            IndexSource::Local(PathBuf::from("dir/split.map"))
        );
        for s in [
            "http://host/a/split.map",
            "HTTPS://host/split.map",
            "ftp://host/pub/x.split.map",
            "ftps://host/x.split.map",
        ] {
            assert!(IndexSource::parse(s).unwrap().is_remote(), "{s}");
        }
        assert!(IndexSource::parse("httpx://host/split.map").is_ok_and(|s| !s.is_remote()));
    }

    #[test]
    fn url_must_end_in_a_file_name() {
        assert!(IndexSource::parse("http://host/dir/").is_err());
    }
}
