//! Fetch-by-URL for remote split maps and containers.
//!
//! A [`Transport`] performs exactly one request. Redirects are chased here,
//! in a loop bounded by a hop limit.

use crate::error::{Result, SplitError};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tracing::debug;
use url::Url;

pub const DEFAULT_MAX_REDIRECTS: u32 = 8;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    /// Raw `Location` header, if any.
    pub location: Option<String>,
}

pub trait Transport {
    /// Issue one request for `url` without following redirects. The body is
    /// streamed into `sink` only when the status is 2xx.
    fn get(&self, url: &Url, sink: &mut dyn Write) -> Result<Reply>;
}

pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("splitmap/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &Url, sink: &mut dyn Write) -> Result<Reply> {
        match url.scheme() {
            "http" | "https" => {}
            other => return Err(SplitError::UnsupportedScheme(other.to_string())),
        }
        let mut resp = self.client.get(url.clone()).send()?;
        let status = resp.status();
        let location = resp
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        if status.is_success() {
            resp.copy_to(sink)?;
        }
        Ok(Reply {
            status: status.as_u16(),
            location,
        })
    }
}

/// Stream `url` into `sink`, following at most `max_redirects` 3xx hops.
/// Returns the URL that finally answered.
pub fn fetch(
    transport: &dyn Transport,
    url: &Url,
    sink: &mut dyn Write,
    max_redirects: u32,
) -> Result<Url> {
    let mut target = url.clone();
    let mut hops = 0u32;
    loop {
        debug!(hop = hops, "GET {target}");
        let reply = transport.get(&target, sink)?;
        match reply.status {
            200..=299 => return Ok(target),
            300..=399 => {
                if hops >= max_redirects {
                    return Err(SplitError::TooManyRedirects {
                        limit: max_redirects,
                        url: url.to_string(),
                    });
                }
                let location = reply.location.ok_or_else(|| {
                    SplitError::Network(format!(
                        "redirect {} from {target} without Location",
                        reply.status
                    ))
                })?;
                target = target.join(&location)?;
                hops += 1;
            }
            status => {
                return Err(SplitError::HttpStatus {
                    status,
                    url: target.to_string(),
                });
            }
        }
    }
}

/// [`fetch`] into a new file at `dest`; a failed fetch leaves no file behind.
pub fn fetch_to_file(
    transport: &dyn Transport,
    url: &Url,
    dest: &Path,
    max_redirects: u32,
) -> Result<()> {
    let mut f = File::create(dest)?;
    let res = fetch(transport, url, &mut f, max_redirects)
        .and_then(|_| f.flush().map_err(SplitError::from));
    if res.is_err() {
        drop(f);
        let _ = fs::remove_file(dest);
    }
    res
}
