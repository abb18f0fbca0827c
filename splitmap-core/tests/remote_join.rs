#![cfg(unix)]

mod common;

use common::{build_tree, file_names, snapshot};
use splitmap_core::list::{ListOptions, load_remote, render};
use splitmap_core::net::{Reply, Transport};
use splitmap_core::{JoinOptions, Result, SplitError, SplitOptions, join_remote, pack};
use std::cell::RefCell;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use url::Url;

/// Serves `http://files/<name>` from a directory; `http://moved/<name>`
/// answers with a redirect to the same name under `files`.
struct DirServer {
    root: PathBuf,
    requests: RefCell<Vec<String>>,
}

impl DirServer {
    fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            requests: RefCell::new(Vec::new()),
        }
    }

    fn count(&self, suffix: &str) -> usize {
        self.requests
            .borrow()
            .iter()
            .filter(|r| r.ends_with(suffix))
            .count()
    }
}

impl Transport for DirServer {
    fn get(&self, url: &Url, sink: &mut dyn Write) -> Result<Reply> {
        self.requests.borrow_mut().push(url.to_string());
        let name = url.path().trim_start_matches('/');
        match url.host_str() {
            Some("moved") => Ok(Reply {
                status: 302,
                location: Some(format!("http://files/{name}")),
            }),
            Some("files") => match fs::read(self.root.join(name)) {
                Ok(body) => {
                    sink.write_all(&body)?;
                    Ok(Reply {
                        status: 200,
                        location: None,
                    })
                }
                Err(_) => Ok(Reply {
                    status: 404,
                    location: None,
                }),
            },
            _ => Err(SplitError::Network(format!("no route to {url}"))),
        }
    }
}

fn packed_tree(tmp: &Path) -> (PathBuf, PathBuf) {
    let src = tmp.join("src");
    let served = tmp.join("served");
    fs::create_dir(&served).unwrap();
    build_tree(&src);
    pack(
        &src,
        &SplitOptions {
            capacity: 128,
            prefix: "bk.".into(),
            work_dir: served.clone(),
            ..Default::default()
        },
    )
    .unwrap();
    (src, served)
}

#[test]
fn remote_join_fetches_each_container_once_and_keeps_copies() {
    let tmp = tempfile::tempdir().unwrap();
    let (src, served) = packed_tree(tmp.path());
    let out = tmp.path().join("out");
    let keep = tmp.path().join("keep");
    let server = DirServer::new(&served);

    let url = Url::parse("http://files/bk.split.map").unwrap();
    let report = join_remote(
        &url,
        &JoinOptions {
            out_dir: out.clone(),
            retain_dir: keep.clone(),
            ..Default::default()
        },
        &server,
    )
    .unwrap();

    assert_eq!(snapshot(&out), snapshot(&src));
    assert_eq!(server.count("bk.split.map"), 1);
    for name in file_names(&served) {
        assert_eq!(server.count(&name), 1, "{name}");
    }
    assert_eq!(file_names(&keep), file_names(&served));
    assert_eq!(report.retained.len(), file_names(&served).len());
    assert_eq!(
        fs::read(keep.join("bk.split.0")).unwrap(),
        fs::read(served.join("bk.split.0")).unwrap()
    );
}

#[test]
fn remote_join_with_removal_keeps_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let (src, served) = packed_tree(tmp.path());
    let out = tmp.path().join("out");
    let keep = tmp.path().join("keep");
    let server = DirServer::new(&served);

    let url = Url::parse("http://moved/bk.split.map").unwrap();
    let report = join_remote(
        &url,
        &JoinOptions {
            out_dir: out.clone(),
            retain_dir: keep.clone(),
            remove_containers: true,
            ..Default::default()
        },
        &server,
    )
    .unwrap();

    assert_eq!(snapshot(&out), snapshot(&src));
    assert!(report.retained.is_empty());
    assert!(!keep.exists());
    // Served files stay in place.
    assert!(served.join("bk.split.map").exists());
}

#[test]
fn missing_container_fails_the_join() {
    let tmp = tempfile::tempdir().unwrap();
    let (_, served) = packed_tree(tmp.path());
    fs::remove_file(served.join("bk.split.3")).unwrap();
    let server = DirServer::new(&served);

    let url = Url::parse("http://files/bk.split.map").unwrap();
    let err = join_remote(
        &url,
        &JoinOptions {
            out_dir: tmp.path().join("out"),
            retain_dir: tmp.path().join("keep"),
            ..Default::default()
        },
        &server,
    )
    .unwrap_err();
    assert!(matches!(err, SplitError::HttpStatus { status: 404, .. }));
    assert!(!tmp.path().join("keep").exists());
}

#[test]
fn remote_listing_reads_only_the_map() {
    let tmp = tempfile::tempdir().unwrap();
    let (_, served) = packed_tree(tmp.path());
    let server = DirServer::new(&served);

    let url = Url::parse("http://files/bk.split.map").unwrap();
    let map = load_remote(&url, &server, 8).unwrap();
    let mut out = Vec::new();
    render(&map, &ListOptions::default(), &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(text.contains("reading 3 directories"));
    assert!(text.contains(" link -> docs/big.bin"));
    assert_eq!(server.requests.borrow().len(), 1);
}

#[test]
fn kept_copies_never_replace_restored_files() {
    let tmp = tempfile::tempdir().unwrap();
    let src = tmp.path().join("src");
    let served = tmp.path().join("served");
    let out = tmp.path().join("out");
    fs::create_dir_all(&src).unwrap();
    fs::create_dir(&served).unwrap();
    fs::write(src.join("bk.split.map"), b"USER DATA").unwrap();
    fs::write(src.join("other.txt"), b"more").unwrap();
    pack(
        &src,
        &SplitOptions {
            capacity: 8,
            prefix: "bk.".into(),
            work_dir: served.clone(),
            ..Default::default()
        },
    )
    .unwrap();
    let server = DirServer::new(&served);

    let url = Url::parse("http://files/bk.split.map").unwrap();
    let report = join_remote(
        &url,
        &JoinOptions {
            out_dir: out.clone(),
            retain_dir: out.clone(),
            ..Default::default()
        },
        &server,
    )
    .unwrap();

    assert_eq!(fs::read(out.join("bk.split.map")).unwrap(), b"USER DATA");
    assert_eq!(fs::read(out.join("other.txt")).unwrap(), b"more");
    assert!(!report.retained.contains(&out.join("bk.split.map")));
    assert!(report.retained.contains(&out.join("bk.split.0")));
}
