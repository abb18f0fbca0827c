#![allow(dead_code)]

use filetime::FileTime;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

#[derive(Debug, PartialEq, Eq)]
pub enum Node {
    Dir { mode: u32, mtime: FileTime },
    File { mode: u32, mtime: FileTime, data: Vec<u8> },
    Link { target: String },
}

/// Every entry below `root`, keyed by `/`-separated relative path.
pub fn snapshot(root: &Path) -> BTreeMap<String, Node> {
    let mut out = BTreeMap::new();
    for e in WalkDir::new(root).min_depth(1).follow_links(false) {
        let e = e.unwrap();
        let rel = e
            .path()
            .strip_prefix(root)
            .unwrap()
            .to_string_lossy()
            .replace('\\', "/");
        let md = fs::symlink_metadata(e.path()).unwrap();
        let node = if md.file_type().is_symlink() {
            Node::Link {
                target: fs::read_link(e.path()).unwrap().to_string_lossy().into_owned(),
            }
        } else if md.is_dir() {
            Node::Dir {
                mode: mode(&md),
                mtime: FileTime::from_last_modification_time(&md),
            }
        } else {
            Node::File {
                mode: mode(&md),
                mtime: FileTime::from_last_modification_time(&md),
                data: fs::read(e.path()).unwrap(),
            }
        };
        out.insert(rel, node);
    }
    out
}

#[cfg(unix)]
fn mode(md: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    md.permissions().mode() & 0o777
}

#[cfg(not(unix))]
fn mode(md: &fs::Metadata) -> u32 {
    if md.permissions().readonly() { 0o444 } else { 0o644 }
}

#[cfg(unix)]
pub fn chmod(path: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
}

#[cfg(unix)]
pub fn symlink(target: &str, link: &Path) {
    std::os::unix::fs::symlink(target, link).unwrap();
}

/// A small tree with nested dirs, files that span and share containers, an
/// empty file and a relative symlink. Timestamps and modes are pinned.
#[cfg(unix)]
pub fn build_tree(root: &Path) {
    fs::create_dir_all(root.join("docs/deep")).unwrap();
    fs::create_dir(root.join("empty")).unwrap();
    fs::write(root.join("a.txt"), b"hello world!").unwrap();
    fs::write(root.join("docs/big.bin"), (0..=255u8).cycle().take(1000).collect::<Vec<_>>())
        .unwrap();
    fs::write(root.join("docs/deep/note.md"), b"# note\n").unwrap();
    fs::write(root.join("docs/zero"), b"").unwrap();
    symlink("docs/big.bin", &root.join("link"));
    symlink("missing-target", &root.join("dangling"));

    chmod(&root.join("a.txt"), 0o640);
    chmod(&root.join("docs/big.bin"), 0o755);
    chmod(&root.join("docs/deep/note.md"), 0o600);

    let t = |s: i64| FileTime::from_unix_time(s, 123_456_789);
    for (rel, secs) in [
        ("a.txt", 1_600_000_000),
        ("docs/big.bin", 1_600_000_100),
        ("docs/deep/note.md", 1_600_000_200),
        ("docs/zero", 1_600_000_300),
        ("docs/deep", 1_500_000_000),
        ("docs", 1_500_000_100),
        ("empty", 1_500_000_200),
    ] {
        filetime::set_file_mtime(root.join(rel), t(secs)).unwrap();
    }
    chmod(&root.join("docs/deep"), 0o750);
}

pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
