//! Shared test utilities for the emde test suite.
//!
//! Provides in-memory page builders for graph and helper tests, an on-disk
//! site builder for tests that touch the filesystem, and lookups that panic
//! with a clear message on a miss.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let site = site_from(&["/", "/blog", "/blog/post"]);
//! assert_eq!(child_paths(&site, "/blog"), vec!["/blog/post"]);
//!
//! let tmp = setup_fixtures();
//! let page = find_page(&site, "/blog");
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::graph::{Page, PageRecord, Site};
use crate::log::MemoryReporter;
use crate::sitepath;

// =========================================================================
// In-memory pages
// =========================================================================

/// One record per path, with empty metadata and the path as its body.
pub fn records(paths: &[&str]) -> Vec<PageRecord> {
    paths
        .iter()
        .map(|&path| PageRecord {
            path: path.to_string(),
            depth: sitepath::depth(path),
            parent_path: sitepath::parent(path),
            meta: Default::default(),
            content: path.to_string(),
            html: format!("<p>{path}</p>\n"),
            hidden: sitepath::is_hidden(path),
            dir: sitepath::to_fs_path(Path::new("/site"), path),
        })
        .collect()
}

/// A linked site over `paths`. Link warnings are dropped.
pub fn site_from(paths: &[&str]) -> Site {
    Site::link(records(paths), &MemoryReporter::new())
}

// =========================================================================
// On-disk sites
// =========================================================================

/// Copy `fixtures/site/` to a temp directory and return it.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// Write `content` to `rel` under `root`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, content: &str) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

/// Write an index document for every site path under `root`.
pub fn write_pages(root: &Path, paths: &[&str]) {
    for path in paths {
        let dir = sitepath::to_fs_path(root, path);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("index.md"), format!("# {path}\n")).unwrap();
    }
}

/// Every file under `root`, as sorted `/`-separated relative paths.
pub fn list_files(root: &Path) -> Vec<String> {
    let mut files: Vec<String> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            e.path()
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    files.sort();
    files
}

// =========================================================================
// Lookups, panics with a clear message on miss
// =========================================================================

/// Find a page by path. Panics if not found.
pub fn find_page<'a>(site: &'a Site, path: &str) -> &'a Page {
    site.by_path(path).unwrap_or_else(|| {
        let paths: Vec<&str> = site.iter().map(|p| p.path.as_str()).collect();
        panic!("page '{path}' not found. Available: {paths:?}")
    })
}

/// Paths of the children of the page at `path`.
pub fn child_paths<'a>(site: &'a Site, path: &str) -> Vec<&'a str> {
    let id = find_page(site, path).id;
    site.children(id).iter().map(|p| p.path.as_str()).collect()
}

/// Path of the parent of the page at `path`, if any.
pub fn parent_path<'a>(site: &'a Site, path: &str) -> Option<&'a str> {
    site.parent(find_page(site, path)).map(|p| p.path.as_str())
}
