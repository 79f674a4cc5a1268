//! Content discovery.
//!
//! Walks the staged tree and classifies every directory:
//!
//! - **content**: directly contains the index document (`index.md`)
//! - **hidden content**: content whose path has a segment starting with `_` or `.`
//! - **non-content**: everything else, copied to the output untouched
//!
//! ```text
//! site/
//! ├── index.md          # /          content
//! ├── blog/
//! │   ├── index.md      # /blog      content
//! │   └── _draft/
//! │       └── index.md  # /blog/_draft   hidden content
//! ├── assets/           #            non-content
//! └── node_modules/     #            never content, not descended into
//! ```
//!
//! The index check is per directory: a directory without an index document
//! can still have content directories below it.

use crate::sitepath;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

const EXCLUDED_DIR: &str = "node_modules";

#[derive(Error, Debug)]
pub enum DiscoverError {
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

/// A directory holding a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDir {
    /// Canonical site path (`/`, `/blog/post-1`).
    pub path: String,
    /// The directory on disk.
    pub dir: PathBuf,
}

/// Content directories found under a root, in walk order (sorted by name).
#[derive(Debug, Default)]
pub struct Discovery {
    pub content: Vec<ContentDir>,
    pub hidden: Vec<ContentDir>,
}

impl Discovery {
    /// Ordinary and hidden content directories together.
    pub fn all(&self) -> impl Iterator<Item = &ContentDir> {
        self.content.iter().chain(self.hidden.iter())
    }
}

pub fn discover(root: &Path, index_name: &str) -> Result<Discovery, DiscoverError> {
    let mut discovery = Discovery::default();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || e.file_name() != EXCLUDED_DIR);

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_dir() || !entry.path().join(index_name).is_file() {
            continue;
        }

        let rel = entry.path().strip_prefix(root).unwrap_or(Path::new(""));
        let content_dir = ContentDir {
            path: sitepath::from_relative(rel),
            dir: entry.path().to_path_buf(),
        };

        if sitepath::is_hidden(&content_dir.path) {
            discovery.hidden.push(content_dir);
        } else {
            discovery.content.push(content_dir);
        }
    }

    Ok(discovery)
}
