//! Filesystem staging: the working copy a run mutates, and its commit.
//!
//! A run never writes to the source and never half-writes the destination.
//! The source is copied into a uniquely named working directory created next
//! to the destination, every later stage mutates that copy, and only a
//! finished copy is moved into place:
//!
//! ```text
//! out/               parent of the destination
//! ├── site/          destination (old contents, if any)
//! └── .emde-a1B2c3/  working copy: copy → render → clean → rename to site/
//! ```
//!
//! Keeping the working copy on the destination's volume makes the final move
//! a rename. If anything fails before commit, dropping the [`WorkingCopy`]
//! removes it.

use crate::config::FileNames;
use crate::discover::ContentDir;
use crate::sitepath;
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tempfile::TempDir;
use thiserror::Error;
use walkdir::WalkDir;

const WORKING_PREFIX: &str = ".emde-";
const ASIDE_SUFFIX: &str = ".emde-old";

#[derive(Error, Debug)]
pub enum StagingError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Destination {0} has no parent directory")]
    NoParent(PathBuf),
}

/// Absolute, lexically normalized form of `path`.
///
/// Relative paths are joined onto the current directory; `.` is dropped and
/// `..` removes the previous component. Symlinks are not resolved, so the
/// path need not exist.
pub fn normalize(path: &Path) -> io::Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    Ok(out)
}

/// Whether `path` is `base` or lies under it. Both must be normalized.
pub fn is_within(path: &Path, base: &Path) -> bool {
    path.starts_with(base)
}

/// A missing directory counts as empty.
pub fn is_empty_dir(path: &Path) -> io::Result<bool> {
    match fs::read_dir(path) {
        Ok(mut entries) => Ok(entries.next().is_none()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(true),
        Err(e) => Err(e),
    }
}

/// Remove a file or a whole directory. Already gone is not an error.
///
/// Returns whether anything was removed.
pub fn remove_if_exists(path: &Path) -> io::Result<bool> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };
    let removed = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    match removed {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Copy every file under `src` into `dst`, following symlinks.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<u64, StagingError> {
    let mut copied = 0;
    for entry in WalkDir::new(src).follow_links(true) {
        let entry = entry?;
        let rel = entry.path().strip_prefix(src).unwrap_or(Path::new(""));
        let target = dst.join(rel);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// The isolated copy of the source tree a run works on.
pub struct WorkingCopy {
    dir: TempDir,
}

impl WorkingCopy {
    /// Create a working directory beside `dest` and copy `source` into it.
    ///
    /// Both paths must already be normalized and validated.
    pub fn stage(source: &Path, dest: &Path) -> Result<Self, StagingError> {
        let parent = dest
            .parent()
            .ok_or_else(|| StagingError::NoParent(dest.to_path_buf()))?;
        fs::create_dir_all(parent)?;

        let dir = tempfile::Builder::new()
            .prefix(WORKING_PREFIX)
            .tempdir_in(parent)?;
        copy_tree(source, dir.path())?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Delete hidden content directories. Returns how many were removed.
    pub fn remove_hidden(&self, hidden: &[ContentDir]) -> io::Result<usize> {
        let mut removed = 0;
        for content_dir in hidden {
            // Nested hidden pages go with their hidden ancestor.
            if remove_if_exists(&content_dir.dir)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Delete control files along every content directory's ancestor chain.
    ///
    /// The index document is included, so sources of pages that failed to
    /// render do not reach the output. Returns how many files were removed.
    pub fn remove_control_files<'a>(
        &self,
        content: impl IntoIterator<Item = &'a ContentDir>,
        files: &FileNames,
    ) -> io::Result<usize> {
        let chains: BTreeSet<String> = content
            .into_iter()
            .flat_map(|d| sitepath::ancestors(&d.path))
            .collect();

        let names = files.control_files();
        let mut removed = 0;
        for path in &chains {
            let dir = sitepath::to_fs_path(self.path(), path);
            for name in names.into_iter().chain([files.index.as_str()]) {
                if remove_if_exists(&dir.join(name))? {
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }

    /// Move the working copy onto `dest`, replacing what was there.
    ///
    /// An existing destination is renamed aside first and only removed once
    /// the working copy is in place; if that rename fails it is put back.
    pub fn commit(self, dest: &Path) -> Result<(), StagingError> {
        let aside = if fs::symlink_metadata(dest).is_ok() {
            let aside = aside_path(dest);
            remove_if_exists(&aside)?;
            fs::rename(dest, &aside)?;
            Some(aside)
        } else {
            None
        };

        let working = self.dir.keep();
        if let Err(e) = fs::rename(&working, dest) {
            if let Some(aside) = &aside {
                fs::rename(aside, dest)?;
            }
            remove_if_exists(&working)?;
            return Err(e.into());
        }

        if let Some(aside) = aside {
            remove_if_exists(&aside)?;
        }
        Ok(())
    }
}

fn aside_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(ASIDE_SUFFIX);
    dest.with_file_name(name)
}
