//! Canonical site paths.
//!
//! Every page is keyed by a slash-separated path relative to the site root:
//! `/` for the root, `/blog/post-1` for a nested page. These helpers are pure
//! string operations; the filesystem is only touched by [`to_fs_path`]'s
//! callers.

use std::path::{Component, Path, PathBuf};

pub const ROOT: &str = "/";

/// Canonical site path for a directory relative to the site root.
///
/// Platform separators become `/`; an empty relative path is the root.
pub fn from_relative(rel: &Path) -> String {
    let segments: Vec<String> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    join(segments.iter().map(String::as_str))
}

/// Non-empty segments of a site path.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn join<'a>(segments: impl Iterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for segment in segments {
        out.push('/');
        out.push_str(segment);
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

/// 0 for the root, otherwise the number of segments.
pub fn depth(path: &str) -> usize {
    segments(path).count()
}

/// The path with its last segment removed; `None` for the root.
pub fn parent(path: &str) -> Option<String> {
    let segments: Vec<&str> = segments(path).collect();
    match segments.split_last() {
        Some((_, init)) => Some(join(init.iter().copied())),
        None => None,
    }
}

/// The path itself followed by every ancestor, ending with the root.
pub fn ancestors(path: &str) -> Vec<String> {
    let mut chain = vec![join(segments(path))];
    while let Some(up) = chain.last().and_then(|p| parent(p)) {
        chain.push(up);
    }
    chain
}

/// A path is hidden when any segment starts with `_` or `.`.
pub fn is_hidden(path: &str) -> bool {
    segments(path).any(|s| s.starts_with('_') || s.starts_with('.'))
}

/// Directory for `path` under the filesystem `root`.
pub fn to_fs_path(root: &Path, path: &str) -> PathBuf {
    segments(path).fold(root.to_path_buf(), |dir, segment| dir.join(segment))
}

/// Relative link from one site path to another.
///
/// `relative("/blog/posts", "/about")` is `../../about`; identical paths
/// give `.`.
pub fn relative(from: &str, to: &str) -> String {
    let from: Vec<&str> = segments(from).collect();
    let to: Vec<&str> = segments(to).collect();

    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let parts: Vec<&str> = std::iter::repeat_n("..", from.len() - common)
        .chain(to[common..].iter().copied())
        .collect();

    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}
