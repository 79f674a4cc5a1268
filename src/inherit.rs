//! Inheritance of metadata, layouts and helpers along the directory chain.
//!
//! For a page at `/blog/post` the chain is `/blog/post`, `/blog`, `/`. Each
//! of the three resolutions walks it differently:
//!
//! ```text
//! meta.yaml      /  →  /blog  →  /blog/post   merge all, deeper wins
//! layout.html    /blog/post  →  /blog  →  /   first one found wins
//! helpers.yaml   /blog/post  →  /blog  →  /   merge all, closer wins
//! ```
//!
//! Control files are optional at every level. Per-directory results are
//! cached for the run, so a broken file is reported once rather than once per
//! page below it.

use crate::config::FileNames;
use crate::helpers::{HelperLoader, HelperSet, overlay};
use crate::log::Reporter;
use crate::meta::{load_meta_file, merge_maps};
use crate::sitepath::{self, ROOT};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Layout resolved for a page.
#[derive(Debug, Clone, PartialEq)]
pub enum Layout {
    /// A layout file found on the chain.
    File { path: PathBuf, source: String },
    /// No layout anywhere up to the root.
    Default,
}

/// Resolves inherited values inside one working copy.
pub struct Resolver<'a> {
    root: &'a Path,
    files: &'a FileNames,
    loader: &'a dyn HelperLoader,
    reporter: &'a dyn Reporter,
    meta_cache: Mutex<HashMap<String, Map<String, Value>>>,
    helper_cache: Mutex<HashMap<String, HelperSet>>,
}

impl<'a> Resolver<'a> {
    pub fn new(
        root: &'a Path,
        files: &'a FileNames,
        loader: &'a dyn HelperLoader,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            root,
            files,
            loader,
            reporter,
            meta_cache: Mutex::new(HashMap::new()),
            helper_cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn files(&self) -> &FileNames {
        self.files
    }

    /// Metadata files from the root down to `path`, deep-merged.
    pub fn metadata(&self, path: &str) -> Map<String, Value> {
        sitepath::ancestors(path)
            .iter()
            .rev()
            .fold(Map::new(), |acc, dir| merge_maps(acc, self.dir_meta(dir)))
    }

    /// The closest layout file to `path`, or [`Layout::Default`].
    pub fn layout(&self, path: &str) -> io::Result<Layout> {
        for dir in sitepath::ancestors(path) {
            let file = sitepath::to_fs_path(self.root, &dir).join(&self.files.layout);
            match fs::read_to_string(&file) {
                Ok(source) => return Ok(Layout::File { path: file, source }),
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(Layout::Default)
    }

    /// User helpers visible at `path`; closer definitions win.
    ///
    /// Walks leaf to root. Each directory's helpers become the new base with
    /// everything collected so far layered on top, and the root's helpers go
    /// underneath once more at the end.
    pub fn helpers(&self, path: &str) -> HelperSet {
        let mut helpers = HelperSet::new();
        let mut root_helpers = HelperSet::new();

        for dir in sitepath::ancestors(path) {
            let found = self.dir_helpers(&dir);
            if dir == ROOT {
                root_helpers = found.clone();
            }
            helpers = overlay(found, helpers);
        }

        overlay(root_helpers, helpers)
    }

    fn dir_meta(&self, dir: &str) -> Map<String, Value> {
        let mut cache = self.meta_cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(meta) = cache.get(dir) {
            return meta.clone();
        }

        let file = sitepath::to_fs_path(self.root, dir).join(&self.files.meta);
        let meta = load_meta_file(&file).unwrap_or_else(|e| {
            self.reporter.warn(&format!(
                "Unable to parse {} ({e}), ignoring it",
                self.display(&file)
            ));
            Map::new()
        });
        cache.insert(dir.to_string(), meta.clone());
        meta
    }

    fn dir_helpers(&self, dir: &str) -> HelperSet {
        let mut cache = self.helper_cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(helpers) = cache.get(dir) {
            return helpers.clone();
        }

        let file = sitepath::to_fs_path(self.root, dir).join(&self.files.helpers);
        let helpers = if file.is_file() {
            self.loader.load(&file).unwrap_or_else(|e| {
                self.reporter.warn(&format!(
                    "Unable to load helpers {} ({e}), ignoring them",
                    self.display(&file)
                ));
                HelperSet::new()
            })
        } else {
            HelperSet::new()
        };
        cache.insert(dir.to_string(), helpers.clone());
        helpers
    }

    /// Site-relative form of a working copy path, for messages.
    fn display(&self, file: &Path) -> String {
        let rel = file.strip_prefix(self.root).unwrap_or(file);
        format!("/{}", rel.to_string_lossy().replace('\\', "/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Site;
    use crate::helpers::{Args, Scope, SnippetLoader};
    use crate::log::{Level, MemoryReporter};
    use crate::test_helpers::site_from;
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn resolve<T>(root: &Path, reporter: &MemoryReporter, f: impl FnOnce(&Resolver) -> T) -> T {
        let files = FileNames::default();
        let resolver = Resolver::new(root, &files, &SnippetLoader, reporter);
        f(&resolver)
    }

    #[test]
    fn metadata_merges_root_to_leaf() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "meta.yaml", "site: Example\nlang: en\nnav: {show: true, order: 1}\n");
        write(tmp.path(), "blog/meta.yaml", "lang: sk\nnav: {order: 2}\n");
        write(tmp.path(), "blog/post/meta.yaml", "author: Ann\n");

        let reporter = MemoryReporter::new();
        let meta = resolve(tmp.path(), &reporter, |r| r.metadata("/blog/post"));

        assert_eq!(
            Value::Object(meta),
            json!({
                "site": "Example",
                "lang": "sk",
                "nav": {"show": true, "order": 2},
                "author": "Ann",
            })
        );
        assert!(reporter.entries().is_empty());
    }

    #[test]
    fn metadata_ignores_siblings() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a/meta.yaml", "from: a\n");

        let reporter = MemoryReporter::new();
        let meta = resolve(tmp.path(), &reporter, |r| r.metadata("/b"));
        assert!(meta.is_empty());
    }

    #[test]
    fn malformed_metadata_warns_once_and_is_empty() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "meta.yaml", "title: [broken\n");
        write(tmp.path(), "a/meta.yaml", "title: A\n");

        let reporter = MemoryReporter::new();
        let (a, b) = resolve(tmp.path(), &reporter, |r| (r.metadata("/a"), r.metadata("/b")));

        assert_eq!(a["title"], json!("A"));
        assert!(b.is_empty());
        let warnings = reporter.messages(Level::Warn);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("/meta.yaml"));
    }

    #[test]
    fn layout_closest_wins() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "layout.html", "root");
        write(tmp.path(), "blog/layout.html", "blog");

        let reporter = MemoryReporter::new();
        resolve(tmp.path(), &reporter, |r| {
            let Layout::File { source, .. } = r.layout("/blog/post/deep").unwrap() else {
                panic!("expected a layout file");
            };
            assert_eq!(source, "blog");

            let Layout::File { source, path } = r.layout("/about").unwrap() else {
                panic!("expected a layout file");
            };
            assert_eq!(source, "root");
            assert_eq!(path, tmp.path().join("layout.html"));
        });
    }

    #[test]
    fn layout_falls_back_to_default() {
        let tmp = TempDir::new().unwrap();
        let reporter = MemoryReporter::new();
        let layout = resolve(tmp.path(), &reporter, |r| r.layout("/a/b").unwrap());
        assert_eq!(layout, Layout::Default);
    }

    fn call(helpers: &HelperSet, name: &str, site: &Arc<Site>) -> Value {
        let scope = Scope::new(site.clone(), site.id_of("/").unwrap());
        helpers[name].call(&Args::new(), &scope).unwrap()
    }

    #[test]
    fn helpers_closer_definitions_win() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "helpers.yaml", "greet: root\nfooter: root footer\n");
        write(tmp.path(), "blog/helpers.yaml", "greet: blog\nnav: blog nav\n");
        write(tmp.path(), "blog/post/helpers.yaml", "greet: post\n");

        let site = Arc::new(site_from(&["/"]));
        let reporter = MemoryReporter::new();
        let helpers = resolve(tmp.path(), &reporter, |r| r.helpers("/blog/post"));

        assert_eq!(helpers.len(), 3);
        assert_eq!(call(&helpers, "greet", &site), json!("post"));
        assert_eq!(call(&helpers, "nav", &site), json!("blog nav"));
        assert_eq!(call(&helpers, "footer", &site), json!("root footer"));
    }

    #[test]
    fn root_helpers_reach_every_page() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "helpers.yaml", "greet: root\n");

        let site = Arc::new(site_from(&["/"]));
        let reporter = MemoryReporter::new();
        let (root, deep) = resolve(tmp.path(), &reporter, |r| (r.helpers("/"), r.helpers("/x/y/z")));

        assert_eq!(call(&root, "greet", &site), json!("root"));
        assert_eq!(call(&deep, "greet", &site), json!("root"));
    }

    #[test]
    fn broken_helper_module_contributes_nothing() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "helpers.yaml", "greet: root\n");
        write(tmp.path(), "blog/helpers.yaml", "- not\n- a mapping\n");

        let site = Arc::new(site_from(&["/"]));
        let reporter = MemoryReporter::new();
        let helpers = resolve(tmp.path(), &reporter, |r| {
            r.helpers("/blog/a");
            r.helpers("/blog/b")
        });

        assert_eq!(call(&helpers, "greet", &site), json!("root"));
        let warnings = reporter.messages(Level::Warn);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("/blog/helpers.yaml"));
    }
}
