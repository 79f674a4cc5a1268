//! The page graph.
//!
//! Built in two passes so that parents can be linked only once every page is
//! known:
//!
//! 1. [`read_page`] turns one content directory into a [`PageRecord`] whose
//!    parent is still a path string, computed by dropping the last segment.
//! 2. [`Site::link`] moves every record into one arena and swaps the parent
//!    path for a [`PageId`] handle into that arena.
//!
//! After linking, the [`Site`] is read-only and shared by every render.

use crate::discover::ContentDir;
use crate::frontmatter::{FrontMatterError, parse_front_matter};
use crate::inherit::Resolver;
use crate::log::Reporter;
use crate::meta::merge_maps;
use crate::sitepath::{self, ROOT};
use pulldown_cmark::{Options, Parser, html as md_html};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("front matter: {0}")]
    FrontMatter(#[from] FrontMatterError),
}

/// Handle to a page in a [`Site`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(usize);

/// Pass 1 output: a page whose parent is still a path.
#[derive(Debug, Clone)]
pub struct PageRecord {
    pub path: String,
    pub depth: usize,
    pub parent_path: Option<String>,
    pub meta: Map<String, Value>,
    pub content: String,
    pub html: String,
    pub hidden: bool,
    pub dir: PathBuf,
}

/// A linked page.
#[derive(Debug, Clone)]
pub struct Page {
    pub id: PageId,
    /// Canonical site path, unique across the site.
    pub path: String,
    /// 0 for the root.
    pub depth: usize,
    /// Inherited metadata with the page's front matter merged on top.
    pub meta: Map<String, Value>,
    /// Markdown body without front matter.
    pub content: String,
    /// `content` rendered to HTML.
    pub html: String,
    pub parent: Option<PageId>,
    pub hidden: bool,
    /// Page directory inside the working copy.
    pub dir: PathBuf,
}

/// What templates see of a page.
#[derive(Debug, Serialize)]
pub struct PageView<'a> {
    pub path: &'a str,
    pub depth: usize,
    pub meta: &'a Map<String, Value>,
    pub content: &'a str,
    pub html: &'a str,
    pub parent: Option<&'a str>,
    pub hidden: bool,
}

/// Convert markdown to HTML with the common GitHub extensions enabled.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_FOOTNOTES);

    let parser = Parser::new_ext(markdown, options);
    let mut html = String::new();
    md_html::push_html(&mut html, parser);
    html
}

/// Pass 1 for one content directory.
pub fn read_page(
    content_dir: &ContentDir,
    resolver: &Resolver,
    strict_front_matter: bool,
) -> Result<PageRecord, ReadError> {
    let markdown = fs::read_to_string(content_dir.dir.join(&resolver.files().index))?;
    let parsed = parse_front_matter(&markdown, strict_front_matter)?;

    let inherited = resolver.metadata(&content_dir.path);
    let meta = match parsed.meta {
        Some(own) => merge_maps(inherited, own),
        None => inherited,
    };

    Ok(PageRecord {
        path: content_dir.path.clone(),
        depth: sitepath::depth(&content_dir.path),
        parent_path: sitepath::parent(&content_dir.path),
        meta,
        html: markdown_to_html(&parsed.content),
        content: parsed.content,
        hidden: sitepath::is_hidden(&content_dir.path),
        dir: content_dir.dir.clone(),
    })
}

/// Every page of one run: an arena plus a path index.
#[derive(Debug, Default)]
pub struct Site {
    pages: Vec<Page>,
    by_path: BTreeMap<String, PageId>,
}

impl Site {
    /// Pass 2: link parent paths to page handles.
    ///
    /// A parent path that is not itself a page (a directory without an index
    /// document, or a page that failed to read) falls through to the nearest
    /// ancestor that is. A non-root page with no page above it at all keeps
    /// no parent and is reported.
    pub fn link(records: Vec<PageRecord>, reporter: &dyn Reporter) -> Site {
        let mut site = Site::default();
        let mut parent_paths = Vec::new();

        for record in records {
            if site.by_path.contains_key(&record.path) {
                reporter.warn(&format!("duplicate page path {}, keeping the first", record.path));
                continue;
            }
            let id = PageId(site.pages.len());
            site.by_path.insert(record.path.clone(), id);
            site.pages.push(Page {
                id,
                path: record.path,
                depth: record.depth,
                meta: record.meta,
                content: record.content,
                html: record.html,
                // Pass 1 parent path, resolved below.
                parent: None,
                hidden: record.hidden,
                dir: record.dir,
            });
            parent_paths.push(record.parent_path);
        }

        for (index, parent_path) in parent_paths.into_iter().enumerate() {
            let Some(parent_path) = parent_path else {
                continue;
            };
            let parent = sitepath::ancestors(&parent_path)
                .iter()
                .find_map(|p| site.by_path.get(p).copied());
            if parent.is_none() {
                reporter.warn(&format!(
                    "{} has no parent page (no {} page above it)",
                    site.pages[index].path, ROOT
                ));
            }
            site.pages[index].parent = parent;
        }

        site
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn get(&self, id: PageId) -> &Page {
        &self.pages[id.0]
    }

    pub fn id_of(&self, path: &str) -> Option<PageId> {
        self.by_path.get(path).copied()
    }

    pub fn by_path(&self, path: &str) -> Option<&Page> {
        self.id_of(path).map(|id| self.get(id))
    }

    pub fn root(&self) -> Option<&Page> {
        self.by_path(ROOT)
    }

    pub fn parent(&self, page: &Page) -> Option<&Page> {
        page.parent.map(|id| self.get(id))
    }

    /// Pages ordered by path.
    pub fn iter(&self) -> impl Iterator<Item = &Page> {
        self.by_path.values().map(|&id| self.get(id))
    }

    /// Pages in discovery order.
    pub fn ids(&self) -> impl Iterator<Item = PageId> + '_ {
        self.pages.iter().map(|p| p.id)
    }

    /// Ancestor chain from the top down to `id` itself.
    pub fn breadcrumbs(&self, id: PageId) -> Vec<&Page> {
        let mut chain = vec![self.get(id)];
        while let Some(parent) = chain.last().and_then(|p| self.parent(p)) {
            chain.push(parent);
        }
        chain.reverse();
        chain
    }

    /// Pages whose parent is `id`, by path.
    pub fn children(&self, id: PageId) -> Vec<&Page> {
        self.iter().filter(|p| p.parent == Some(id)).collect()
    }

    /// Pages sharing `id`'s parent, excluding `id`, by path.
    pub fn siblings(&self, id: PageId) -> Vec<&Page> {
        let parent = self.get(id).parent;
        self.iter()
            .filter(|p| p.id != id && p.parent == parent)
            .collect()
    }

    pub fn view(&self, id: PageId) -> PageView<'_> {
        let page = self.get(id);
        PageView {
            path: &page.path,
            depth: page.depth,
            meta: &page.meta,
            content: &page.content,
            html: &page.html,
            parent: self.parent(page).map(|p| p.path.as_str()),
            hidden: page.hidden,
        }
    }

    /// Every page view keyed by path.
    pub fn views(&self) -> BTreeMap<&str, PageView<'_>> {
        self.iter()
            .map(|p| (p.path.as_str(), self.view(p.id)))
            .collect()
    }
}
