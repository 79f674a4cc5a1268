//! Page rendering.
//!
//! Layouts are Tera templates. Each page is rendered with these variables:
//!
//! | Variable | Value |
//! |----------|-------|
//! | `page` | the page (`path`, `depth`, `meta`, `content`, `html`, `parent`, `hidden`) |
//! | `parent` | the parent page, or null |
//! | `root` | the page at `/`, or null |
//! | `pages` | every page keyed by path |
//!
//! plus the page's helpers registered as functions (see [`crate::helpers`]).
//! Layouts named `*.html` autoescape, so the body goes out as
//! `{{ page.html | safe }}`.

use crate::config::FileNames;
use crate::graph::{Page, PageId, PageView, Site};
use crate::helpers::{self, HelperSet, Scope};
use crate::inherit::Layout;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::io;
use std::sync::Arc;
use tera::{Context, Tera};
use thiserror::Error;

/// Used when no layout file exists anywhere up to the root.
pub const DEFAULT_LAYOUT: &str = r#"<!DOCTYPE html>
<html lang="en">
	<head>
		<meta charset="utf-8" />
		<meta name="viewport" content="width=device-width, initial-scale=1" />
		<title>{{ page.meta.title | default(value="Untitled") }}</title>
	</head>
	<body>{{ page.html | safe }}</body>
</html>
"#;

const DEFAULT_LAYOUT_NAME: &str = "default.html";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Template error: {0}")]
    Template(#[from] tera::Error),
}

#[derive(Serialize)]
struct RenderContext<'a> {
    page: PageView<'a>,
    parent: Option<PageView<'a>>,
    root: Option<PageView<'a>>,
    pages: &'a Value,
}

/// Renders pages of one linked site.
pub struct Renderer {
    site: Arc<Site>,
    pages: Value,
    builtins: HelperSet,
}

impl Renderer {
    pub fn new(site: Arc<Site>) -> Result<Self, RenderError> {
        let pages = serde_json::to_value(site.views())?;
        Ok(Self {
            site,
            pages,
            builtins: helpers::builtins(),
        })
    }

    pub fn site(&self) -> &Site {
        &self.site
    }

    /// Render page `id` through `layout`. `user_helpers` override built-ins.
    pub fn render(
        &self,
        id: PageId,
        layout: &Layout,
        user_helpers: HelperSet,
    ) -> Result<String, RenderError> {
        let (name, source) = match layout {
            Layout::File { path, source } => (
                path.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| DEFAULT_LAYOUT_NAME.to_string()),
                source.as_str(),
            ),
            Layout::Default => (DEFAULT_LAYOUT_NAME.to_string(), DEFAULT_LAYOUT),
        };

        let mut tera = Tera::default();
        tera.add_raw_template(&name, source)?;

        let scope = Scope::new(self.site.clone(), id);
        for (helper_name, helper) in helpers::overlay(self.builtins.clone(), user_helpers) {
            tera.register_function(&helper_name, helpers::bind(helper, scope.clone()));
        }

        let page = self.site.get(id);
        let context = RenderContext {
            page: self.site.view(id),
            parent: self.site.parent(page).map(|p| self.site.view(p.id)),
            root: self.site.root().map(|p| self.site.view(p.id)),
            pages: &self.pages,
        };

        Ok(tera.render(&name, &Context::from_serialize(&context)?)?)
    }
}

/// Write the rendered page next to its source and drop the source.
pub fn write_page(page: &Page, html: &str, files: &FileNames) -> io::Result<()> {
    fs::write(page.dir.join(&files.output), html)?;
    match fs::remove_file(page.dir.join(&files.index)) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}
