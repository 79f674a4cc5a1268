//! Template helpers.
//!
//! A helper is a named function a layout can call. Every page gets the
//! built-in graph queries:
//!
//! | Helper | Returns |
//! |--------|---------|
//! | `breadcrumbs()` | pages from the top of the tree down to this page |
//! | `children()` | pages whose parent is this page |
//! | `siblings()` | other pages with the same parent |
//! | `relative(to, from?)` | relative link between two site paths |
//! | `sitemap(ul_class?, li_class?, a_class?)` | nested `<ul>` of every page |
//!
//! `breadcrumbs`, `children` and `siblings` take an optional `path` to ask
//! about another page.
//!
//! Sites add their own helpers with `helpers.yaml` files, loaded by a
//! [`HelperLoader`]. The stock [`SnippetLoader`] reads a mapping of name to
//! Tera snippet:
//!
//! ```yaml
//! shout: "{{ text | upper }}!"
//! byline: "by {{ page.meta.author | default(value='anonymous') }}"
//! ```
//!
//! which a layout calls as `{{ shout(text="hi") }}`. Snippets see their call
//! arguments plus the layout variables `page`, `parent`, `root` and `pages`.
//! User helpers override built-ins of the same name.

use crate::graph::{Page, PageId, Site};
use crate::sitepath;
use maud::{Markup, html};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tera::{Context, Tera};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HelperError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Template error: {0}")]
    Template(#[from] tera::Error),
    #[error("helper module must be a mapping of name to snippet")]
    NotAMapping,
    #[error("helper {0:?} must be a string snippet")]
    NotASnippet(String),
    #[error("{helper}: missing or invalid argument {arg:?}")]
    Argument { helper: &'static str, arg: &'static str },
    #[error("no page at {0}")]
    UnknownPage(String),
}

/// Call arguments, as Tera passes them.
pub type Args = HashMap<String, Value>;

/// A named function callable from a layout.
pub trait Helper: Send + Sync {
    fn call(&self, args: &Args, scope: &Scope) -> Result<Value, HelperError>;

    /// Output is trusted HTML and must not be escaped.
    fn is_safe(&self) -> bool {
        false
    }
}

/// Helpers by name.
pub type HelperSet = BTreeMap<String, Arc<dyn Helper>>;

/// Loads the helpers a site defines in one directory.
pub trait HelperLoader: Send + Sync {
    /// Load the helper module at `file`. Only called for files that exist.
    fn load(&self, file: &Path) -> Result<HelperSet, HelperError>;
}

/// The page being rendered and the site around it.
#[derive(Clone)]
pub struct Scope {
    site: Arc<Site>,
    page: PageId,
}

impl Scope {
    pub fn new(site: Arc<Site>, page: PageId) -> Self {
        Self { site, page }
    }

    pub fn site(&self) -> &Site {
        &self.site
    }

    pub fn page(&self) -> &Page {
        self.site.get(self.page)
    }

    /// The page named by the optional `path` argument, else the current one.
    fn target(&self, args: &Args) -> Result<PageId, HelperError> {
        match args.get("path") {
            None => Ok(self.page),
            Some(Value::String(path)) => self
                .site
                .id_of(path)
                .ok_or_else(|| HelperError::UnknownPage(path.clone())),
            Some(_) => Err(HelperError::Argument {
                helper: "page query",
                arg: "path",
            }),
        }
    }
}

/// `helper` bound to one page, ready to register with Tera.
pub fn bind(helper: Arc<dyn Helper>, scope: Scope) -> impl tera::Function {
    Bound { helper, scope }
}

struct Bound {
    helper: Arc<dyn Helper>,
    scope: Scope,
}

impl tera::Function for Bound {
    fn call(&self, args: &HashMap<String, Value>) -> tera::Result<Value> {
        self.helper
            .call(args, &self.scope)
            .map_err(|e| tera::Error::msg(e.to_string()))
    }

    fn is_safe(&self) -> bool {
        self.helper.is_safe()
    }
}

/// Layer `top` over `base`; names in `top` win.
pub fn overlay(mut base: HelperSet, top: HelperSet) -> HelperSet {
    base.extend(top);
    base
}

// ============================================================================
// Built-ins
// ============================================================================

/// The graph queries every page gets.
pub fn builtins() -> HelperSet {
    let mut set = HelperSet::new();
    set.insert("breadcrumbs".to_string(), Arc::new(Breadcrumbs));
    set.insert("children".to_string(), Arc::new(Children));
    set.insert("siblings".to_string(), Arc::new(Siblings));
    set.insert("relative".to_string(), Arc::new(Relative));
    set.insert("sitemap".to_string(), Arc::new(Sitemap));
    set
}

fn page_list(site: &Site, pages: Vec<&Page>) -> Result<Value, HelperError> {
    let views: Vec<_> = pages.into_iter().map(|p| site.view(p.id)).collect();
    Ok(serde_json::to_value(views)?)
}

struct Breadcrumbs;

impl Helper for Breadcrumbs {
    fn call(&self, args: &Args, scope: &Scope) -> Result<Value, HelperError> {
        let id = scope.target(args)?;
        page_list(scope.site(), scope.site().breadcrumbs(id))
    }
}

struct Children;

impl Helper for Children {
    fn call(&self, args: &Args, scope: &Scope) -> Result<Value, HelperError> {
        let id = scope.target(args)?;
        page_list(scope.site(), scope.site().children(id))
    }
}

struct Siblings;

impl Helper for Siblings {
    fn call(&self, args: &Args, scope: &Scope) -> Result<Value, HelperError> {
        let id = scope.target(args)?;
        page_list(scope.site(), scope.site().siblings(id))
    }
}

struct Relative;

impl Helper for Relative {
    fn call(&self, args: &Args, scope: &Scope) -> Result<Value, HelperError> {
        let to = args
            .get("to")
            .and_then(Value::as_str)
            .ok_or(HelperError::Argument {
                helper: "relative",
                arg: "to",
            })?;
        let from = match args.get("from") {
            None => scope.page().path.as_str(),
            Some(v) => v.as_str().ok_or(HelperError::Argument {
                helper: "relative",
                arg: "from",
            })?,
        };
        Ok(Value::String(sitepath::relative(from, to)))
    }
}

/// Element classes for [`sitemap`].
#[derive(Debug, Default, Clone)]
pub struct SitemapClasses {
    pub ul: String,
    pub li: String,
    pub a: String,
}

struct Sitemap;

impl Helper for Sitemap {
    fn call(&self, args: &Args, scope: &Scope) -> Result<Value, HelperError> {
        let class = |arg: &'static str| -> Result<String, HelperError> {
            match args.get(arg) {
                None => Ok(String::new()),
                Some(Value::String(s)) => Ok(s.clone()),
                Some(_) => Err(HelperError::Argument {
                    helper: "sitemap",
                    arg,
                }),
            }
        };
        let classes = SitemapClasses {
            ul: class("ul_class")?,
            li: class("li_class")?,
            a: class("a_class")?,
        };
        Ok(Value::String(sitemap(scope.site(), scope.page(), &classes)))
    }

    fn is_safe(&self) -> bool {
        true
    }
}

/// Nested `<ul>` of the whole site with links relative to `current`.
///
/// The top level holds pages without a parent (normally just `/`); every
/// element carries `data-depth`.
pub fn sitemap(site: &Site, current: &Page, classes: &SitemapClasses) -> String {
    let top: Vec<&Page> = site.iter().filter(|p| p.parent.is_none()).collect();
    sitemap_level(site, current, &top, classes).into_string()
}

fn sitemap_level(site: &Site, current: &Page, pages: &[&Page], classes: &SitemapClasses) -> Markup {
    let Some(first) = pages.first() else {
        return html! {};
    };

    html! {
        ul class=(classes.ul) data-depth=(first.depth) {
            @for page in pages {
                @let title = page.meta.get("title").and_then(Value::as_str).unwrap_or(page.path.as_str());
                li class=(classes.li) data-depth=(page.depth) {
                    a href={ (sitepath::relative(&current.path, &page.path)) "/" }
                        class=(classes.a)
                        data-depth=(page.depth)
                        aria-current=[(page.id == current.id).then_some("page")] {
                        (title)
                    }
                    (sitemap_level(site, current, &site.children(page.id), classes))
                }
            }
        }
    }
}

// ============================================================================
// Snippet helpers
// ============================================================================

/// Reads `helpers.yaml`: a mapping of helper name to Tera snippet.
#[derive(Debug, Default, Clone, Copy)]
pub struct SnippetLoader;

impl HelperLoader for SnippetLoader {
    fn load(&self, file: &Path) -> Result<HelperSet, HelperError> {
        let content = fs::read_to_string(file)?;
        if content.trim().is_empty() {
            return Ok(HelperSet::new());
        }

        let Value::Object(entries) = serde_yaml_ng::from_str::<Value>(&content)? else {
            return Err(HelperError::NotAMapping);
        };

        let mut set = HelperSet::new();
        for (name, source) in entries {
            let Value::String(source) = source else {
                return Err(HelperError::NotASnippet(name));
            };
            // Reject broken snippets at load time, not at first call.
            Tera::default().add_raw_template(&name, &source)?;
            set.insert(name, Arc::new(Snippet { source }));
        }
        Ok(set)
    }
}

struct Snippet {
    source: String,
}

impl Helper for Snippet {
    fn call(&self, args: &Args, scope: &Scope) -> Result<Value, HelperError> {
        let mut context = Context::new();
        for (key, value) in args {
            context.insert(key.as_str(), value);
        }
        let site = scope.site();
        let page = scope.page();
        context.insert("page", &site.view(page.id));
        context.insert("parent", &site.parent(page).map(|p| site.view(p.id)));
        context.insert("root", &site.root().map(|p| site.view(p.id)));
        context.insert("pages", &site.views());
        Ok(Value::String(Tera::one_off(&self.source, &context, false)?))
    }

    fn is_safe(&self) -> bool {
        true
    }
}
