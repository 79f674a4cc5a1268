//! # emde
//!
//! A static site generator for directory trees of markdown pages. Every
//! directory that directly contains an `index.md` is a page; the output is
//! the same tree with each page's markdown replaced by a rendered
//! `index.html` and everything else copied through.
//!
//! # Architecture: Staged Pipeline Over a Working Copy
//!
//! A run never touches the source and never half-writes the destination.
//! It works on a copy and moves the finished copy into place:
//!
//! ```text
//! 1. Staging      source/   →  .emde-XXXX/        (copy beside the destination)
//! 2. Discovering  tree      →  content dirs        (index.md present, hidden split out)
//! 3. Reading      dirs      →  Site                (front matter, inherited meta, markdown)
//! 4. Rendering    Site      →  index.html per page (Tera layouts + helpers)
//! 5. Cleaning     copy      →  copy                (drop hidden pages, control files)
//! 6. Committed    copy      →  dest/               (rename into place)
//! ```
//!
//! A page that fails to read or render is reported and left out; the rest
//! of the site still builds.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`generate`] | The run: stage machine, per-page failure handling, [`generate::Summary`] |
//! | [`staging`] | Path checks, working copy, cleanup and the atomic commit |
//! | [`discover`] | Classifies directories as content, hidden content or neither |
//! | [`inherit`] | Metadata, layout and helper resolution along the directory chain |
//! | [`graph`] | Two-pass page graph: read records, then link parents in one arena |
//! | [`render`] | Tera rendering of one page and writing its output |
//! | [`helpers`] | Built-in graph queries and user helper snippets exposed to layouts |
//! | [`frontmatter`] | Splits a leading YAML block from the markdown body |
//! | [`meta`] | Deep merge of metadata mappings, `meta.yaml` loading |
//! | [`sitepath`] | Canonical `/a/b` site paths: parents, ancestors, relative links |
//! | [`config`] | `emde.toml` options and their validation |
//! | [`log`] | The [`log::Reporter`] collaborator the pipeline logs through |
//! | [`output`] | CLI output formatting of a run summary |
//!
//! # Design Decisions
//!
//! ## Arena Page Graph
//!
//! Pages live in one `Vec` inside [`graph::Site`] with a path index beside
//! it. A parent is a [`graph::PageId`] into that vector rather than a shared
//! pointer, so the graph has no cycles to manage and can be shared read-only
//! across rendering threads behind one `Arc`.
//!
//! ## Tera Layouts
//!
//! Layouts are [Tera](https://keats.github.io/tera/) templates read at run
//! time from the content tree. Layouts named `*.html` autoescape; the page
//! body is already HTML and goes out through `{{ page.html | safe }}`.
//!
//! ## Helpers Are Data
//!
//! User helpers are Tera snippets in `helpers.yaml`, not code. Loading is a
//! pluggable [`helpers::HelperLoader`], and a helper file that fails to load
//! is reported and skipped instead of failing the run.
//!
//! ## Same-Volume Working Copy
//!
//! The working copy is created in the destination's parent directory so the
//! commit is a rename. An existing destination is renamed aside first and
//! only deleted once the new tree is in place.

pub mod config;
pub mod discover;
pub mod frontmatter;
pub mod generate;
pub mod graph;
pub mod helpers;
pub mod inherit;
pub mod log;
pub mod meta;
pub mod output;
pub mod render;
pub mod sitepath;
pub mod staging;

#[cfg(test)]
pub(crate) mod test_helpers;
