//! The generation run: source tree in, rendered site out.
//!
//! A run moves through fixed stages. Any fatal error jumps to `Failed`, the
//! working copy is dropped and the destination is left as it was.
//!
//! ```text
//! Staging → Discovering → Reading → Rendering → Cleaning → Committed
//!    └───────────┴────────────┴──────────┴──────────┴──→ Failed
//! ```
//!
//! | Stage | Work |
//! |-------|------|
//! | Staging | validate paths, copy the source beside the destination |
//! | Discovering | classify directories as content, hidden or neither |
//! | Reading | read and parse every page (parallel) |
//! | Rendering | link parents, then render every visible page through its layout (parallel) |
//! | Cleaning | drop hidden pages and control files from the working copy |
//! | Committed | swap the working copy into the destination |
//!
//! A page that fails to read or render is reported and left out. The run
//! itself still succeeds and the failure is listed in the [`Summary`].

use crate::config::{ConfigError, GenerateOptions};
use crate::discover::{ContentDir, DiscoverError, discover};
use crate::graph::{PageId, Site, read_page};
use crate::helpers::{HelperLoader, SnippetLoader};
use crate::inherit::Resolver;
use crate::log::Reporter;
use crate::render::{RenderError, Renderer, write_page};
use crate::staging::{self, StagingError, WorkingCopy};
use rayon::prelude::*;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Source directory not found ({0})")]
    SourceNotFound(PathBuf),
    #[error("Destination {dest} cannot be located under source {src}")]
    DestinationInsideSource { dest: PathBuf, src: PathBuf },
    #[error("Source {src} cannot be located under destination {dest}")]
    SourceInsideDestination { src: PathBuf, dest: PathBuf },
    #[error("Destination directory {0} does not appear to be empty (use --force to override)")]
    DestinationNotEmpty(PathBuf),
    #[error("Invalid options: {0}")]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Staging failed: {0}")]
    Staging(#[from] StagingError),
    #[error("Discovery failed: {0}")]
    Discover(#[from] DiscoverError),
    #[error("Render setup failed: {0}")]
    Render(#[from] RenderError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Staging,
    Discovering,
    Reading,
    Rendering,
    Cleaning,
    Committed,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Staging => "staging",
            Stage::Discovering => "discovering",
            Stage::Reading => "reading",
            Stage::Rendering => "rendering",
            Stage::Cleaning => "cleaning",
            Stage::Committed => "committed",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A page left out of the output.
#[derive(Debug, Clone, PartialEq)]
pub struct PageFailure {
    pub path: String,
    pub stage: Stage,
    pub message: String,
}

/// Result of a successful run.
#[derive(Debug, Clone, Default)]
pub struct Summary {
    /// Normalized destination the site was committed to.
    pub dest: PathBuf,
    /// Rendered page paths, sorted.
    pub rendered: Vec<String>,
    /// Hidden page paths (read, not rendered), sorted.
    pub hidden: Vec<String>,
    pub failures: Vec<PageFailure>,
}

/// Generate `dest` from `source` with the default helper loader.
pub fn generate(
    source: &Path,
    dest: &Path,
    options: &GenerateOptions,
    reporter: &dyn Reporter,
) -> Result<Summary, GenerateError> {
    generate_with_loader(source, dest, options, &SnippetLoader, reporter)
}

/// Generate with a specific helper loader.
pub fn generate_with_loader(
    source: &Path,
    dest: &Path,
    options: &GenerateOptions,
    loader: &dyn HelperLoader,
    reporter: &dyn Reporter,
) -> Result<Summary, GenerateError> {
    let mut run = Run {
        options,
        reporter,
        stage: Stage::Staging,
    };
    let result = run.execute(source, dest, loader);
    if result.is_err() {
        run.enter(Stage::Failed);
    }
    result
}

struct Run<'a> {
    options: &'a GenerateOptions,
    reporter: &'a dyn Reporter,
    stage: Stage,
}

impl Run<'_> {
    fn enter(&mut self, stage: Stage) {
        self.stage = stage;
        if self.options.verbose {
            self.reporter.info(&format!("→ {stage}"));
        }
    }

    fn execute(
        &mut self,
        source: &Path,
        dest: &Path,
        loader: &dyn HelperLoader,
    ) -> Result<Summary, GenerateError> {
        let options = self.options;
        let reporter = self.reporter;
        let files = &options.files;

        self.enter(Stage::Staging);
        options.validate()?;
        let (source, dest) = check_paths(source, dest, options.force)?;
        let working = WorkingCopy::stage(&source, &dest)?;

        self.enter(Stage::Discovering);
        let discovery = discover(working.path(), &files.index)?;

        self.enter(Stage::Reading);
        let resolver = Resolver::new(working.path(), files, loader, reporter);
        let content_dirs: Vec<&ContentDir> = discovery.all().collect();
        let results: Vec<_> = content_dirs
            .par_iter()
            .map(|dir| (*dir, read_page(dir, &resolver, options.strict_front_matter)))
            .collect();

        let mut failures = Vec::new();
        let mut records = Vec::new();
        for (dir, result) in results {
            match result {
                Ok(record) => records.push(record),
                Err(e) => {
                    failures.push(self.page_failed(&dir.path, Stage::Reading, error_chain(&e)))
                }
            }
        }

        self.enter(Stage::Rendering);
        let site = Arc::new(Site::link(records, reporter));
        let renderer = Renderer::new(site.clone())?;
        let visible: Vec<PageId> = site.ids().filter(|&id| !site.get(id).hidden).collect();
        let rendered: Vec<(PageId, Result<(), RenderError>)> = visible
            .par_iter()
            .map(|&id| (id, render_one(&renderer, &resolver, id)))
            .collect();

        let mut rendered_paths = Vec::new();
        for (id, result) in rendered {
            let path = &site.get(id).path;
            match result {
                Ok(()) => {
                    if options.verbose {
                        reporter.info(&format!("✔ {path}"));
                    }
                    rendered_paths.push(path.clone());
                }
                Err(e) => {
                    failures.push(self.page_failed(path, Stage::Rendering, error_chain(&e)))
                }
            }
        }

        self.enter(Stage::Cleaning);
        working.remove_hidden(&discovery.hidden)?;
        working.remove_control_files(discovery.all(), files)?;

        working.commit(&dest)?;
        self.enter(Stage::Committed);

        rendered_paths.sort();
        failures.sort_by(|a, b| a.path.cmp(&b.path));
        let mut hidden: Vec<String> = site
            .iter()
            .filter(|p| p.hidden)
            .map(|p| p.path.clone())
            .collect();
        hidden.sort();

        Ok(Summary {
            dest,
            rendered: rendered_paths,
            hidden,
            failures,
        })
    }

    fn page_failed(&self, path: &str, stage: Stage, message: String) -> PageFailure {
        self.reporter.error(&format!("✘ {path} ({stage} stage)"));
        self.reporter.error(&format!("  {message}"));
        PageFailure {
            path: path.to_string(),
            stage,
            message,
        }
    }
}

/// `error` followed by every distinct cause below it, joined with `: `.
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut cause = error.source();
    while let Some(e) = cause {
        let text = e.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        cause = e.source();
    }
    message
}

fn render_one(renderer: &Renderer, resolver: &Resolver, id: PageId) -> Result<(), RenderError> {
    let page = renderer.site().get(id);
    let layout = resolver.layout(&page.path)?;
    let html = renderer.render(id, &layout, resolver.helpers(&page.path))?;
    write_page(page, &html, resolver.files())?;
    Ok(())
}

/// Normalize both paths and reject bad combinations before anything is
/// written.
fn check_paths(
    source: &Path,
    dest: &Path,
    force: bool,
) -> Result<(PathBuf, PathBuf), GenerateError> {
    let source = staging::normalize(source)?;
    let dest = staging::normalize(dest)?;

    if staging::is_within(&dest, &source) {
        return Err(GenerateError::DestinationInsideSource { dest, src: source });
    }
    if staging::is_within(&source, &dest) {
        return Err(GenerateError::SourceInsideDestination { src: source, dest });
    }
    if !source.is_dir() {
        return Err(GenerateError::SourceNotFound(source));
    }
    if !force && !staging::is_empty_dir(&dest)? {
        return Err(GenerateError::DestinationNotEmpty(dest));
    }
    Ok((source, dest))
}
