use clap::Parser;
use emde::config::{self, GenerateOptions};
use emde::generate;
use emde::log::TracingReporter;
use emde::output;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a `tracing` filter directive.
const LOG_ENV: &str = "EMDE_LOG";

#[derive(Parser)]
#[command(name = "emde")]
#[command(about = "Static site generator for directory trees of markdown pages")]
#[command(long_about = "\
Static site generator for directory trees of markdown pages

Every directory holding an index.md becomes a page. The output mirrors the
source tree: each page directory gets an index.html, everything that is not
a page is copied through untouched.

Content structure:

  site/
  ├── index.md            # /          (YAML front matter optional)
  ├── meta.yaml           # Metadata inherited by every page below
  ├── layout.html         # Tera layout, closest one to a page wins
  ├── helpers.yaml        # Named Tera snippets callable from layouts
  ├── blog/
  │   ├── index.md        # /blog
  │   └── first-post/
  │       └── index.md    # /blog/first-post
  ├── _drafts/
  │   └── index.md        # Hidden: readable by other pages, never emitted
  └── assets/
      └── style.css       # Not a page, copied as is

Set EMDE_LOG (e.g. EMDE_LOG=debug) to change log filtering.

Run 'emde --print-config' to print a documented emde.toml.")]
#[command(version)]
struct Cli {
    /// Source directory
    #[arg(long, required_unless_present = "print_config")]
    indir: Option<PathBuf>,

    /// Destination directory
    #[arg(long, required_unless_present = "print_config")]
    outdir: Option<PathBuf>,

    /// Replace the destination even if it is not empty
    #[arg(long)]
    force: bool,

    /// Report every rendered page and stage transition
    #[arg(long)]
    verbose: bool,

    /// Keep pages with malformed front matter, using their whole text as body
    #[arg(long)]
    lenient: bool,

    /// Options file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print a stock emde.toml with all options documented
    #[arg(long)]
    print_config: bool,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.print_config {
        print!("{}", config::stock_options_toml());
        return Ok(());
    }

    init_tracing();

    let mut options = match &cli.config {
        Some(path) => config::load_options(path)?,
        None => GenerateOptions::default(),
    };
    options.force |= cli.force;
    options.verbose |= cli.verbose;
    if cli.lenient {
        options.strict_front_matter = false;
    }
    init_thread_pool(&options);

    let (Some(indir), Some(outdir)) = (cli.indir, cli.outdir) else {
        return Err("--indir and --outdir are required".into());
    };

    let start = Instant::now();
    let summary = generate::generate(&indir, &outdir, &options, &TracingReporter)?;
    output::print_summary(&summary, &options.files.output);
    println!("OK in {}ms", start.elapsed().as_millis());

    Ok(())
}

/// Log to stderr, filtered by `EMDE_LOG` (default `info`).
fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool based on the configured cap.
fn init_thread_pool(options: &GenerateOptions) {
    rayon::ThreadPoolBuilder::new()
        .num_threads(config::effective_threads(options))
        .build_global()
        .ok();
}
