//! Run configuration.
//!
//! Every option has a default, so a config file is optional and sparse:
//!
//! ```toml
//! verbose = false
//! force = false
//! strict_front_matter = true
//! # max_threads = 4        # Cap on parallel page work, default all cores
//!
//! [files]
//! index = "index.md"       # Required for a directory to be a page
//! meta = "meta.yaml"       # Inherited metadata, merged root → leaf
//! layout = "layout.html"   # Closest layout wins
//! helpers = "helpers.yaml" # Helper snippets, closest definition wins
//! output = "index.html"    # Rendered page file name
//! ```
//!
//! Unknown keys are rejected to catch typos early. Command line flags are
//! applied on top of whatever the file says.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Options for one generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerateOptions {
    /// Report every rendered page and stage transition.
    pub verbose: bool,
    /// Proceed even when the destination is not empty (its contents are replaced).
    pub force: bool,
    /// Fail a page whose front matter is not valid YAML. When false the whole
    /// document is used as the body instead.
    pub strict_front_matter: bool,
    /// Cap on threads reading and rendering pages. `None` uses every core;
    /// values above the core count are clamped down.
    pub max_threads: Option<usize>,
    /// Names of the per-directory control files.
    pub files: FileNames,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            verbose: false,
            force: false,
            strict_front_matter: true,
            max_threads: None,
            files: FileNames::default(),
        }
    }
}

/// Per-directory control file names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileNames {
    pub index: String,
    pub meta: String,
    pub layout: String,
    pub helpers: String,
    pub output: String,
}

impl Default for FileNames {
    fn default() -> Self {
        Self {
            index: "index.md".to_string(),
            meta: "meta.yaml".to_string(),
            layout: "layout.html".to_string(),
            helpers: "helpers.yaml".to_string(),
            output: "index.html".to_string(),
        }
    }
}

impl FileNames {
    /// Files that steer generation and must never reach the output.
    pub fn control_files(&self) -> [&str; 3] {
        [self.meta.as_str(), self.layout.as_str(), self.helpers.as_str()]
    }

    fn all(&self) -> [(&'static str, &str); 5] {
        [
            ("index", self.index.as_str()),
            ("meta", self.meta.as_str()),
            ("layout", self.layout.as_str()),
            ("helpers", self.helpers.as_str()),
            ("output", self.output.as_str()),
        ]
    }
}

impl GenerateOptions {
    /// File names must be plain, distinct names.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let names = self.files.all();
        for (key, name) in names {
            if name.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "files.{key} must not be empty"
                )));
            }
            if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
                return Err(ConfigError::Validation(format!(
                    "files.{key} must be a file name, not a path: {name:?}"
                )));
            }
        }
        for (i, (key, name)) in names.iter().enumerate() {
            if let Some((other, _)) = names[i + 1..].iter().find(|(_, n)| n == name) {
                return Err(ConfigError::Validation(format!(
                    "files.{key} and files.{other} are both {name:?}"
                )));
            }
        }
        if self.max_threads == Some(0) {
            return Err(ConfigError::Validation(
                "max_threads must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Resolve the effective thread count.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(options: &GenerateOptions) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    options.max_threads.map(|n| n.min(cores)).unwrap_or(cores)
}

/// Load options from a TOML file and validate them.
pub fn load_options(path: &Path) -> Result<GenerateOptions, ConfigError> {
    let content = fs::read_to_string(path)?;
    let options: GenerateOptions = toml::from_str(&content)?;
    options.validate()?;
    Ok(options)
}

/// Documented default config, printed by `emde --print-config`.
pub fn stock_options_toml() -> &'static str {
    r#"# emde configuration
# All options are optional. Command line flags override these values.

# Report every rendered page and stage transition.
verbose = false

# Replace the destination even if it is not empty.
force = false

# Fail pages whose front matter is not valid YAML. When false, such a page
# keeps its whole text as the body and gets no front matter metadata.
strict_front_matter = true

# Cap on threads reading and rendering pages. Defaults to every core.
# max_threads = 4

[files]
# A directory is a page when it directly contains this file.
index = "index.md"
# YAML mapping, merged from the site root down to each page.
meta = "meta.yaml"
# Tera template; the closest one to a page wins.
layout = "layout.html"
# YAML mapping of helper name -> Tera snippet; closest definition wins.
helpers = "helpers.yaml"
# Rendered page file name.
output = "index.html"
"#
}
