//! CLI output formatting for a generation run.
//!
//! # Output Format
//!
//! Pages are listed as a tree, one line per page, indented by depth and
//! numbered by position. Hidden pages and failures follow in their own
//! sections, and a totals line closes the report:
//!
//! ```text
//! Pages
//! 001 / → index.html
//!     002 /foo → foo/index.html
//!         003 /foo/bar → foo/bar/index.html
//!     004 /hey → hey/index.html
//!
//! Hidden
//!     /_drafts/post
//!
//! Failed
//!     ✘ /bad (reading stage)
//!         front matter: invalid type ...
//!
//! Generated 4 pages (1 hidden, 1 failed) in /srv/site
//! ```
//!
//! # Architecture
//!
//! [`format_summary`] returns `Vec<String>` for testability and
//! [`print_summary`] writes it to stdout. Format functions are pure: no I/O,
//! no side effects.

use crate::generate::Summary;
use crate::sitepath::{self, ROOT};

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Output file of a page, relative to the destination.
///
/// ```text
/// /         → index.html
/// /foo/bar  → foo/bar/index.html
/// ```
fn output_file(path: &str, output_name: &str) -> String {
    if path == ROOT {
        output_name.to_string()
    } else {
        format!("{}/{}", path.trim_start_matches('/'), output_name)
    }
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

pub fn format_summary(summary: &Summary, output_name: &str) -> Vec<String> {
    let mut lines = Vec::new();

    if !summary.rendered.is_empty() {
        lines.push("Pages".to_string());
        for (i, path) in summary.rendered.iter().enumerate() {
            lines.push(format!(
                "{}{} {} \u{2192} {}",
                indent(sitepath::depth(path)),
                format_index(i + 1),
                path,
                output_file(path, output_name)
            ));
        }
    }

    if !summary.hidden.is_empty() {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push("Hidden".to_string());
        for path in &summary.hidden {
            lines.push(format!("{}{}", indent(1), path));
        }
    }

    if !summary.failures.is_empty() {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push("Failed".to_string());
        for failure in &summary.failures {
            lines.push(format!(
                "{}\u{2718} {} ({} stage)",
                indent(1),
                failure.path,
                failure.stage
            ));
            lines.push(format!("{}{}", indent(2), failure.message));
        }
    }

    if !lines.is_empty() {
        lines.push(String::new());
    }

    let mut extras = Vec::new();
    if !summary.hidden.is_empty() {
        extras.push(format!("{} hidden", summary.hidden.len()));
    }
    if !summary.failures.is_empty() {
        extras.push(format!("{} failed", summary.failures.len()));
    }
    let extras = if extras.is_empty() {
        String::new()
    } else {
        format!(" ({})", extras.join(", "))
    };

    lines.push(format!(
        "Generated {}{} in {}",
        plural(summary.rendered.len(), "page", "pages"),
        extras,
        summary.dest.display()
    ));

    lines
}

/// Print the run summary to stdout.
pub fn print_summary(summary: &Summary, output_name: &str) {
    for line in format_summary(summary, output_name) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::{PageFailure, Stage};
    use std::path::PathBuf;

    fn summary(rendered: &[&str]) -> Summary {
        Summary {
            dest: PathBuf::from("/srv/site"),
            rendered: rendered.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(100), "100");
    }

    #[test]
    fn output_file_for_root_and_nested() {
        assert_eq!(output_file("/", "index.html"), "index.html");
        assert_eq!(output_file("/foo/bar", "index.html"), "foo/bar/index.html");
    }

    #[test]
    fn pages_are_indented_by_depth() {
        let lines = format_summary(&summary(&["/", "/foo", "/foo/bar", "/hey"]), "index.html");
        assert_eq!(
            lines,
            vec![
                "Pages",
                "001 / \u{2192} index.html",
                "    002 /foo \u{2192} foo/index.html",
                "        003 /foo/bar \u{2192} foo/bar/index.html",
                "    004 /hey \u{2192} hey/index.html",
                "",
                "Generated 4 pages in /srv/site",
            ]
        );
    }

    #[test]
    fn hidden_and_failed_sections() {
        let mut s = summary(&["/"]);
        s.hidden = vec!["/_drafts".to_string()];
        s.failures = vec![PageFailure {
            path: "/bad".to_string(),
            stage: Stage::Reading,
            message: "front matter: broken".to_string(),
        }];

        let lines = format_summary(&s, "index.html");
        assert_eq!(
            lines,
            vec![
                "Pages",
                "001 / \u{2192} index.html",
                "",
                "Hidden",
                "    /_drafts",
                "",
                "Failed",
                "    \u{2718} /bad (reading stage)",
                "        front matter: broken",
                "",
                "Generated 1 page (1 hidden, 1 failed) in /srv/site",
            ]
        );
    }

    #[test]
    fn empty_run() {
        assert_eq!(
            format_summary(&summary(&[]), "index.html"),
            vec!["Generated 0 pages in /srv/site"]
        );
    }

    #[test]
    fn custom_output_name() {
        let lines = format_summary(&summary(&["/a"]), "page.htm");
        assert_eq!(lines[1], "    001 /a \u{2192} a/page.htm");
    }
}
