//! Front matter splitting for index documents.
//!
//! An index document may open with a YAML block fenced by `---` lines:
//!
//! ```text
//! ---
//! title: Hello
//! ---
//! # Hello
//! ```
//!
//! Leading whitespace before the opening fence is ignored. A document without
//! an opening fence, or without a closing one, is all body and carries no
//! metadata.

use serde_json::{Map, Value};
use thiserror::Error;

const FENCE: &str = "---";

#[derive(Error, Debug)]
pub enum FrontMatterError {
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
    #[error("front matter must be a mapping, found {0}")]
    NotAMapping(&'static str),
}

/// An index document split into metadata and markdown body.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrontMatter {
    /// Parsed front matter, `None` when absent, empty, or rejected in lenient mode.
    pub meta: Option<Map<String, Value>>,
    /// Markdown body with the front matter removed.
    pub content: String,
}

/// Split `markdown` into front matter and body.
///
/// With `strict` set, a front matter block that is not valid YAML (or not a
/// mapping) is an error. Without it, the whole original text comes back as
/// the body and `meta` is `None`.
pub fn parse_front_matter(markdown: &str, strict: bool) -> Result<FrontMatter, FrontMatterError> {
    let untouched = || FrontMatter {
        meta: None,
        content: markdown.to_string(),
    };

    let lines: Vec<&str> = markdown.trim_start().split('\n').collect();
    if lines.first().map(|l| l.trim_end()) != Some(FENCE) {
        return Ok(untouched());
    }

    let Some(closing) = lines
        .iter()
        .skip(1)
        .position(|line| line.trim() == FENCE)
        .map(|i| i + 1)
    else {
        return Ok(untouched());
    };

    let yaml = lines[1..closing].join("\n");
    let content = lines[closing + 1..].join("\n").trim().to_string();

    match parse_yaml_mapping(&yaml) {
        Ok(meta) => Ok(FrontMatter { meta, content }),
        Err(e) if strict => Err(e),
        Err(_) => Ok(untouched()),
    }
}

/// Parse a YAML document that must be a mapping (or empty).
///
/// Shared with `meta.yaml` loading. An empty or null document is `None`.
pub fn parse_yaml_mapping(yaml: &str) -> Result<Option<Map<String, Value>>, FrontMatterError> {
    if yaml.trim().is_empty() {
        return Ok(None);
    }
    match serde_yaml_ng::from_str::<Value>(yaml)? {
        Value::Null => Ok(None),
        Value::Object(map) => Ok(Some(map)),
        other => Err(FrontMatterError::NotAMapping(value_kind(&other))),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn splits_meta_and_body() {
        let md = "\n---\nfoo: bar\n---\n# baz\n    ";
        let parsed = parse_front_matter(md, true).unwrap();

        assert_eq!(parsed.meta, Some(json!({"foo": "bar"}).as_object().unwrap().clone()));
        assert_eq!(parsed.content, "# baz");
    }

    #[test]
    fn minimal_document() {
        let parsed = parse_front_matter("---\nfoo: bar\n---\n# baz", true).unwrap();
        assert_eq!(parsed.meta.unwrap()["foo"], json!("bar"));
        assert_eq!(parsed.content, "# baz");
    }

    #[test]
    fn no_front_matter_is_all_body() {
        let parsed = parse_front_matter("# Just markdown", true).unwrap();
        assert_eq!(parsed.meta, None);
        assert_eq!(parsed.content, "# Just markdown");
    }

    #[test]
    fn unclosed_fence_is_all_body() {
        let md = "---\ntitle: nope\n# body";
        let parsed = parse_front_matter(md, true).unwrap();
        assert_eq!(parsed.meta, None);
        assert_eq!(parsed.content, md);
    }

    #[test]
    fn fence_must_be_on_its_own_line() {
        let md = "--- title: x\n---\nbody";
        let parsed = parse_front_matter(md, true).unwrap();
        assert_eq!(parsed.meta, None);
        assert_eq!(parsed.content, md);
    }

    #[test]
    fn invalid_yaml_fails_in_strict_mode() {
        let md = "\n---\nfoo: bar\n- )\n---\n# baz\n    ";
        assert!(parse_front_matter(md, true).is_err());
    }

    #[test]
    fn invalid_yaml_returns_original_in_lenient_mode() {
        let md = "\n---\nfoo: bar\n- )\n---\n# baz\n    ";
        let parsed = parse_front_matter(md, false).unwrap();
        assert_eq!(parsed.meta, None);
        assert_eq!(parsed.content, md);
    }

    #[test]
    fn scalar_front_matter_is_rejected() {
        let md = "---\njust a string\n---\nbody";
        assert!(matches!(
            parse_front_matter(md, true),
            Err(FrontMatterError::NotAMapping("a string"))
        ));
    }

    #[test]
    fn empty_block_has_no_meta() {
        let parsed = parse_front_matter("---\n---\nbody", true).unwrap();
        assert_eq!(parsed.meta, None);
        assert_eq!(parsed.content, "body");
    }

    #[test]
    fn crlf_fences_are_recognized() {
        let parsed = parse_front_matter("---\r\ntitle: Hi\r\n---\r\nbody", true).unwrap();
        assert_eq!(parsed.meta.unwrap()["title"], json!("Hi"));
        assert_eq!(parsed.content, "body");
    }

    #[test]
    fn nested_meta_is_preserved() {
        let md = "---\nauthor:\n  name: Ann\n  links: [a, b]\n---\ntext";
        let meta = parse_front_matter(md, true).unwrap().meta.unwrap();
        assert_eq!(meta["author"]["name"], json!("Ann"));
        assert_eq!(meta["author"]["links"], json!(["a", "b"]));
    }
}
