//! Runs the `emde` binary the way a user would.

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn emde(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_emde"))
        .args(args)
        .env("EMDE_LOG", "off")
        .output()
        .unwrap()
}

fn fixture_copy(tmp: &TempDir) -> String {
    let src = tmp.path().join("src");
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    emde::staging::copy_tree(&fixtures, &src).unwrap();
    src.to_string_lossy().into_owned()
}

#[test]
fn builds_and_prints_summary() {
    let tmp = TempDir::new().unwrap();
    let src = fixture_copy(&tmp);
    let dest = tmp.path().join("dist");

    let out = emde(&["--indir", &src, "--outdir", dest.to_str().unwrap()]);

    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("001 / \u{2192} index.html"));
    assert!(stdout.contains("Generated 4 pages (1 hidden)"));
    assert!(stdout.contains("OK in "));
    assert!(dest.join("foo/bar/index.html").exists());
}

#[test]
fn non_empty_destination_exits_with_error() {
    let tmp = TempDir::new().unwrap();
    let src = fixture_copy(&tmp);
    let dest = tmp.path().join("dist");
    std::fs::create_dir_all(&dest).unwrap();
    std::fs::write(dest.join("keep.txt"), "x").unwrap();

    let out = emde(&["--indir", &src, "--outdir", dest.to_str().unwrap()]);

    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("does not appear to be empty"));

    let forced = emde(&["--indir", &src, "--outdir", dest.to_str().unwrap(), "--force"]);
    assert!(forced.status.success());
    assert!(!dest.join("keep.txt").exists());
}

#[test]
fn missing_arguments_are_a_usage_error() {
    let out = emde(&["--indir", "somewhere"]);
    assert!(!out.status.success());
}

#[test]
fn print_config_needs_no_directories() {
    let out = emde(&["--print-config"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    let options: emde::config::GenerateOptions = toml::from_str(&stdout).unwrap();
    assert_eq!(options, emde::config::GenerateOptions::default());
}

#[test]
fn config_file_is_applied() {
    let tmp = TempDir::new().unwrap();
    let src = fixture_copy(&tmp);
    let dest = tmp.path().join("dist");
    let config = tmp.path().join("emde.toml");
    std::fs::write(&config, "[files]\noutput = \"page.html\"\n").unwrap();

    let out = emde(&[
        "--indir",
        &src,
        "--outdir",
        dest.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
    ]);

    assert!(out.status.success());
    assert!(dest.join("page.html").exists());
    assert!(!dest.join("index.html").exists());
}
