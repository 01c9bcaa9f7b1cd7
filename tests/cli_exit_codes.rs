use image::RgbaImage;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Command;
use tagcompare_lib::ArtifactKey;
use tempfile::TempDir;

fn capture(root: &Path, build: &str, config: &str, campaign: &str, color: [u8; 4]) -> PathBuf {
    let key = ArtifactKey::with_base(build, root)
        .and_then(|key| key.with_config(config))
        .and_then(|key| key.with_campaign_id(campaign))
        .and_then(|key| key.with_tag_size("300x250"))
        .and_then(|key| key.with_tag_type("iframe"))
        .expect("key");
    key.ensure_directory(false).expect("create dirs");
    let path = key.image_path().expect("image path");
    RgbaImage::from_pixel(4, 4, image::Rgba(color))
        .save(&path)
        .expect("write image");
    path
}

/// Writes a config pinned to the temp output dir so no central config is read.
fn write_config(dir: &Path, output_dir: &Path) -> PathBuf {
    let cfg_path = dir.join("tagcompare.toml");
    let body = format!(
        r#"output_dir = "{}"
tag_sizes = ["300x250"]
tag_types = ["iframe"]

[comparisons]
desktop = ["chrome", "firefox"]
"#,
        output_dir.display()
    );
    std::fs::write(&cfg_path, body).expect("write config");
    cfg_path
}

fn run(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_tagcompare"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("run tagcompare")
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout is json")
}

#[test]
fn compare_exit_code_passes_for_matching_images() {
    let dir = TempDir::new().expect("tempdir");
    let out = dir.path().join("output");
    capture(&out, "default", "chrome", "131313", [10, 20, 30, 255]);
    capture(&out, "default", "firefox", "131313", [10, 20, 30, 255]);
    let cfg = write_config(dir.path(), &out);

    let output = run(&[
        "compare",
        "--config",
        cfg.to_str().unwrap(),
        "--campaigns",
        "131313",
        "--build",
        "job",
        "--format",
        "json",
    ]);
    assert_eq!(output.status.code(), Some(0));

    let json = stdout_json(&output);
    assert_eq!(json["mode"], "compare");
    assert_eq!(json["build"], "job");
    assert_eq!(json["totals"]["total"], 1);
    assert_eq!(json["totals"]["errors"], 0);
}

#[test]
fn compare_reports_regressions_without_failing() {
    let dir = TempDir::new().expect("tempdir");
    let out = dir.path().join("output");
    capture(&out, "default", "chrome", "131313", [0, 0, 0, 255]);
    capture(&out, "default", "firefox", "131313", [255, 255, 255, 255]);
    let cfg = write_config(dir.path(), &out);

    let output = run(&[
        "compare",
        "--config",
        cfg.to_str().unwrap(),
        "--campaigns",
        "131313",
        "--build",
        "job",
        "--skip-aggregate",
    ]);
    assert_eq!(output.status.code(), Some(0));

    let json = stdout_json(&output);
    assert_eq!(json["totals"]["errors"], 1);
    assert_eq!(json["totals"]["failed"], 1);
    assert!(out
        .join("job")
        .join("chrome-131313-300x250-iframe__vs__firefox-131313-300x250-iframe.png")
        .exists());
}

#[test]
fn compare_dry_run_writes_no_merged_images() {
    let dir = TempDir::new().expect("tempdir");
    let out = dir.path().join("output");
    capture(&out, "default", "chrome", "131313", [0, 0, 0, 255]);
    capture(&out, "default", "firefox", "131313", [255, 255, 255, 255]);
    let cfg = write_config(dir.path(), &out);

    let output = run(&[
        "compare",
        "--config",
        cfg.to_str().unwrap(),
        "--campaigns",
        "131313",
        "--build",
        "job",
        "--dry-run",
    ]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout_json(&output)["dryRun"], true);
    assert!(!out.join("job").exists());
}

#[test]
fn compare_ignores_trailing_comma_in_sizes() {
    let dir = TempDir::new().expect("tempdir");
    let out = dir.path().join("output");
    capture(&out, "default", "chrome", "131313", [10, 20, 30, 255]);
    capture(&out, "default", "firefox", "131313", [10, 20, 30, 255]);
    let cfg = write_config(dir.path(), &out);

    let output = run(&[
        "compare",
        "--config",
        cfg.to_str().unwrap(),
        "--campaigns",
        "131313",
        "--sizes",
        "300x250,",
        "--skip-aggregate",
    ]);
    assert_eq!(output.status.code(), Some(0));
    let json = stdout_json(&output);
    assert_eq!(json["totals"]["total"], 1);
    assert_eq!(json["totals"]["errors"], 0);
}

#[test]
fn compare_rejects_build_outside_output_dir() {
    let dir = TempDir::new().expect("tempdir");
    let out = dir.path().join("output");
    capture(&out, "default", "chrome", "131313", [0, 0, 0, 255]);
    capture(&out, "default", "firefox", "131313", [255, 255, 255, 255]);
    let cfg = write_config(dir.path(), &out);

    let output = run(&[
        "compare",
        "--config",
        cfg.to_str().unwrap(),
        "--campaigns",
        "131313",
        "--build",
        "../escaped",
    ]);
    assert_eq!(output.status.code(), Some(2));
    assert_eq!(stdout_json(&output)["error"]["category"], "path");
    assert!(!dir.path().join("escaped").exists());
}

#[test]
fn compare_pretty_output_to_file() {
    let dir = TempDir::new().expect("tempdir");
    let out = dir.path().join("output");
    capture(&out, "default", "chrome", "1", [5, 5, 5, 255]);
    let cfg = write_config(dir.path(), &out);
    let report = dir.path().join("report.json");

    let output = run(&[
        "compare",
        "--config",
        cfg.to_str().unwrap(),
        "--campaigns",
        "1",
        "--format",
        "pretty",
        "--output",
        report.to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(0));

    // File output keeps the JSON shape.
    let written: Value =
        serde_json::from_str(&std::fs::read_to_string(&report).unwrap()).expect("json report");
    assert_eq!(written["totals"]["skipped"], 1);
}

#[test]
fn compare_without_campaigns_is_fatal() {
    let dir = TempDir::new().expect("tempdir");
    let out = dir.path().join("output");
    std::fs::create_dir_all(&out).unwrap();
    let cfg = write_config(dir.path(), &out);

    let output = run(&["compare", "--config", cfg.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(2));
    let json = stdout_json(&output);
    assert_eq!(json["mode"], "error");
    assert_eq!(json["error"]["category"], "config");
}

#[test]
fn compare_with_missing_output_dir_is_fatal() {
    let dir = TempDir::new().expect("tempdir");
    let cfg = write_config(dir.path(), &dir.path().join("missing"));

    let output = run(&[
        "compare",
        "--config",
        cfg.to_str().unwrap(),
        "--campaigns",
        "1",
    ]);
    assert_eq!(output.status.code(), Some(2));
    let remediation = stdout_json(&output)["error"]["remediation"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    assert!(remediation.contains("--output-dir"), "got: {remediation}");
}

#[test]
fn unknown_publisher_is_fatal() {
    let dir = TempDir::new().expect("tempdir");
    let out = dir.path().join("output");
    std::fs::create_dir_all(&out).unwrap();
    let cfg = write_config(dir.path(), &out);

    let output = run(&[
        "compare",
        "--config",
        cfg.to_str().unwrap(),
        "--publishers",
        "404",
    ]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stdout_json(&output)["error"]["message"]
        .as_str()
        .unwrap_or_default()
        .contains("404"));
}

#[test]
fn invalid_config_file_is_fatal() {
    let dir = TempDir::new().expect("tempdir");
    let cfg = dir.path().join("bad.toml");
    std::fs::write(&cfg, "no_such_key = 1\n").unwrap();

    let output = run(&["aggregate", "--config", cfg.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(2));
    let message = stdout_json(&output)["error"]["message"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    assert!(message.contains("bad.toml"), "got: {message}");
}

#[test]
fn aggregate_copies_builds_into_default() {
    let dir = TempDir::new().expect("tempdir");
    let out = dir.path().join("output");
    capture(&out, "20240101-000000", "chrome", "1", [1, 1, 1, 255]);
    capture(&out, "20240102-000000", "firefox", "1", [1, 1, 1, 255]);
    let cfg = write_config(dir.path(), &out);

    let output = run(&["aggregate", "--config", cfg.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(0));

    let json = stdout_json(&output);
    assert_eq!(json["mode"], "aggregate");
    assert_eq!(json["filesCopied"], 2);
    assert!(out
        .join("default/firefox/1/300x250/iframe/firefox-1-300x250-iframe.png")
        .exists());
}

#[test]
fn clean_removes_build_and_reports_missing() {
    let dir = TempDir::new().expect("tempdir");
    let out = dir.path().join("output");
    capture(&out, "old", "chrome", "1", [1, 1, 1, 255]);
    let cfg = write_config(dir.path(), &out);

    let output = run(&["clean", "--config", cfg.to_str().unwrap(), "--build", "old"]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout_json(&output)["removed"], true);
    assert!(!out.join("old").exists());

    let output = run(&["clean", "--config", cfg.to_str().unwrap(), "--build", "old"]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout_json(&output)["removed"], false);
}

#[test]
fn clean_rejects_nested_build_names() {
    let dir = TempDir::new().expect("tempdir");
    let out = dir.path().join("output");
    std::fs::create_dir_all(&out).unwrap();
    let cfg = write_config(dir.path(), &out);

    for build in ["../elsewhere", "..", "."] {
        let output = run(&["clean", "--config", cfg.to_str().unwrap(), "--build", build]);
        assert_eq!(output.status.code(), Some(2), "build {build:?}");
        assert_eq!(stdout_json(&output)["error"]["category"], "path");
    }
    assert!(out.exists(), "output dir must survive");
}
