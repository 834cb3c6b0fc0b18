//! Integration tests for CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn config_source() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("config-source"))
}

#[test]
fn test_cli_version() {
    let mut cmd = config_source();
    cmd.arg("--version");
    cmd.assert().success().stdout(predicate::str::contains("config-source"));
}

#[test]
fn test_cli_help() {
    let mut cmd = config_source();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Load application configuration from S3"))
        .stdout(predicate::str::contains("load"))
        .stdout(predicate::str::contains("resolve"));
}

#[test]
fn test_resolve_strips_trailing_slash() {
    let mut cmd = config_source();
    cmd.args(["resolve", "s3://my-bucket/dir/"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("bucket: my-bucket"))
        .stdout(predicate::str::contains("key: dir\n"));
}

#[test]
fn test_resolve_json_output() {
    let mut cmd = config_source();
    cmd.args(["resolve", "--json", "s3://my-bucket/dir/filename"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(r#""bucket":"my-bucket""#))
        .stdout(predicate::str::contains(r#""key":"dir/filename""#));
}

#[test]
fn test_resolve_rejects_invalid_path() {
    let mut cmd = config_source();
    cmd.args(["resolve", "s3:/my-bucket/filename"]);
    cmd.assert().failure().stderr(predicate::str::contains("Invalid S3 path"));
}

#[test]
fn test_load_rejects_empty_filename() {
    let tmp = TempDir::new().expect("tmp");
    let mut cmd = config_source();
    cmd.current_dir(tmp.path()).args(["load", "s3://somebucket", "--silent"]);
    cmd.assert().failure().stderr(predicate::str::contains("Empty filename"));
}

#[test]
fn test_load_requires_location() {
    let mut cmd = config_source();
    cmd.arg("load");
    cmd.assert().failure();
}

#[test]
fn test_load_bucket_requires_key() {
    let mut cmd = config_source();
    cmd.args(["load", "--bucket", "somebucket"]);
    cmd.assert().failure().stderr(predicate::str::contains("--key"));
}

#[test]
fn test_load_uses_existing_cache_without_network() {
    let tmp = TempDir::new().expect("tmp");
    let cache = tmp.path().join("out.py");
    fs::write(&cache, "A = 1\nlower = 'hidden'\nHOSTS = ['a', 'b']\n").expect("write cache");

    let mut cmd = config_source();
    cmd.current_dir(tmp.path()).args([
        "load",
        "s3://somebucket/mycfg.py",
        "--cache",
        cache.to_str().expect("utf8 path"),
    ]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(r#""A": 1"#))
        .stdout(predicate::str::contains(r#""HOSTS""#))
        .stdout(predicate::str::contains("lower").not());
}

#[test]
fn test_load_infers_format_from_key() {
    let tmp = TempDir::new().expect("tmp");
    let cache = tmp.path().join("app.json");
    fs::write(&cache, r#"{"port": 8080}"#).expect("write cache");

    let mut cmd = config_source();
    cmd.current_dir(tmp.path()).args([
        "load",
        "--bucket",
        "cfg",
        "--key",
        "prod/app.json",
        "--cache",
        cache.to_str().expect("utf8 path"),
    ]);
    cmd.assert().success().stdout(predicate::str::contains(r#""port": 8080"#));
}

#[test]
fn test_load_rejects_unknown_format() {
    let tmp = TempDir::new().expect("tmp");
    let mut cmd = config_source();
    cmd.current_dir(tmp.path()).args(["load", "s3://somebucket/mycfg.py", "--format", "ini"]);
    cmd.assert().failure().stderr(predicate::str::contains("Invalid config format"));
}

#[test]
fn test_load_rejects_explicit_bad_settings() {
    let tmp = TempDir::new().expect("tmp");
    let settings = tmp.path().join("settings.toml");
    fs::write(&settings, "[s3]\nallow_http = \"maybe\"\n").expect("write settings");

    let mut cmd = config_source();
    cmd.current_dir(tmp.path()).args([
        "load",
        "s3://somebucket/mycfg.py",
        "--settings",
        settings.to_str().expect("utf8 path"),
    ]);
    cmd.assert().failure().stderr(predicate::str::contains("Invalid settings file"));
}
