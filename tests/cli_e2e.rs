//! End-to-end tests for the media-downloader binaries.

use assert_cmd::Command;
use predicates::prelude::*;

fn downloader() -> Command {
    let mut cmd = Command::cargo_bin("media-downloader").unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("AUDIO_ONLY")
        .env("YTDLP_PATH", "/nonexistent/yt-dlp");
    cmd
}

/// Test that the binary can be invoked without input and exits with code 0.
#[test]
fn test_binary_without_input_returns_zero() {
    let dir = tempfile::tempdir().unwrap();
    downloader()
        .env("DOWNLOAD_DIRECTORY", dir.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("No input provided"));
}

/// Test that --help displays usage information and exits with code 0.
#[test]
fn test_binary_help_displays_usage() {
    downloader()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--channel"))
        .stdout(predicate::str::contains("--links"));
}

/// Test that --version displays version and exits with code 0.
#[test]
fn test_binary_version_displays_version() {
    downloader()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("media-downloader"));
}

/// Test that invalid flags cause non-zero exit.
#[test]
fn test_binary_invalid_flag_returns_error() {
    downloader()
        .arg("--invalid-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

/// Test that an unparseable AUDIO_ONLY value is reported.
#[test]
fn test_binary_invalid_audio_only_env_returns_error() {
    downloader()
        .env("AUDIO_ONLY", "maybe")
        .assert()
        .failure()
        .stderr(predicate::str::contains("AUDIO_ONLY"));
}

/// Test that a missing link file is reported.
#[test]
fn test_binary_missing_link_file_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    downloader()
        .env("DOWNLOAD_DIRECTORY", dir.path())
        .args(["-f", "/nonexistent/links.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("links.txt"));
}

/// Test that failed downloads are logged but do not fail the run.
#[test]
fn test_binary_failed_downloads_exit_zero() {
    let dir = tempfile::tempdir().unwrap();
    downloader()
        .args(["-q", "-d"])
        .arg(dir.path())
        .args(["-l", "https://v.example/1, https://v.example/2"])
        .assert()
        .success()
        .stderr(predicate::str::contains("download failed"));
}

/// Test that the tool server answers over stdio and logs nothing to stdout.
#[test]
fn test_server_lists_tool_and_rejects_empty_url() {
    let dir = tempfile::tempdir().unwrap();
    let input = concat!(
        r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#, "\n",
        r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#, "\n",
        r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"download_media","arguments":{"video_url":""}}}"#, "\n",
    );

    let output = Command::cargo_bin("media-downloader-server")
        .unwrap()
        .env("DOWNLOAD_DIRECTORY", dir.path())
        .env("YTDLP_PATH", "/nonexistent/yt-dlp")
        .env_remove("AUDIO_ONLY")
        .write_stdin(input)
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let messages: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0]["result"]["serverInfo"]["name"], "media-downloader");
    assert_eq!(messages[1]["result"]["tools"][0]["name"], "download_media");
    assert_eq!(messages[2]["result"]["isError"], true);
    assert_eq!(messages[2]["result"]["structuredContent"]["status"], 400);
}
