//! End-to-end CLI tests: config discovery, precondition failures, and a full
//! reconcile-then-deploy run against a local HTTP stub.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::path::Path;
use std::process::Command;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

fn write_config(dir: &Path, deploy_section: &str) -> std::path::PathBuf {
    let yaml = format!(
        r#"
{deploy_section}
environments:
  dev:
    path: /Repos/foo-dev
    url: https://github.com/org/foo.git
    provider: gitHub
    working_dir: bundles/dev
  prod:
    path: /Repos/foo-prod
    url: https://github.com/org/foo.git
    provider: gitHub
    branch: release
    working_dir: bundles/prod
"#
    );
    let bundle_dir = dir.join("bundles").join("dev");
    std::fs::create_dir_all(&bundle_dir).expect("mkdir");
    std::fs::write(bundle_dir.join("bundle.yaml"), "bundle:\n  name: foo\n").expect("bundle");
    let path = dir.join("deployer.yaml");
    std::fs::write(&path, yaml).expect("config");
    path
}

fn deployer() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("deployer"));
    cmd.env_remove("DATABRICKS_HOST")
        .env_remove("DATABRICKS_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

/// Answer each connection with the next canned JSON body; record request lines.
fn stub(responses: Vec<&'static str>) -> (String, Arc<Mutex<Vec<String>>>, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let handle = thread::spawn(move || {
        for body in responses {
            let (stream, _) = listener.accept().expect("accept");
            let mut reader = BufReader::new(stream.try_clone().expect("clone"));
            let mut request_line = String::new();
            reader.read_line(&mut request_line).expect("line");
            let mut length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).expect("header");
                let line = line.trim_end();
                if line.is_empty() {
                    break;
                }
                if let Some((k, v)) = line.split_once(':') {
                    if k.eq_ignore_ascii_case("content-length") {
                        length = v.trim().parse().unwrap_or(0);
                    }
                }
            }
            let mut buf = vec![0u8; length];
            reader.read_exact(&mut buf).expect("body");
            sink.lock().expect("lock").push(request_line.trim_end().to_string());
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let mut stream = stream;
            stream.write_all(response.as_bytes()).expect("write");
        }
    });
    (format!("http://{addr}/"), seen, handle)
}

// ---------------------------------------------------------------------------
// 1. Config handling
// ---------------------------------------------------------------------------

#[test]
fn envs_lists_configured_environments_as_json() {
    let dir = TempDir::new().expect("tempdir");
    let config = write_config(dir.path(), "");

    let output = deployer()
        .arg("--config")
        .arg(&config)
        .args(["envs", "--json"])
        .output()
        .expect("run");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    let names: Vec<&str> = rows
        .as_array()
        .expect("array")
        .iter()
        .map(|r| r["environment"].as_str().expect("name"))
        .collect();
    assert_eq!(names, vec!["dev", "prod"]);
    assert_eq!(rows[1]["branch"], "release");
}

#[test]
fn config_is_discovered_in_current_directory() {
    let dir = TempDir::new().expect("tempdir");
    write_config(dir.path(), "");

    deployer()
        .current_dir(dir.path())
        .env("HOME", dir.path())
        .arg("envs")
        .assert()
        .success()
        .stdout(predicate::str::contains("/Repos/foo-prod"));
}

#[test]
fn missing_config_fails_with_searched_paths() {
    let dir = TempDir::new().expect("tempdir");

    deployer()
        .current_dir(dir.path())
        .env("HOME", dir.path())
        .arg("envs")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no deployer config found"));
}

// ---------------------------------------------------------------------------
// 2. Preconditions
// ---------------------------------------------------------------------------

#[test]
fn unknown_environment_fails_fast() {
    let dir = TempDir::new().expect("tempdir");
    let config = write_config(dir.path(), "");

    deployer()
        .arg("--config")
        .arg(&config)
        .args(["deploy", "--env", "qa"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown environment 'qa'"));
}

#[test]
fn missing_bundle_fails_before_reconcile() {
    let dir = TempDir::new().expect("tempdir");
    let config = write_config(dir.path(), "");

    deployer()
        .arg("--config")
        .arg(&config)
        .args(["deploy", "--env", "prod"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No bundle config found"));
}

#[test]
fn missing_credentials_fail_reconcile() {
    let dir = TempDir::new().expect("tempdir");
    let config = write_config(dir.path(), "");

    deployer()
        .arg("--config")
        .arg(&config)
        .args(["reconcile", "--env", "dev"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("DATABRICKS_HOST is not set"));
}

// ---------------------------------------------------------------------------
// 3. End to end
// ---------------------------------------------------------------------------

#[cfg(unix)]
#[test]
fn deploy_creates_repo_then_runs_command() {
    let dir = TempDir::new().expect("tempdir");
    let config = write_config(
        dir.path(),
        r#"deploy:
  program: sh
  args: ["-c", "test -f bundle.yaml"]
  bundle_config_flag: null
  max_retries: 1
  retry_delay_secs: 0"#,
    );
    let (host, seen, handle) = stub(vec![
        r#"{"repos":[{"id":1,"path":"/Repos/foo-dev-extra"}]}"#,
        r#"{"id":2,"path":"/Repos/foo-dev","branch":"main"}"#,
    ]);

    deployer()
        .arg("--config")
        .arg(&config)
        .env("DATABRICKS_HOST", &host)
        .env("DATABRICKS_TOKEN", "dapi-test")
        .args(["deploy", "--env", "dev"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[DEV] Created repo at path: /Repos/foo-dev"))
        .stdout(predicate::str::contains("attempt 1/1"));
    handle.join().expect("stub");

    let seen = seen.lock().expect("lock");
    assert!(
        seen[0].starts_with("GET /api/2.0/repos?path_prefix="),
        "{}",
        seen[0]
    );
    assert_eq!(seen[1], "POST /api/2.0/repos HTTP/1.1");
}

#[cfg(unix)]
#[test]
fn deploy_reports_exhaustion_after_retries() {
    let dir = TempDir::new().expect("tempdir");
    let config = write_config(
        dir.path(),
        r#"deploy:
  program: sh
  args: ["-c", "exit 4"]
  bundle_config_flag: null
  max_retries: 2
  retry_delay_secs: 0"#,
    );
    let (host, _seen, handle) = stub(vec![
        r#"{"repos":[{"id":7,"path":"/Repos/foo-dev"}]}"#,
        "{}",
    ]);

    deployer()
        .arg("--config")
        .arg(&config)
        .env("DATABRICKS_HOST", &host)
        .env("DATABRICKS_TOKEN", "dapi-test")
        .args(["deploy", "--env", "dev"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[DEV] Attempt 1 failed"))
        .stderr(predicate::str::contains("Failed to deploy after 2 attempts"));
    handle.join().expect("stub");
}
