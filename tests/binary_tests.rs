//! End-to-end tests of the collector binary

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread::sleep;
use std::time::{Duration, Instant};
use tempfile::tempdir;

const BIN: &str = env!("CARGO_BIN_EXE_smdr-collector");

/// Helper to write a TOML config rooted in `dir`
fn write_config(dir: &Path) -> PathBuf {
    let path = dir.join("collector.toml");
    let content = format!(
        r#"
[network]
bind_address = "127.0.0.1"
port = 0
poll_interval_ms = 50

[output_file]
title = "SMDR"
extension = "csv"
directory = {:?}

[log_file]
title = "collector"
extension = "log"
directory = {:?}

[rotation]
interval_hours = 24
max_size_mb = 10
"#,
        dir.join("records").to_string_lossy(),
        dir.join("logs").to_string_lossy(),
    );
    std::fs::write(&path, content).unwrap();
    path
}

fn event_log(dir: &Path) -> String {
    std::fs::read_dir(dir.join("logs"))
        .ok()
        .and_then(|mut entries| entries.next())
        .and_then(|entry| std::fs::read_to_string(entry.unwrap().path()).ok())
        .unwrap_or_default()
}

fn wait_for<F: Fn() -> bool>(condition: F, limit: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < limit {
        if condition() {
            return true;
        }
        sleep(Duration::from_millis(50));
    }
    false
}

fn wait_for_exit(child: &mut Child, limit: Duration) -> std::process::ExitStatus {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait().unwrap() {
            return status;
        }
        if start.elapsed() > limit {
            let _ = child.kill();
            panic!("collector did not exit within {:?}", limit);
        }
        sleep(Duration::from_millis(50));
    }
}

/// Configuration errors are fatal and reported on stderr
#[test]
fn test_missing_config_exits_with_error_on_stderr() {
    let temp_dir = tempdir().unwrap();
    let output = Command::new(BIN)
        .arg("--config")
        .arg(temp_dir.path().join("absent.toml"))
        .env_remove("RUST_LOG")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stderr.contains("Error loading configuration"));
    assert!(!stdout.contains("Error loading configuration"));
}

/// SIGTERM runs the graceful shutdown sequence
#[cfg(unix)]
#[test]
fn test_sigterm_shuts_down_gracefully() {
    let temp_dir = tempdir().unwrap();
    let config = write_config(temp_dir.path());

    let mut child = Command::new(BIN)
        .arg("--config")
        .arg(&config)
        .env_remove("RUST_LOG")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    let listening = wait_for(
        || event_log(temp_dir.path()).contains("Listening for SMDR data"),
        Duration::from_secs(10),
    );
    if !listening {
        let _ = child.kill();
        panic!("collector never started listening");
    }

    let status = Command::new("kill")
        .args(["-TERM", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());

    let exit = wait_for_exit(&mut child, Duration::from_secs(5));
    assert!(exit.success());

    let log = event_log(temp_dir.path());
    assert!(log.contains("Received shutdown signal"));
    assert_eq!(log.matches("SMDR collector shutdown completed").count(), 1);
}
