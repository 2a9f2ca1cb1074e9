#![cfg(unix)]

use std::time::{Duration, Instant};

use hgctl_exec::{CommandExecutor, CommandInvocation, ExecError, Executor};
use tempfile::TempDir;

fn sh(script: &str, dir: &TempDir, timeout_secs: u64) -> CommandInvocation {
    CommandInvocation::new(["/bin/sh", "-c", script], dir.path(), timeout_secs)
}

fn capture_files(dir: &TempDir) -> Vec<String> {
    std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect()
}

/// Alive and not yet a zombie
fn is_running(pid: i32) -> bool {
    if cfg!(target_os = "linux") {
        match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
            // State is the first field after the parenthesized command name
            Ok(stat) => stat
                .rsplit(')')
                .next()
                .map(|rest| !rest.trim_start().starts_with('Z'))
                .unwrap_or(false),
            Err(_) => false,
        }
    } else {
        // SAFETY: signal 0 only checks that the pid exists
        unsafe { libc::kill(pid, 0) == 0 }
    }
}

async fn wait_until_gone(pid: i32, limit: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < limit {
        if !is_running(pid) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    !is_running(pid)
}

// ============================================================
// Exit code classification
// ============================================================

#[tokio::test]
async fn test_success_returns_captured_output() {
    let dir = TempDir::new().unwrap();
    let executor = CommandExecutor::new();

    let result = executor
        .execute(&sh("echo hello", &dir, 5))
        .await
        .unwrap();

    assert!(result.success());
    assert_eq!(result.exit_code, 0);
    assert_eq!(result.output, "hello\n");
}

#[tokio::test]
async fn test_stdout_and_stderr_are_combined() {
    let dir = TempDir::new().unwrap();
    let executor = CommandExecutor::new();

    let result = executor
        .execute(&sh("echo out; echo err 1>&2; echo again", &dir, 5))
        .await
        .unwrap();

    assert_eq!(result.output, "out\nerr\nagain\n");
    assert_eq!(result.lines(), 3);
}

#[tokio::test]
async fn test_non_zero_exit_carries_output_and_code() {
    let dir = TempDir::new().unwrap();
    let executor = CommandExecutor::new();

    let err = executor
        .execute(&sh("echo out; echo err 1>&2; exit 1", &dir, 5))
        .await
        .unwrap_err();

    match err {
        ExecError::CommandFailed {
            output, exit_code, ..
        } => {
            assert_eq!(output, "out\nerr\n");
            assert_eq!(exit_code, 1);
        }
        other => panic!("expected CommandFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_error_message_includes_diagnostics() {
    let dir = TempDir::new().unwrap();
    let executor = CommandExecutor::new();

    let err = executor
        .execute(&sh("echo 'abort: no repository found'; exit 255", &dir, 5))
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("abort: no repository found"));
    assert!(message.contains("exit_code = 255"));
    assert_eq!(err.exit_code(), Some(255));
}

#[tokio::test]
async fn test_runs_in_working_directory() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("marker.txt"), "x").unwrap();
    let executor = CommandExecutor::new();

    let result = executor.execute(&sh("ls", &dir, 5)).await.unwrap();

    assert!(result.output.contains("marker.txt"));
}

#[tokio::test]
async fn test_env_vars_are_passed() {
    let dir = TempDir::new().unwrap();
    let executor = CommandExecutor::new();
    let invocation = sh("printf %s \"$HGPLAIN\"", &dir, 5).with_env("HGPLAIN", "1");

    let result = executor.execute(&invocation).await.unwrap();

    assert_eq!(result.output, "1");
}

// ============================================================
// Timeouts
// ============================================================

#[tokio::test]
async fn test_timeout_fires_within_bound() {
    let dir = TempDir::new().unwrap();
    let executor = CommandExecutor::new();
    let start = Instant::now();

    let err = executor
        .execute(&sh("echo started; exec sleep 30", &dir, 1))
        .await
        .unwrap_err();

    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(1));
    assert!(elapsed < Duration::from_secs(4), "took {elapsed:?}");

    match err {
        ExecError::Timeout {
            timeout_secs,
            argv,
            partial_output,
            ..
        } => {
            assert_eq!(timeout_secs, 1);
            assert_eq!(argv[0], "/bin/sh");
            assert_eq!(partial_output, "started\n");
        }
        other => panic!("expected Timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn test_timeout_escalates_when_term_is_ignored() {
    let dir = TempDir::new().unwrap();
    let executor = CommandExecutor::new().with_grace_period(Duration::from_millis(300));
    let start = Instant::now();

    let err = executor
        .execute(&sh("trap '' TERM; while true; do sleep 1; done", &dir, 1))
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    assert!(start.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn test_timeout_stops_descendants() {
    let dir = TempDir::new().unwrap();
    let executor = CommandExecutor::new().with_grace_period(Duration::from_millis(500));
    let pid_file = dir.path().join("grandchild.pid");
    let script = format!("sleep 37 & echo $! > '{}'; wait", pid_file.display());

    let err = executor.execute(&sh(&script, &dir, 1)).await.unwrap_err();
    assert!(err.is_timeout());

    let pid: i32 = std::fs::read_to_string(&pid_file)
        .unwrap()
        .trim()
        .parse()
        .unwrap();
    assert!(
        wait_until_gone(pid, Duration::from_secs(3)).await,
        "background sleep {pid} survived the timeout"
    );
}

#[tokio::test]
async fn test_timeout_kills_descendants_ignoring_term() {
    let dir = TempDir::new().unwrap();
    let executor = CommandExecutor::new().with_grace_period(Duration::from_millis(300));
    let pid_file = dir.path().join("grandchild.pid");
    // The leader exits on TERM, the background child ignores it
    let script = format!(
        "(trap '' TERM; sleep 37) & echo $! > '{}'; wait",
        pid_file.display()
    );

    let err = executor.execute(&sh(&script, &dir, 1)).await.unwrap_err();
    assert!(err.is_timeout());

    let pid: i32 = std::fs::read_to_string(&pid_file)
        .unwrap()
        .trim()
        .parse()
        .unwrap();
    assert!(wait_until_gone(pid, Duration::from_secs(3)).await);
}

// ============================================================
// Capture files
// ============================================================

#[tokio::test]
async fn test_capture_file_removed_after_failure() {
    let dir = TempDir::new().unwrap();
    let capture = TempDir::new().unwrap();
    let executor = CommandExecutor::new().with_capture_dir(capture.path());
    let script = format!("ls '{}'; exit 1", capture.path().display());

    let err = executor.execute(&sh(&script, &dir, 5)).await.unwrap_err();

    // The command saw its own capture file while running
    assert!(err.captured_output().unwrap().contains("hg_cmd"));
    assert!(capture_files(&capture).is_empty());
}

#[tokio::test]
async fn test_capture_file_removed_after_timeout() {
    let dir = TempDir::new().unwrap();
    let capture = TempDir::new().unwrap();
    let executor = CommandExecutor::new()
        .with_capture_dir(capture.path())
        .with_grace_period(Duration::from_millis(300));
    let script = format!("ls '{}'; exec sleep 30", capture.path().display());

    let err = executor.execute(&sh(&script, &dir, 1)).await.unwrap_err();

    assert!(err.is_timeout());
    assert!(err.captured_output().unwrap().contains("hg_cmd"));
    assert!(capture_files(&capture).is_empty());
}

#[tokio::test]
async fn test_capture_file_removed_after_success() {
    let dir = TempDir::new().unwrap();
    let capture = TempDir::new().unwrap();
    let executor = CommandExecutor::new().with_capture_dir(capture.path());

    executor.execute(&sh("echo done", &dir, 5)).await.unwrap();

    assert!(capture_files(&capture).is_empty());
}

// ============================================================
// Invalid invocations
// ============================================================

#[tokio::test]
async fn test_missing_program_is_spawn_failure() {
    let dir = TempDir::new().unwrap();
    let executor = CommandExecutor::new();
    let invocation = CommandInvocation::new(["/nonexistent/hg-binary", "status"], dir.path(), 5);

    let err = executor.execute(&invocation).await.unwrap_err();

    assert!(matches!(err, ExecError::SpawnFailed { .. }));
}

#[tokio::test]
async fn test_zero_timeout_is_rejected() {
    let dir = TempDir::new().unwrap();
    let executor = CommandExecutor::new();

    let err = executor.execute(&sh("true", &dir, 0)).await.unwrap_err();

    assert!(matches!(err, ExecError::InvalidInvocation(_)));
}

#[tokio::test]
async fn test_empty_argv_is_rejected() {
    let dir = TempDir::new().unwrap();
    let executor = CommandExecutor::new();
    let invocation = CommandInvocation::new(Vec::<String>::new(), dir.path(), 5);

    let err = executor.execute(&invocation).await.unwrap_err();

    assert!(matches!(err, ExecError::InvalidInvocation(_)));
}

// ============================================================
// Detached daemons
// ============================================================

#[tokio::test]
async fn test_daemon_shutdown_reaps_process() {
    let dir = TempDir::new().unwrap();
    let executor = CommandExecutor::new().with_grace_period(Duration::from_millis(500));

    let mut handle = executor
        .spawn_detached(&sh("exec sleep 30", &dir, 1))
        .unwrap();

    assert!(handle.id().is_some());
    assert_eq!(handle.try_wait().unwrap(), None);

    let start = Instant::now();
    handle.shutdown().await.unwrap();
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_daemon_reports_natural_exit() {
    let dir = TempDir::new().unwrap();
    let executor = CommandExecutor::new();

    let mut handle = executor.spawn_detached(&sh("exit 3", &dir, 1)).unwrap();

    assert_eq!(handle.wait().await.unwrap(), 3);
}
