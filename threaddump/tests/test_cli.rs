use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use serde_json::json;

fn threaddump(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_threaddump"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run threaddump")
}

fn write_snapshot(dir: &Path, pdb_path: &str) -> String {
    let snapshot = json!({
        "pid": 4242,
        "runtimes": [{"flavor": "CoreCLR", "version": "8.0.4"}],
        "heap": [
            {"address": 4096, "type": "System.Threading.Thread",
             "fields": {"_managedThreadId": 1, "_name": "Main"}},
            {"address": 8192, "fields": {}}
        ],
        "threads": [
            {"managed_thread_id": 1, "os_thread_id": 4243, "is_alive": true,
             "state": ["Background"],
             "frames": [
                {"instruction_pointer": 288, "method": {
                    "signature": "App.Worker.Run()", "token": 100663297,
                    "module_pdb_path": pdb_path,
                    "il_offset_map": [
                        {"start_address": 256, "end_address": 272, "il_offset": 0},
                        {"start_address": 272, "end_address": 320, "il_offset": 4}
                    ]}},
                {"instruction_pointer": 0},
                {"instruction_pointer": 512, "method": {
                    "signature": "App.Program.Main(System.String[])", "token": 100663298}}
             ]},
            {"managed_thread_id": 2, "os_thread_id": 4250, "is_alive": false,
             "current_exception": {"type_name": "System.TimeoutException", "message": "late"}}
        ]
    });
    let path = dir.join("snapshot.json");
    fs::write(&path, snapshot.to_string()).unwrap();
    path.to_string_lossy().into_owned()
}

fn write_symbols(dir: &Path) -> String {
    let symbols = json!({
        "documents": ["/src/App/Worker.cs"],
        "methods": [{"token": 100663297, "sequence_points": [
            {"il_offset": 0, "document": 0, "line": 40},
            {"il_offset": 4, "document": 0, "line": 42}
        ]}]
    });
    let path = dir.join("App.pdb.json");
    fs::write(&path, symbols.to_string()).unwrap();
    fs::canonicalize(&path).unwrap().to_string_lossy().into_owned()
}

#[test]
fn test_dump_snapshot_with_symbols() {
    let dir = tempfile::tempdir().unwrap();
    let symbols = write_symbols(dir.path());
    let snapshot = write_snapshot(dir.path(), &symbols);

    let output = threaddump(&["--snapshot", &snapshot, "--symbols", &symbols]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains(&format!("Using symbol file: {symbols}")));
    assert!(stdout.contains("Thread stacktraces:"));
    assert!(stdout.contains(
        "ManagedThreadId: 1, Name: Main, OSThreadId: 4243, Thread: IsAlive: true, State: Background\n"
    ));
    assert!(stdout.contains("1:\tApp.Worker.Run() at /src/App/Worker.cs:42\n"));
    assert!(stdout.contains("2:\t[internal]\n"));
    assert!(stdout.contains("3:\tApp.Program.Main(System.String[])\n"));
    assert!(stdout.contains("ManagedThreadId: 2, Name: Unknown,"));
    assert!(stdout.contains("Thread has an exception: System.TimeoutException: late\n"));
    assert!(stdout.trim_end().ends_with("End of threads"));
}

#[test]
fn test_dump_snapshot_without_symbols() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = write_snapshot(dir.path(), "/build/App.pdb");

    let output = threaddump(&["--snapshot", &snapshot, "--quiet"]);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(!stdout.contains("Will dump threads of"));
    assert!(stdout.contains("1:\tApp.Worker.Run()\n"));
    assert!(!stdout.contains(" at /src"));
}

#[test]
fn test_report_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = write_snapshot(dir.path(), "/build/App.pdb");
    let report_path = dir.path().join("report.txt");

    let output =
        threaddump(&["--snapshot", &snapshot, "-q", "-o", report_path.to_str().unwrap()]);
    assert!(output.status.success());
    assert!(output.stdout.is_empty());

    let report = fs::read_to_string(&report_path).unwrap();
    assert!(report.starts_with("ManagedThreadId: 1, Name: Main"));
    assert!(!report.contains("Thread stacktraces:"));
}

#[test]
fn test_missing_snapshot_is_fatal() {
    let output = threaddump(&["--snapshot", "/nonexistent/snapshot.json"]);
    assert_eq!(output.status.code(), Some(1));

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(!stdout.contains("ManagedThreadId"));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert_eq!(stderr.lines().filter(|l| l.starts_with("error:")).count(), 1);
}

#[test]
fn test_snapshot_without_runtime_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.json");
    fs::write(&path, r#"{"runtimes": [], "threads": []}"#).unwrap();

    let output = threaddump(&["--snapshot", path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("does not list any managed runtime"));
    assert!(!String::from_utf8_lossy(&output.stdout).contains("Thread stacktraces:"));
}

#[test]
fn test_missing_target_is_usage_error() {
    let output = threaddump(&[]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_dead_pid_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let output =
        threaddump(&["--pid", "999999999", "--snapshot-dir", dir.path().to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("not found"));
}

#[test]
fn test_dead_pid_without_snapshot_dir() {
    let output = Command::new(env!("CARGO_BIN_EXE_threaddump"))
        .args(["--pid", "999999999"])
        .env_remove("RUST_LOG")
        .env_remove("THREADDUMP_SNAPSHOT_DIR")
        .output()
        .expect("Failed to run threaddump");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Process PID:999999999 not found"));
    assert!(!stderr.contains("Snapshot directory"));
}
