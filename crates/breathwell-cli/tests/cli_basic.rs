//! Basic CLI E2E tests.
//!
//! Tests run the built binary with HOME pointed at a scratch directory.

use std::io::{BufRead, BufReader, Lines, Write};
use std::process::{ChildStdout, Command, Stdio};

use tempfile::TempDir;

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(home: &TempDir, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_breathwell"))
        .args(args)
        .env("HOME", home.path())
        .env_remove("BREATHWELL_ENV")
        .env_remove("BREATHWELL_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

/// Start `breathwell session run` with piped stdin/stdout.
fn spawn_session(home: &TempDir, args: &[&str]) -> std::process::Child {
    Command::new(env!("CARGO_BIN_EXE_breathwell"))
        .args(["session", "run", "--json", "--mute"])
        .args(args)
        .env("HOME", home.path())
        .env_remove("BREATHWELL_ENV")
        .env_remove("BREATHWELL_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("Failed to spawn CLI session")
}

/// Read JSON event lines until one of type `kind` arrives.
fn wait_for(lines: &mut Lines<BufReader<ChildStdout>>, kind: &str) -> serde_json::Value {
    for line in lines {
        let event: serde_json::Value = serde_json::from_str(&line.unwrap()).unwrap();
        if event["type"] == kind {
            return event;
        }
    }
    panic!("stdout closed before {kind}");
}

fn json(stdout: &str) -> serde_json::Value {
    serde_json::from_str(stdout).expect("stdout is not JSON")
}

#[test]
fn test_pattern_parse_dash() {
    let home = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(&home, &["pattern", "parse", "4-7-8", "--minutes", "2"]);
    assert_eq!(code, 0, "pattern parse failed");

    let out = json(&stdout);
    let phases = out["phases"].as_array().unwrap();
    assert_eq!(phases.len(), 3);
    assert_eq!(phases[0]["label"], "inhale");
    assert_eq!(phases[1]["label"], "hold");
    assert_eq!(phases[2]["seconds"], 8);
    assert_eq!(out["cycle_secs"], 19);
    // floor(120 / 19)
    assert_eq!(out["target_cycles"], 6);
}

#[test]
fn test_pattern_parse_unparsable_is_empty() {
    let home = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(&home, &["pattern", "parse", "just relax"]);
    assert_eq!(code, 0);
    let out = json(&stdout);
    assert!(out["phases"].as_array().unwrap().is_empty());
    assert_eq!(out["target_cycles"], 0);
}

#[test]
fn test_pattern_parse_too_many_phases() {
    let home = TempDir::new().unwrap();
    let (code, _, stderr) = run_cli(&home, &["pattern", "parse", "1-2-3-4-5"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_technique_list_json() {
    let home = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(&home, &["technique", "list", "--json"]);
    assert_eq!(code, 0, "technique list failed");
    let techniques = json(&stdout);
    assert_eq!(techniques.as_array().unwrap().len(), 5);
}

#[test]
fn test_technique_show() {
    let home = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(&home, &["technique", "show", "box-breathing"]);
    assert_eq!(code, 0);
    let out = json(&stdout);
    assert_eq!(out["technique"]["id"], "box-breathing");
    assert_eq!(out["phases"].as_array().unwrap().len(), 4);
    assert_eq!(out["cycle_secs"], 16);
}

#[test]
fn test_unknown_technique_fails() {
    let home = TempDir::new().unwrap();
    let (code, _, stderr) = run_cli(&home, &["technique", "show", "no-such-thing"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Unknown technique"));
}

#[test]
fn test_custom_catalog_from_config() {
    let home = TempDir::new().unwrap();
    let catalog = home.path().join("catalog.json");
    std::fs::write(
        &catalog,
        r#"[{"id":"lion","name":"Lion's Breath","how_to":"Inhale 3s, exhale 6s"}]"#,
    )
    .unwrap();

    let (code, _, _) = run_cli(
        &home,
        &["config", "set", "catalog_path", catalog.to_str().unwrap()],
    );
    assert_eq!(code, 0, "config set catalog_path failed");

    let (code, stdout, _) = run_cli(&home, &["technique", "list", "--json"]);
    assert_eq!(code, 0);
    let techniques = json(&stdout);
    assert_eq!(techniques.as_array().unwrap().len(), 1);
    assert_eq!(techniques[0]["id"], "lion");
}

#[test]
fn test_session_simulate_completes() {
    let home = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(
        &home,
        &[
            "session", "simulate", "--json", "--pattern", "4-4-4-4", "--minutes", "1",
        ],
    );
    assert_eq!(code, 0, "session simulate failed");

    let events: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(events.first().unwrap()["type"], "SessionStarted");
    assert_eq!(events.first().unwrap()["target_cycles"], 3);

    let last = events.last().unwrap();
    assert_eq!(last["type"], "SessionCompleted");
    assert_eq!(last["completed_cycles"], 3);

    let cycles = events
        .iter()
        .filter(|e| e["type"] == "CycleCompleted")
        .count();
    assert_eq!(cycles, 3);
}

#[test]
fn test_session_simulate_human_output() {
    let home = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(
        &home,
        &[
            "session",
            "simulate",
            "--technique",
            "coherent-breathing",
            "--minutes",
            "1",
            "--step-ms",
            "250",
        ],
    );
    assert_eq!(code, 0);
    assert!(stdout.contains("→ Exhale (5s)"));
    assert!(stdout.contains("You completed 6 cycles in 1 minute."));
}

#[test]
fn test_session_rejects_bad_minutes() {
    let home = TempDir::new().unwrap();
    let (code, _, _) = run_cli(
        &home,
        &["session", "simulate", "--pattern", "4-4", "--minutes", "0"],
    );
    assert_eq!(code, 1);
}

#[test]
fn test_config_get_set() {
    let home = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(&home, &["config", "get", "session.default_minutes"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "3.0");

    let (code, _, _) = run_cli(&home, &["config", "set", "sound.volume", "0.25"]);
    assert_eq!(code, 0);
    let (code, stdout, _) = run_cli(&home, &["config", "get", "sound.volume"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "0.25");
}

#[test]
fn test_config_rejects_invalid_value() {
    let home = TempDir::new().unwrap();
    let (code, _, _) = run_cli(&home, &["config", "set", "sound.volume", "3"]);
    assert_eq!(code, 1);
    let (_, stdout, _) = run_cli(&home, &["config", "get", "sound.volume"]);
    assert_eq!(stdout.trim(), "0.5");
}

#[test]
fn test_session_simulate_uses_preset() {
    let home = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(
        &home,
        &["session", "simulate", "--json", "--pattern", "4-4-4-4", "--preset", "2"],
    );
    assert_eq!(code, 0);
    let first: serde_json::Value = serde_json::from_str(stdout.lines().next().unwrap()).unwrap();
    assert_eq!(first["duration_min"], 2.0);
    // floor(120 / 16)
    assert_eq!(first["target_cycles"], 7);
}

#[test]
fn test_session_rejects_unknown_preset() {
    let home = TempDir::new().unwrap();
    let (code, _, stderr) = run_cli(
        &home,
        &["session", "simulate", "--pattern", "4-4", "--preset", "4"],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("preset"));
}

#[test]
fn test_session_run_line_commands() {
    let home = TempDir::new().unwrap();
    let mut child = spawn_session(&home, &["--pattern", "4-4-4-4", "--minutes", "1"]);
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"pause\nstatus\nresume\nreset\nquit\n")
        .unwrap();

    let output = child.wait_with_output().unwrap();
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let events: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    let kinds: Vec<&str> = events.iter().map(|e| e["type"].as_str().unwrap()).collect();
    assert_eq!(
        kinds,
        vec![
            "SessionStarted",
            "SessionPaused",
            "StateSnapshot",
            "SessionResumed",
            "SessionReset",
            "StateSnapshot",
        ]
    );
    assert_eq!(events[2]["status"], "paused");
    assert_eq!(events[5]["status"], "never_started");
}

#[test]
fn test_session_run_restart_and_extend_after_done() {
    let home = TempDir::new().unwrap();
    // 2s cycle, 1.2s target: one cycle per session.
    let mut child = spawn_session(&home, &["--pattern", "1-1", "--minutes", "0.02"]);
    let mut stdin = child.stdin.take().unwrap();
    let mut lines = BufReader::new(child.stdout.take().unwrap()).lines();

    let done = wait_for(&mut lines, "SessionCompleted");
    assert_eq!(done["completed_cycles"], 1);

    writeln!(stdin, "restart").unwrap();
    let started = wait_for(&mut lines, "SessionStarted");
    assert_eq!(started["target_cycles"], 1);
    wait_for(&mut lines, "SessionCompleted");

    writeln!(stdin, "+1").unwrap();
    let extended = wait_for(&mut lines, "SessionExtended");
    assert_eq!(extended["added_min"], 1.0);
    let duration = extended["duration_min"].as_f64().unwrap();
    assert!((duration - 1.02).abs() < 1e-9);
    let started = wait_for(&mut lines, "SessionStarted");
    // floor(61.2s / 2s)
    assert_eq!(started["target_cycles"], 30);

    writeln!(stdin, "quit").unwrap();
    let snapshot = wait_for(&mut lines, "StateSnapshot");
    assert_eq!(snapshot["status"], "paused");
    drop(stdin);
    assert!(child.wait().unwrap().success());
}
