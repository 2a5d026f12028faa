//! Drives the `tradelog` binary against a journal in a temp directory.

use std::path::Path;
use std::process::{Command, Output};

fn tradelog(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tradelog"))
        .arg("--config")
        .arg(dir.join("tradelog.toml"))
        .arg("--data")
        .arg(dir.join("trades.json"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to run tradelog")
}

fn stdout(out: &Output) -> String {
    assert!(
        out.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    String::from_utf8_lossy(&out.stdout).into_owned()
}

/// Pull the trade ID out of "Opened ... (<id>)".
fn trailing_id(line: &str) -> String {
    let start = line.rfind('(').expect("no id in output") + 1;
    let end = line.rfind(')').expect("no id in output");
    line[start..end].to_string()
}

#[test]
fn empty_journal_messages() {
    let dir = tempfile::tempdir().unwrap();
    assert!(stdout(&tradelog(dir.path(), &["analytics"])).contains("No trades yet"));
    assert!(stdout(&tradelog(dir.path(), &["positions"])).contains("No open positions"));
    assert!(stdout(&tradelog(dir.path(), &["list"])).contains("No trades match"));
}

#[test]
fn open_close_and_report() {
    let dir = tempfile::tempdir().unwrap();

    let out = stdout(&tradelog(
        dir.path(),
        &[
            "add", "--symbol", "AAPL", "--quantity", "5", "--entry", "$50", "--stop", "45",
            "--strategy", "Breakout", "--date", "2024-03-01",
        ],
    ));
    assert!(out.starts_with("Opened long 5 AAPL"));
    let id = trailing_id(out.trim());

    let positions = stdout(&tradelog(dir.path(), &["positions", "--price", "AAPL=55"]));
    assert!(positions.contains("Total Unrealized P/L: 25.00"));

    let closed = stdout(&tradelog(
        dir.path(),
        &["close", &id, "--exit", "60", "--date", "2024-03-15"],
    ));
    assert!(closed.contains("P/L:            50.00"));
    assert!(closed.contains("R:R:            2.00"));

    stdout(&tradelog(
        dir.path(),
        &[
            "add", "--symbol", "MSFT", "--type", "short", "--quantity", "2", "--entry", "400",
            "--exit", "410", "--date", "2024-04-02",
        ],
    ));

    let json = stdout(&tradelog(dir.path(), &["analytics", "--json"]));
    let doc: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(doc["schemaVersion"], 1);
    assert_eq!(doc["snapshot"]["totalTrades"], 2);
    assert_eq!(doc["snapshot"]["netPL"], 30.0);
    assert_eq!(doc["snapshot"]["profitFactor"], 2.5);

    let report = stdout(&tradelog(dir.path(), &["analytics"]));
    assert!(report.contains("# Trading Performance Report"));

    let csv_path = dir.path().join("out.csv");
    stdout(&tradelog(
        dir.path(),
        &["export", "--out", csv_path.to_str().unwrap(), "--strategy", "Breakout"],
    ));
    let csv = std::fs::read_to_string(&csv_path).unwrap();
    assert_eq!(csv.lines().count(), 2);
    assert!(csv.contains(concat!(
        r#""2024-03-15","AAPL","Breakout","long","5","50.00","60.00","#,
        r#""45.00","","50.00","2.00","""#
    )));

    let closing_again = tradelog(dir.path(), &["close", &id, "--exit", "70"]);
    assert!(!closing_again.status.success());
}

#[test]
fn bad_input_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let out = tradelog(
        dir.path(),
        &["add", "--symbol", "AAPL", "--quantity", "1", "--entry", "abc"],
    );
    assert!(!out.status.success());

    let out = tradelog(dir.path(), &["delete", "missing-id"]);
    assert!(!out.status.success());
}

#[test]
fn edit_rederives_pl_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    let out = stdout(&tradelog(
        dir.path(),
        &[
            "add", "--symbol", "AAPL", "--quantity", "5", "--entry", "50", "--exit", "60",
            "--stop", "45", "--date", "2024-03-01",
        ],
    ));
    assert!(out.starts_with("Booked long AAPL P/L 50.00"));
    let id = trailing_id(out.trim());

    let edited = stdout(&tradelog(dir.path(), &["edit", &id, "--exit", "40"]));
    assert!(edited.contains("P/L:            -50.00"));
    assert!(edited.contains("R:R:            2.00"));

    let cleared = stdout(&tradelog(dir.path(), &["edit", &id, "--clear-stop"]));
    assert!(cleared.contains("R:R:            -"));

    let json = stdout(&tradelog(dir.path(), &["analytics", "--json"]));
    let doc: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(doc["snapshot"]["totalTrades"], 1);
    assert_eq!(doc["snapshot"]["netPL"], -50.0);

    let reopened = stdout(&tradelog(dir.path(), &["edit", &id, "--reopen"]));
    assert!(reopened.starts_with("Updated open long 5 AAPL"));
    let positions = stdout(&tradelog(dir.path(), &["positions", "--price", "AAPL=55"]));
    assert!(positions.contains("Total Unrealized P/L: 25.00"));

    assert!(!tradelog(dir.path(), &["edit", "missing-id", "--exit", "1"]).status.success());
}
