mod common;

use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use common::{encode, payment_event};
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;

fn command() -> Command {
    let mut cmd = Command::new(cargo_bin!());
    cmd.env_remove("LEDGER_URL")
        .env_remove("DB_PATH")
        .env("RUST_LOG", "info");
    cmd
}

#[test]
fn test_help() {
    command()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--ledger-url"))
        .stdout(predicate::str::contains("--restart-backoff-ms"));
}

#[test]
fn test_missing_ledger_url_is_rejected() {
    command()
        .arg("--exit-when-drained")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--ledger-url"));
}

#[test]
fn test_cli_drains_events_and_exits() -> Result<(), Box<dyn std::error::Error>> {
    let mut events = tempfile::NamedTempFile::new()?;
    writeln!(events, "{}", encode(&payment_event("10000024", "P1", &["U1234567"])))?;
    writeln!(events)?;
    writeln!(events, "not an event")?;

    command()
        .arg("--ledger-url")
        .arg("http://127.0.0.1:1")
        .arg("--events")
        .arg(events.path())
        .arg("--exit-when-drained")
        .assert()
        .success()
        .stderr(predicate::str::contains("partition seeded"))
        .stderr(predicate::str::contains("ledger confirm failed"))
        .stderr(predicate::str::contains("dropping undecodable message"))
        .stderr(predicate::str::contains("partition drained"));

    Ok(())
}

#[test]
fn test_missing_events_file_fails() {
    command()
        .arg("--ledger-url")
        .arg("http://127.0.0.1:1")
        .arg("--events")
        .arg("does/not/exist.ndjson")
        .arg("--exit-when-drained")
        .assert()
        .failure();
}
