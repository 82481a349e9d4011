use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const BANK_HEADER: &str = "name,deposit,site,address,withdrawals,transfer,activity,card,account";

/// A command isolated from the developer's settings file, `.env` and environment.
fn fengdash(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("fengdash").unwrap();
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    for var in [
        "APPWRITE_ENDPOINT",
        "APPWRITE_PROJECT_ID",
        "APPWRITE_DATABASE_ID",
        "APPWRITE_API_KEY",
        "APPWRITE_BUCKET_ID",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn help_lists_commands() {
    let home = TempDir::new().unwrap();
    fengdash(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("import"))
        .stdout(predicate::str::contains("schema"));
}

#[test]
fn entities_lists_every_collection() {
    let home = TempDir::new().unwrap();
    fengdash(&home)
        .arg("entities")
        .assert()
        .success()
        .stdout(predicate::str::contains("commondocument"))
        .stdout(predicate::str::contains("subscription"))
        .stdout(predicate::str::contains("photohash"));
}

#[test]
fn check_accepts_valid_file() {
    let home = TempDir::new().unwrap();
    let file = home.path().join("bank.csv");
    std::fs::write(
        &file,
        format!("\u{feff}{BANK_HEADER}\r\nBank A,1000,https://a.com,\"Room A, Room B\",5,3,https://a.com/x,Visa,123\r\n"),
    )
    .unwrap();
    fengdash(&home)
        .args(["check", "bank"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Bank: 1 valid record"));
}

#[test]
fn check_reports_header_mismatch() {
    let home = TempDir::new().unwrap();
    let file = home.path().join("bank.csv");
    std::fs::write(&file, "name,deposit,site,address,withdrawals,transfer,activity,card\nA,1,,,,,,\n").unwrap();
    fengdash(&home)
        .args(["check", "bank"])
        .arg(&file)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Header has 8 columns, expected 9"))
        .stderr(predicate::str::contains("1 problem(s) found"));
}

#[test]
fn unknown_entity_is_rejected() {
    let home = TempDir::new().unwrap();
    fengdash(&home)
        .args(["check", "music", "x.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown entity: music"));
}

#[test]
fn export_without_configuration_fails_fast() {
    let home = TempDir::new().unwrap();
    fengdash(&home)
        .args(["export", "bank"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Appwrite configuration is missing: endpoint"));
}

#[test]
fn config_set_then_show() {
    let home = TempDir::new().unwrap();
    fengdash(&home)
        .args(["config", "set", "--endpoint", "https://cloud.example.io/v1", "--api-key", "standard_abcdef1234"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved endpoint, api key"));

    assert!(home.path().join(".config/fengdash/settings.json").exists());

    fengdash(&home)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://cloud.example.io/v1"))
        .stdout(predicate::str::contains("********1234"))
        .stdout(predicate::str::contains("standard_abcdef1234").not());
}

#[test]
fn import_with_no_valid_rows_stops_before_connecting() {
    let home = TempDir::new().unwrap();
    let file = home.path().join("bank.csv");
    std::fs::write(&file, format!("{BANK_HEADER}\n,1,,,,,,,\n")).unwrap();
    fengdash(&home)
        .args(["import", "bank", "--yes"])
        .arg(&file)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Row 2: name is required"))
        .stderr(predicate::str::contains("no valid records"));
}

#[test]
fn completions_are_generated() {
    let home = TempDir::new().unwrap();
    fengdash(&home)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fengdash"));
}
