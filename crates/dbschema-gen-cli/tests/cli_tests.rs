//! CLI integration tests for dbschema-gen.
//!
//! These tests verify command-line argument parsing, help output,
//! generation from captured dumps, and exit codes for error conditions.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

/// Get a command for the dbschema-gen binary.
fn cmd() -> Command {
    Command::cargo_bin("dbschema-gen").unwrap()
}

const FIELDS: &str = "\
table_name,column_name,column_default,ordinal_position,data_type,column_type,is_nullable,character_maximum_length
todo,id,NULL,1,int,int,NO,NULL
todo,title,NULL,2,varchar,varchar(255),NO,255
todo,status,open,3,enum,\"enum('open','done')\",NO,4
";

const INDEXES: &str = "\
table_name,index_name,column_name,seq_in_index
todo,PRIMARY,id,1
";

/// Write dumps and a config into a temp dir, returning the config path.
fn setup(dir: &Path, extra: &str) -> std::path::PathBuf {
    std::fs::write(dir.join("fields.csv"), FIELDS).unwrap();
    std::fs::write(dir.join("indexes.csv"), INDEXES).unwrap();
    let config = format!(
        "engine: mysql\ndumps:\n  fields: {}\n  indexes: {}\noutput:\n  idl: {}\n  dsl: {}\n{}",
        dir.join("fields.csv").display(),
        dir.join("indexes.csv").display(),
        dir.join("schema.graphql").display(),
        dir.join("resource.ts").display(),
        extra
    );
    let path = dir.join("config.yaml");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(config.as_bytes()).unwrap();
    path
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_shows_all_commands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("validate"));
}

#[test]
fn test_generate_subcommand_help() {
    cmd()
        .args(["generate", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--include"))
        .stdout(predicate::str::contains("--exclude"));
}

#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("dbschema-gen"));
}

#[test]
fn test_global_flags_in_help() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--log-format"))
        .stdout(predicate::str::contains("--verbosity"))
        .stdout(predicate::str::contains("--output-json"));
}

#[test]
fn test_unknown_verbosity_rejected() {
    cmd()
        .args(["--verbosity", "loud", "validate"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("invalid value 'loud'"));
}

#[test]
fn test_json_logs_go_to_stderr() {
    let dir = TempDir::new().unwrap();
    let config = setup(dir.path(), "");

    cmd()
        .env_remove("RUST_LOG")
        .args([
            "--config",
            config.to_str().unwrap(),
            "--log-format",
            "json",
            "--verbosity",
            "debug",
            "generate",
            "--dry-run",
        ])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("input AMPLIFY {"))
        .stderr(predicate::str::contains("\"level\":\"INFO\""));
}

// =============================================================================
// Error Handling Tests
// =============================================================================

#[test]
fn test_missing_config_file() {
    cmd()
        .args(["--config", "/nonexistent/config.yaml", "validate"])
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("IO error"));
}

#[test]
fn test_invalid_config_yaml() {
    let mut temp = tempfile::NamedTempFile::new().unwrap();
    writeln!(temp, "this is: [not valid").unwrap();

    cmd()
        .args(["--config", temp.path().to_str().unwrap(), "validate"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("YAML error"));
}

#[test]
fn test_config_without_input() {
    let mut temp = tempfile::NamedTempFile::new().unwrap();
    writeln!(temp, "engine: mysql\noutput:\n  idl: schema.graphql").unwrap();

    cmd()
        .args(["--config", temp.path().to_str().unwrap(), "validate"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("one of source or dumps is required"));
}

#[test]
fn test_conflicting_filter_flags() {
    let dir = TempDir::new().unwrap();
    let config = setup(dir.path(), "");

    cmd()
        .args([
            "--config",
            config.to_str().unwrap(),
            "generate",
            "--include",
            "todo",
            "--exclude",
            "note",
        ])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("cannot both be specified"));
}

#[test]
fn test_no_primary_key_exit_code() {
    let dir = TempDir::new().unwrap();
    let config = setup(dir.path(), "");
    std::fs::write(
        dir.path().join("indexes.csv"),
        "table_name,index_name,column_name,seq_in_index\n",
    )
    .unwrap();

    cmd()
        .args(["--config", config.to_str().unwrap(), "generate"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("primary key"));
    assert!(!dir.path().join("schema.graphql").exists());
}

// =============================================================================
// Generation Tests
// =============================================================================

#[test]
fn test_generate_writes_documents() {
    let dir = TempDir::new().unwrap();
    let config = setup(dir.path(), "");

    cmd()
        .args(["--config", config.to_str().unwrap(), "generate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Generation completed!"))
        .stdout(predicate::str::contains("Models: 1"));

    let idl = std::fs::read_to_string(dir.path().join("schema.graphql")).unwrap();
    assert!(idl.contains("id: Int! @primaryKey"));
    assert!(idl.contains("status: todo_status! @default(value: \"open\")"));

    let dsl = std::fs::read_to_string(dir.path().join("resource.ts")).unwrap();
    assert!(dsl.contains("\"todo_status\": a.enum([\"open\", \"done\"])"));
}

#[test]
fn test_generate_output_json() {
    let dir = TempDir::new().unwrap();
    let config = setup(dir.path(), "");

    cmd()
        .args(["--config", config.to_str().unwrap(), "--output-json", "generate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"engine\": \"mysql\""))
        .stdout(predicate::str::contains("\"models\": 1"));
}

#[test]
fn test_dry_run_prints_without_writing() {
    let dir = TempDir::new().unwrap();
    let config = setup(dir.path(), "");

    cmd()
        .args(["--config", config.to_str().unwrap(), "generate", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("input AMPLIFY {"))
        .stdout(predicate::str::contains("export const schema = a.schema({"));
    assert!(!dir.path().join("schema.graphql").exists());
}

#[test]
fn test_regenerate_keeps_hand_edits() {
    let dir = TempDir::new().unwrap();
    let config = setup(dir.path(), "");
    std::fs::write(
        dir.path().join("schema.graphql"),
        "type Task @model @refersTo(name: \"todo\") {\n  id: Int! @primaryKey\n  comments: [Comment] @hasMany(references: [\"todoId\"])\n}\n",
    )
    .unwrap();

    cmd()
        .args(["--config", config.to_str().unwrap(), "generate"])
        .assert()
        .success();

    let idl = std::fs::read_to_string(dir.path().join("schema.graphql")).unwrap();
    assert!(idl.contains("type Task @model @refersTo(name: \"todo\") {"));
    assert!(idl.contains("  comments: [Comment] @hasMany(references: [\"todoId\"])\n"));
}

#[test]
fn test_validate_reports_catalog() {
    let dir = TempDir::new().unwrap();
    let config = setup(dir.path(), "connection:\n  identifier: TodoDb\n  connection_uri_secret: SQL_URI\n");

    cmd()
        .args(["--config", config.to_str().unwrap(), "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Catalog OK"))
        .stdout(predicate::str::contains("Engine: mysql"))
        .stdout(predicate::str::contains("Enums: 1"));
}
