use assert_cmd::Command;
use predicates::prelude::*;

fn hostql() -> Command {
    let mut cmd = Command::cargo_bin("hostql").unwrap();
    cmd.env_remove("HOSTQL_FORMAT").env_remove("HOSTQL_CONCURRENCY");
    cmd
}

#[test]
fn test_list_actions() {
    hostql()
        .arg("--list-actions")
        .assert()
        .success()
        .stdout(predicate::str::contains("hostName"))
        .stdout(predicate::str::contains("docker.containers"));
}

#[test]
fn test_list_transformers() {
    hostql()
        .arg("--list-transformers")
        .assert()
        .success()
        .stdout(predicate::str::contains("@toHumanSize"));
}

#[test]
fn test_parse_error_exits_with_one() {
    hostql()
        .args(["-q", "get { local { hostName "])
        .assert()
        .code(1)
        .stderr(predicate::str::starts_with("Error: Parse error"));
}

#[test]
fn test_missing_query_file() {
    hostql()
        .args(["-i", "/nonexistent/query.hql"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to read query file"));
}

#[cfg(unix)]
#[test]
fn test_run_custom_locally() {
    hostql()
        .args(["-q", r#"get { local { runCustom(cmd: "echo hi") } }"#])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"output\": \"hi\""))
        .stdout(predicate::str::contains("\"exitCode\": 0"));
}

#[cfg(unix)]
#[test]
fn test_output_file_and_yaml() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("result.yaml");
    let query = dir.path().join("query.hql");
    std::fs::write(
        &query,
        "# echo through the shell\nget {\n  local { runCustom(cmd: \"echo hi\") { output } }\n}\n",
    )
    .unwrap();

    hostql()
        .arg("-i")
        .arg(&query)
        .args(["-o", "yaml", "-f"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let written = std::fs::read_to_string(&out).unwrap();
    assert_eq!(written, "localhost:\n  runCustom:\n    output: hi\n");
}
