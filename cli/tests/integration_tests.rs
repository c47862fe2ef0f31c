use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn orderscript(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_orderscript"))
        .current_dir(dir)
        .args(args)
        .output()
        .expect("failed to run orderscript")
}

fn write_script(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).expect("failed to write script");
    path
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn check_clean_script_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    write_script(
        dir.path(),
        "clean.outline",
        "@等待 200\n@循环 -n 2\n    $: count += 1\n// 结束\n",
    );

    let output = orderscript(dir.path(), &["check", "clean.outline"]);
    assert!(output.status.success(), "{}", stdout(&output));
    assert!(stdout(&output).contains("clean.outline: 4 lines, 0 errors, 0 warnings"));
}

#[test]
fn check_reports_invalid_value_and_fails() {
    let dir = tempfile::tempdir().unwrap();
    write_script(dir.path(), "bad.outline", "@等待 x\n");

    let output = orderscript(dir.path(), &["check", "bad.outline"]);
    assert!(!output.status.success());
    let out = stdout(&output);
    assert!(out.contains("bad.outline:1:"));
    assert!(out.contains("invalid parameter value «x»"));
}

#[test]
fn check_deny_warnings() {
    let dir = tempfile::tempdir().unwrap();
    write_script(dir.path(), "warn.outline", "@等待\n");

    let output = orderscript(dir.path(), &["check", "warn.outline"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("missing required parameter"));

    let output = orderscript(dir.path(), &["check", "--deny-warnings", "warn.outline"]);
    assert!(!output.status.success());
}

#[test]
fn check_json_covers_every_input() {
    let dir = tempfile::tempdir().unwrap();
    write_script(dir.path(), "a.outline", "@等待 1\n");
    write_script(dir.path(), "b.json", r#"[{"content": "// 注释"}]"#);

    let output = orderscript(
        dir.path(),
        &["check", "--format", "json", "a.outline", "b.json"],
    );
    assert!(output.status.success());

    let reports: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let reports = reports.as_array().unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0]["source"], "a.outline");
    assert_eq!(reports[1]["source"], "b.json");
    assert_eq!(reports[1]["errors"], 0);
}

#[test]
fn check_uses_config_in_working_directory() {
    let dir = tempfile::tempdir().unwrap();
    write_script(dir.path(), "warn.outline", "@等待\n");
    fs::write(
        dir.path().join(".orderscript.yml"),
        "diagnostics:\n  missing_parameter: error\n",
    )
    .unwrap();

    let output = orderscript(dir.path(), &["check", "warn.outline"]);
    assert!(!output.status.success());
    assert!(stdout(&output).contains("error: missing required parameter"));
}

#[test]
fn check_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = orderscript(dir.path(), &["check", "nope.outline"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("error: Failed to read"));
}

#[test]
fn orders_filter_by_regex() {
    let dir = tempfile::tempdir().unwrap();
    let output = orderscript(dir.path(), &["orders", "--filter", "^等", "--format", "json"]);
    assert!(output.status.success());

    let orders: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let names: Vec<&str> = orders
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["等待"]);
}

#[test]
fn orders_rejects_bad_regex() {
    let dir = tempfile::tempdir().unwrap();
    let output = orderscript(dir.path(), &["orders", "--filter", "("]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid filter"));
}

#[test]
fn tree_shows_synthesized_children() {
    let dir = tempfile::tempdir().unwrap();
    write_script(dir.path(), "branch.outline", "@条件分歧 ${hp > 0}\n");

    let output = orderscript(dir.path(), &["tree", "--format", "json", "branch.outline"]);
    assert!(output.status.success());

    let entries: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let paths: Vec<&str> = entries
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["path"].as_str().unwrap())
        .collect();
    assert_eq!(paths, vec!["1", "1.1", "1.1.1", "1.2", "1.2.1"]);
    assert_eq!(entries[1]["text"], "&成立");
    assert_eq!(entries[1]["order_name"], "条件分歧 成立");
}

#[test]
fn convert_outline_to_yaml() {
    let dir = tempfile::tempdir().unwrap();
    write_script(dir.path(), "loop.outline", "@循环 -n 2\n");

    let output = orderscript(
        dir.path(),
        &["convert", "loop.outline", "--output", "out/loop.yml"],
    );
    assert!(output.status.success());

    let text = fs::read_to_string(dir.path().join("out/loop.yml")).unwrap();
    let seeds: serde_yaml::Value = serde_yaml::from_str(&text).unwrap();
    assert_eq!(seeds[0]["content"].as_str(), Some("@循环 -n 2"));
    // The reconciled document gives the loop its blank body line.
    assert_eq!(seeds[0]["children"][0]["content"].as_str(), Some(""));
}

#[test]
fn convert_rejects_unknown_extension() {
    let dir = tempfile::tempdir().unwrap();
    write_script(dir.path(), "a.outline", "// x\n");

    let output = orderscript(dir.path(), &["convert", "a.outline", "--output", "a.md"]);
    assert!(!output.status.success());
}

#[test]
fn parse_prints_tree_and_errors() {
    let dir = tempfile::tempdir().unwrap();

    let output = orderscript(dir.path(), &["parse", "@移动 -t 10"]);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.starts_with("Line 0.."));
    assert!(out.contains("MethodName"));
    assert!(out.contains("\"t\""));

    let output = orderscript(dir.path(), &["parse", "@移动 <未闭合"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("unterminated bordered value"));
}
