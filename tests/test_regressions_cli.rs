use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::{TempDir, tempdir};

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_record-filter")
}

fn write_file(path: &Path, content: &str) {
    fs::write(path, content).expect("failed to write test file");
}

const CANDIDATES: &str = r#"[
  {"id": 1, "name": "Ana García", "email": "ana@example.com", "position": "Frontend Developer",
   "status": "Interview", "experience": 5, "applied_date": "2024-01-15", "skills": ["React", "TypeScript"]},
  {"id": 2, "name": "Carlos Ruiz", "email": "carlos@example.com", "position": "Backend Developer",
   "status": "Hired", "experience": 1, "applied_date": "2023-11-02", "skills": ["Python"]},
  {"id": 3, "name": "Lucía Martín", "email": "lucia@example.com", "position": "Fullstack Developer",
   "status": "Interview", "experience": 10, "applied_date": "2024-02-20", "skills": ["React", "Node.js"]}
]"#;

fn candidates_file(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("candidates.json");
    write_file(&path, CANDIDATES);
    path
}

fn run(args: &[&str]) -> Output {
    Command::new(bin())
        .args(["--color", "never"])
        .args(args)
        .output()
        .expect("command should run")
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_search_with_profile_filters_and_term() {
    let dir = tempdir().expect("temp dir");
    let file = candidates_file(&dir);

    let output = run(&[
        "-p",
        "candidates",
        "search",
        file.to_str().expect("utf8 path"),
        "-f",
        "status:Interview experience:3..",
        "-s",
        "lucía",
        "--show",
        "name,experience",
    ]);
    let text = stdout(&output);

    assert!(text.starts_with("SEARCH matched 1 of 3 records"), "got:\n{text}");
    assert!(text.contains("Filter: experience:3.."), "got:\n{text}");
    assert!(text.contains("3: name=Lucía Martín | experience=10"), "got:\n{text}");
    assert!(!text.contains("Ana"), "got:\n{text}");
}

#[test]
fn test_search_without_profile_infers_search_fields() {
    let dir = tempdir().expect("temp dir");
    let file = candidates_file(&dir);

    let output = run(&["search", file.to_str().expect("utf8 path"), "-s", "REACT"]);
    let text = stdout(&output);

    assert!(text.starts_with("SEARCH matched 2 of 3 records"), "got:\n{text}");
}

#[test]
fn test_json_search_written_to_output_file() {
    let dir = tempdir().expect("temp dir");
    let file = candidates_file(&dir);
    let out = dir.path().join("out.json");

    let output = run(&[
        "-F",
        "json",
        "-o",
        out.to_str().expect("utf8 path"),
        "-p",
        "candidates",
        "search",
        file.to_str().expect("utf8 path"),
        "-f",
        "skills:any(React)",
        "-n",
        "1",
    ]);
    stdout(&output);

    let content = fs::read_to_string(&out).expect("output file should exist");
    let value: serde_json::Value = serde_json::from_str(&content).expect("valid json output");
    assert_eq!(value["search"]["matches"], 2);
    assert_eq!(value["search"]["truncated"], true);
    assert_eq!(value["search"]["records"][0]["name"], "Ana García");
}

#[test]
fn test_criteria_file_merges_with_filter_expression() {
    let dir = tempdir().expect("temp dir");
    let file = candidates_file(&dir);
    let criteria = dir.path().join("criteria.json");
    write_file(
        &criteria,
        r#"[
            {"field": "status", "mode": "equals", "value": "Hired"},
            {"field": "applied_date", "mode": "dateOnOrAfter", "value": "2024-01-01"}
        ]"#,
    );

    let output = run(&[
        "-p",
        "candidates",
        "search",
        file.to_str().expect("utf8 path"),
        "--criteria",
        criteria.to_str().expect("utf8 path"),
        "-f",
        "status:Interview",
    ]);
    let text = stdout(&output);

    assert!(text.starts_with("SEARCH matched 2 of 3 records"), "got:\n{text}");
    assert!(text.contains("Filter: status:Interview"), "got:\n{text}");
}

#[test]
fn test_count_by_list_field() {
    let dir = tempdir().expect("temp dir");
    let file = candidates_file(&dir);

    let output = run(&[
        "-p",
        "candidates",
        "count",
        file.to_str().expect("utf8 path"),
        "--by",
        "skills",
    ]);
    let text = stdout(&output);

    assert!(text.starts_with("COUNT by skills (3 records)"), "got:\n{text}");
    assert!(text.contains("     2  React"), "got:\n{text}");
}

#[test]
fn test_count_by_undeclared_field_fails() {
    let dir = tempdir().expect("temp dir");
    let file = candidates_file(&dir);

    let output = run(&[
        "-p",
        "candidates",
        "count",
        file.to_str().expect("utf8 path"),
        "--by",
        "salary",
    ]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("salary"));
}

#[test]
fn test_invalid_filter_expression_fails() {
    let dir = tempdir().expect("temp dir");
    let file = candidates_file(&dir);

    let output = run(&[
        "-p",
        "candidates",
        "search",
        file.to_str().expect("utf8 path"),
        "-f",
        "status~fuzzy:Hired",
    ]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid filter expression"), "stderr: {stderr}");
    assert!(stderr.contains("fuzzy"), "stderr: {stderr}");
}

#[test]
fn test_info_json_summary() {
    let dir = tempdir().expect("temp dir");
    let file = candidates_file(&dir);

    let output = run(&["-F", "json", "info", file.to_str().expect("utf8 path")]);
    let value: serde_json::Value =
        serde_json::from_str(&stdout(&output)).expect("valid json summary");

    assert_eq!(value["summary"]["total"], 3);
    let experience = value["summary"]["fields"]
        .as_array()
        .expect("fields array")
        .iter()
        .find(|f| f["name"] == "experience")
        .expect("experience summarized");
    assert_eq!(experience["min"], "1");
    assert_eq!(experience["max"], "10");
}

#[test]
fn test_info_text_writes_plain_output_file() {
    let dir = tempdir().expect("temp dir");
    let file = candidates_file(&dir);
    let out = dir.path().join("summary.txt");

    let output = run(&[
        "-o",
        out.to_str().expect("utf8 path"),
        "info",
        file.to_str().expect("utf8 path"),
    ]);
    stdout(&output);

    let content = fs::read_to_string(&out).expect("output file should exist");
    assert!(content.starts_with("RECORD SUMMARY"), "got:\n{content}");
    assert!(content.contains("Total records: 3"), "got:\n{content}");
}

#[test]
fn test_profiles_lists_builtins() {
    let text = stdout(&run(&["profiles"]));

    for name in ["candidates", "jobs", "volunteers"] {
        assert!(text.contains(name), "missing {name} in:\n{text}");
    }
}

#[test]
fn test_missing_record_file_fails() {
    let dir = tempdir().expect("temp dir");
    let missing = dir.path().join("absent.json");

    let output = run(&["search", missing.to_str().expect("utf8 path")]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to load records"));
}

#[test]
fn test_schemaless_filter_uses_kinds_from_data() {
    let dir = tempdir().expect("temp dir");
    let file = dir.path().join("people.json");
    write_file(
        &file,
        r#"[
            {"id": "a", "zip": "28001", "skills": ["React", "Go"]},
            {"id": "b", "zip": "08002", "skills": ["Python"]}
        ]"#,
    );
    let path = file.to_str().expect("utf8 path");

    let text = stdout(&run(&["search", path, "-f", "skills:React"]));
    assert!(text.starts_with("SEARCH matched 1 of 2 records"), "got:\n{text}");
    assert!(text.contains("Filter: skills:any(React)"), "got:\n{text}");

    let text = stdout(&run(&["search", path, "-f", "zip:28001"]));
    assert!(text.starts_with("SEARCH matched 1 of 2 records"), "got:\n{text}");
    assert!(text.contains("a: "), "got:\n{text}");
}
