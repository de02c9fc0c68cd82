use chrono::NaiveDate;
use record_filter::record::{FieldKind, FieldValue, LoadError, load_records};
use record_filter::schema::Schema;
use std::fs;
use std::path::PathBuf;
use tempfile::{TempDir, tempdir};

fn write_records(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("failed to write records");
    path
}

#[test]
fn test_json_array_with_inferred_kinds() {
    let dir = tempdir().expect("temp dir");
    let path = write_records(
        &dir,
        "candidates.json",
        r#"[
            {"id": 1, "name": "Ana García", "experience": 5, "applied_date": "2024-01-15",
             "skills": ["React", "TypeScript"], "remote": true, "phone": null}
        ]"#,
    );

    let records = load_records(&path, &Schema::default()).expect("records should load");
    let ana = &records[0];

    assert_eq!(ana.id(), "1");
    assert_eq!(ana.get("name"), Some(&FieldValue::from("Ana García")));
    assert_eq!(ana.get("experience"), Some(&FieldValue::Number(5.0)));
    assert_eq!(
        ana.get("applied_date"),
        Some(&FieldValue::Date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()))
    );
    assert_eq!(ana.get("skills").and_then(FieldValue::as_list).map(|l| l.len()), Some(2));
    assert_eq!(ana.get("remote"), Some(&FieldValue::from("true")));
    assert_eq!(ana.get("phone"), None);
}

#[test]
fn test_schema_coerces_declared_kinds() {
    let dir = tempdir().expect("temp dir");
    let path = write_records(
        &dir,
        "jobs.json",
        r#"[{"id": "j1", "salary_min": "42000", "posted_date": "2024-03-01T09:30:00Z", "code": 17}]"#,
    );
    let schema = Schema::new()
        .with_field("salary_min", FieldKind::Number)
        .with_field("posted_date", FieldKind::Date)
        .with_field("code", FieldKind::Text);

    let records = load_records(&path, &schema).expect("records should load");

    assert_eq!(records[0].get("salary_min"), Some(&FieldValue::Number(42000.0)));
    assert_eq!(
        records[0].get("posted_date"),
        Some(&FieldValue::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()))
    );
    assert_eq!(records[0].get("code"), Some(&FieldValue::from("17")));
}

#[test]
fn test_json5_and_json_lines_files() {
    let dir = tempdir().expect("temp dir");
    let json5 = write_records(
        &dir,
        "volunteers.json5",
        "[\n  // comment\n  {id: 'v1', name: 'Marta', hours: 12,},\n]\n",
    );
    let jsonl = write_records(
        &dir,
        "volunteers.jsonl",
        "{\"id\": \"v1\", \"name\": \"Marta\"}\n\n{\"id\": \"v2\", \"name\": \"Pablo\"}\n",
    );

    let from_json5 = load_records(&json5, &Schema::default()).expect("json5 should load");
    let from_jsonl = load_records(&jsonl, &Schema::default()).expect("jsonl should load");

    assert_eq!(from_json5[0].get("hours"), Some(&FieldValue::Number(12.0)));
    assert_eq!(
        from_jsonl.iter().map(|r| r.id()).collect::<Vec<_>>(),
        vec!["v1", "v2"]
    );
}

#[test]
fn test_wrong_kind_for_declared_field() {
    let dir = tempdir().expect("temp dir");
    let path = write_records(&dir, "c.json", r#"[{"id": "c1", "experience": "lots"}]"#);
    let schema = Schema::new().with_field("experience", FieldKind::Number);

    match load_records(&path, &schema) {
        Err(LoadError::FieldType { id, field, expected, .. }) => {
            assert_eq!(id, "c1");
            assert_eq!(field, "experience");
            assert_eq!(expected, FieldKind::Number);
        }
        other => panic!("expected field type error, got {other:?}"),
    }
}

#[test]
fn test_structural_errors() {
    let dir = tempdir().expect("temp dir");

    let not_array = write_records(&dir, "a.json", r#"{"id": 1}"#);
    assert!(matches!(
        load_records(&not_array, &Schema::default()),
        Err(LoadError::NotAnArray { .. })
    ));

    let missing_id = write_records(&dir, "b.json", r#"[{"name": "Ana"}]"#);
    assert!(matches!(
        load_records(&missing_id, &Schema::default()),
        Err(LoadError::MissingId { .. })
    ));

    let duplicate = write_records(&dir, "c.json", r#"[{"id": 1}, {"id": 1}]"#);
    assert!(matches!(
        load_records(&duplicate, &Schema::default()),
        Err(LoadError::DuplicateId(id)) if id == "1"
    ));

    let nested = write_records(&dir, "d.json", r#"[{"id": 1, "address": {"city": "Madrid"}}]"#);
    assert!(matches!(
        load_records(&nested, &Schema::default()),
        Err(LoadError::NestedValue { .. })
    ));

    let bad_line = write_records(&dir, "e.jsonl", "{\"id\": 1}\nnot json\n");
    match load_records(&bad_line, &Schema::default()) {
        Err(LoadError::Json { location, .. }) => assert!(location.ends_with(":2"), "{location}"),
        other => panic!("expected json error, got {other:?}"),
    }
}
