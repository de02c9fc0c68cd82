use crate::record::{FieldKind, FieldValue, Record};
use crate::schema::Schema;
use crate::search::{CountGroup, build_count_groups};
use chrono::NaiveDate;
use colored::Colorize;
use comfy_table::{Cell, ContentArrangement, Table, presets};
use serde::Serialize;
use std::fmt::Write as _;

/// Number of most frequent values kept per text or list field
const TOP_VALUES: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct FieldSummary {
    pub name: String,
    pub kind: FieldKind,
    /// Records that carry the field
    pub present: usize,
    /// Distinct values (list fields count elements)
    pub distinct: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub top_values: Vec<CountGroup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub source: String,
    pub profile: String,
    pub total: usize,
    pub fields: Vec<FieldSummary>,
}

/// Summarize every field seen in the data or declared in the schema
pub fn summarize(source: &str, profile: &str, records: &[Record], schema: &Schema) -> DatasetSummary {
    let mut effective = Schema::infer(records);
    for (name, kind) in schema.fields() {
        effective.insert(name, kind);
    }

    let fields = effective
        .fields()
        .map(|(name, kind)| summarize_field(records, name, kind))
        .collect();

    DatasetSummary {
        source: source.to_string(),
        profile: profile.to_string(),
        total: records.len(),
        fields,
    }
}

fn summarize_field(records: &[Record], name: &str, kind: FieldKind) -> FieldSummary {
    let present: Vec<&Record> = records.iter().filter(|r| r.get(name).is_some()).collect();
    let groups = build_count_groups(&present, name);

    let (min, max) = match kind {
        FieldKind::Number => {
            let numbers = present.iter().filter_map(|r| r.get(name).and_then(FieldValue::as_number));
            let (min, max) = numbers.fold((None, None), |(min, max): (Option<f64>, Option<f64>), n| {
                (
                    Some(min.map_or(n, |m| m.min(n))),
                    Some(max.map_or(n, |m| m.max(n))),
                )
            });
            (min.map(|n| n.to_string()), max.map(|n| n.to_string()))
        }
        FieldKind::Date => {
            let dates = present.iter().filter_map(|r| r.get(name).and_then(FieldValue::as_date));
            let (min, max) =
                dates.fold((None, None), |(min, max): (Option<NaiveDate>, Option<NaiveDate>), d| {
                    (
                        Some(min.map_or(d, |m| m.min(d))),
                        Some(max.map_or(d, |m| m.max(d))),
                    )
                });
            (
                min.map(|d| d.format("%Y-%m-%d").to_string()),
                max.map(|d| d.format("%Y-%m-%d").to_string()),
            )
        }
        FieldKind::Text | FieldKind::List => (None, None),
    };

    let top_values = match kind {
        FieldKind::Text | FieldKind::List => groups.iter().take(TOP_VALUES).cloned().collect(),
        FieldKind::Number | FieldKind::Date => Vec::new(),
    };

    FieldSummary {
        name: name.to_string(),
        kind,
        present: present.len(),
        distinct: groups.len(),
        top_values,
        min,
        max,
    }
}

fn create_styled_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers.iter().map(|h| Cell::new(h)).collect::<Vec<_>>());
    table
}

fn field_table(summary: &DatasetSummary) -> Table {
    let mut table = create_styled_table(&["Field", "Kind", "Present", "Distinct", "Values"]);

    for field in &summary.fields {
        let values = match (&field.min, &field.max) {
            (Some(min), Some(max)) => format!("{min} .. {max}"),
            _ => field
                .top_values
                .iter()
                .map(|group| format!("{} ({})", group.key, group.count))
                .collect::<Vec<_>>()
                .join(", "),
        };

        table.add_row(vec![
            Cell::new(&field.name),
            Cell::new(field.kind),
            Cell::new(field.present),
            Cell::new(field.distinct),
            Cell::new(values),
        ]);
    }

    table
}

pub fn format_summary_text(summary: &DatasetSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "RECORD SUMMARY ({})", summary.source);
    let _ = writeln!(out, "Profile: {}", summary.profile);
    let _ = writeln!(out, "Total records: {}", summary.total);
    if !summary.fields.is_empty() {
        let _ = writeln!(out, "\n{}", field_table(summary));
    }
    out
}

pub fn format_summary_json(summary: &DatasetSummary) -> String {
    serde_json::to_string_pretty(&serde_json::json!({ "summary": summary }))
        .unwrap_or_else(|_| "{\"summary\":{\"error\":\"failed to serialize summary\"}}".into())
}

/// Print the summary with terminal styling
pub fn display_summary(summary: &DatasetSummary) {
    println!("{}", "=".repeat(80).bright_white());
    println!("{}", "RECORD SUMMARY".bold().bright_white());
    println!("{}", "=".repeat(80).bright_white());
    println!("Source:        {}", summary.source.cyan());
    println!("Profile:       {}", summary.profile.cyan());
    println!(
        "Total records: {}",
        summary.total.to_string().green().bold()
    );

    if summary.fields.is_empty() {
        return;
    }

    println!("\n{}", "FIELDS".bold());
    println!("{}", "-".repeat(80).bright_black());
    println!("{}", field_table(summary));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Record> {
        vec![
            Record::new("1")
                .with("status", "Interview")
                .with("experience", 2.0)
                .with("applied", NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()),
            Record::new("2")
                .with("status", "Hired")
                .with("experience", 8.0)
                .with("applied", NaiveDate::from_ymd_opt(2023, 11, 20).unwrap()),
            Record::new("3").with("status", "Interview"),
        ]
    }

    fn field<'a>(summary: &'a DatasetSummary, name: &str) -> &'a FieldSummary {
        summary
            .fields
            .iter()
            .find(|f| f.name == name)
            .expect("field should be summarized")
    }

    #[test]
    fn test_numeric_and_date_ranges() {
        let summary = summarize("test", "base", &sample(), &Schema::default());

        let experience = field(&summary, "experience");
        assert_eq!(experience.present, 2);
        assert_eq!(experience.min.as_deref(), Some("2"));
        assert_eq!(experience.max.as_deref(), Some("8"));

        let applied = field(&summary, "applied");
        assert_eq!(applied.min.as_deref(), Some("2023-11-20"));
        assert_eq!(applied.max.as_deref(), Some("2024-01-05"));
    }

    #[test]
    fn test_text_fields_list_top_values() {
        let summary = summarize("test", "base", &sample(), &Schema::default());
        let status = field(&summary, "status");

        assert_eq!(status.distinct, 2);
        assert_eq!(status.top_values[0].key, "Interview");
        assert_eq!(status.top_values[0].count, 2);
    }

    #[test]
    fn test_declared_but_absent_fields_are_listed() {
        let schema = Schema::new().with_field("rating", FieldKind::Number);
        let summary = summarize("test", "candidates", &sample(), &schema);
        let rating = field(&summary, "rating");

        assert_eq!(rating.present, 0);
        assert_eq!(rating.min, None);
    }

    #[test]
    fn test_text_rendering_has_header_and_rows() {
        let summary = summarize("candidates.json", "base", &sample(), &Schema::default());
        let text = format_summary_text(&summary);

        assert!(text.starts_with("RECORD SUMMARY (candidates.json)"));
        assert!(text.contains("Total records: 3"));
        assert!(text.contains("experience"));
    }
}
