use crate::filter::Criteria;
use crate::record::{ID_FIELD, Record};
use serde::Serialize;
use serde_json::json;
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Group key used when a record lacks the counted field
pub const MISSING_KEY: &str = "<none>";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountGroup {
    pub key: String,
    pub count: usize,
}

/// What a search run looked for, echoed in reports
#[derive(Debug, Clone, Copy)]
pub struct SearchContext<'a> {
    pub source: &'a str,
    pub total: usize,
    pub search_term: &'a str,
    pub criteria: &'a Criteria,
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "" } else { "s" }
}

fn describe_record(record: &Record, show_fields: &[String]) -> String {
    let parts: Vec<String> = if show_fields.is_empty() {
        record
            .fields()
            .filter(|(name, _)| *name != ID_FIELD)
            .map(|(name, value)| format!("{name}={value}"))
            .collect()
    } else {
        show_fields
            .iter()
            .filter_map(|name| record.get(name).map(|value| format!("{name}={value}")))
            .collect()
    };
    parts.join(" | ")
}

pub fn format_search_text(
    context: &SearchContext<'_>,
    matches: &[&Record],
    show_fields: &[String],
    limit: Option<usize>,
) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "SEARCH matched {} of {} record{}",
        matches.len(),
        context.total,
        plural(context.total)
    );

    if !context.search_term.is_empty() {
        let _ = writeln!(out, "Search: \"{}\"", context.search_term);
    }
    for criterion in context.criteria {
        let _ = writeln!(out, "Filter: {criterion}");
    }

    if matches.is_empty() {
        let _ = writeln!(out, "No matching records found.");
        return out;
    }
    out.push('\n');

    let shown = limit.unwrap_or(matches.len()).min(matches.len());
    let id_width = matches
        .iter()
        .take(shown)
        .map(|record| record.id().chars().count())
        .max()
        .unwrap_or(0);

    for record in matches.iter().take(shown) {
        let _ = writeln!(
            out,
            "{:>id_width$}: {}",
            record.id(),
            describe_record(record, show_fields)
        );
    }

    if shown < matches.len() {
        let _ = writeln!(out, "... {} more", matches.len() - shown);
    }

    out
}

pub fn format_search_json(
    context: &SearchContext<'_>,
    matches: &[&Record],
    limit: Option<usize>,
) -> String {
    let shown = limit.unwrap_or(matches.len()).min(matches.len());
    let records: Vec<_> = matches.iter().take(shown).map(|record| record.to_json()).collect();

    serde_json::to_string_pretty(&json!({
        "search": {
            "source": context.source,
            "total": context.total,
            "matches": matches.len(),
            "search_term": context.search_term,
            "criteria": context.criteria.iter().map(|c| c.to_string()).collect::<Vec<_>>(),
            "truncated": shown < matches.len(),
            "records": records,
        }
    }))
    .unwrap_or_else(|_| "{\"search\":{\"error\":\"failed to serialize search output\"}}".into())
}

/// Count matches per value of `field`
///
/// List fields count once per element, records without the field count
/// under [`MISSING_KEY`]. Sorted by count, largest first, then by key.
pub fn build_count_groups(matches: &[&Record], field: &str) -> Vec<CountGroup> {
    let mut grouped: BTreeMap<String, usize> = BTreeMap::new();

    for record in matches {
        match record.get(field) {
            Some(value) => {
                for key in value.display_values() {
                    *grouped.entry(key).or_insert(0) += 1;
                }
            }
            None => *grouped.entry(MISSING_KEY.to_string()).or_insert(0) += 1,
        }
    }

    let mut groups: Vec<_> = grouped
        .into_iter()
        .map(|(key, count)| CountGroup { key, count })
        .collect();
    groups.sort_by_key(|group| (Reverse(group.count), group.key.clone()));
    groups
}

pub fn format_count_text(field: &str, matches: usize, groups: &[CountGroup]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "COUNT by {field} ({matches} record{})",
        plural(matches)
    );

    if groups.is_empty() {
        return out;
    }

    out.push('\n');
    for group in groups {
        let _ = writeln!(out, "{:>6}  {}", group.count, group.key);
    }

    out
}

pub fn format_count_json(
    context: &SearchContext<'_>,
    field: &str,
    matches: usize,
    groups: &[CountGroup],
) -> String {
    serde_json::to_string_pretty(&json!({
        "count": {
            "source": context.source,
            "total": context.total,
            "matches": matches,
            "by": field,
            "groups": groups,
        }
    }))
    .unwrap_or_else(|_| "{\"count\":{\"error\":\"failed to serialize count output\"}}".into())
}
