use super::criterion::Criteria;
use super::error::ConfigurationError;
use crate::record::{FieldValue, Record};
use serde::{Deserialize, Serialize};

/// Fields eligible for free-text search
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchSpec {
    fields: Vec<String>,
}

impl SearchSpec {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// `needle` must already be lowercased
    fn matches(&self, record: &Record, needle: &str) -> bool {
        self.fields
            .iter()
            .filter_map(|field| record.get(field))
            .any(|value| value_contains(value, needle))
    }
}

/// The matching subset of the input, in input order
pub type FilterResult<'a> = Vec<&'a Record>;

/// Case-insensitive substring test; list fields match on any element
fn value_contains(value: &FieldValue, needle: &str) -> bool {
    fn contains_ci(haystack: &str, needle: &str) -> bool {
        haystack.to_lowercase().contains(needle)
    }

    match value {
        FieldValue::Text(text) => contains_ci(text, needle),
        FieldValue::List(items) => items.iter().any(|item| contains_ci(item, needle)),
        other => contains_ci(&other.to_string(), needle),
    }
}

/// Trimmed, lowercased search term; `None` when there is nothing to search for
pub(crate) fn normalize_term(term: &str) -> Option<String> {
    let term = term.trim();
    (!term.is_empty()).then(|| term.to_lowercase())
}

fn passes(record: &Record, spec: &SearchSpec, needle: Option<&str>, criteria: &Criteria) -> bool {
    let search_match = needle.is_none_or(|needle| spec.matches(record, needle));
    search_match && criteria.matches(record)
}

/// Filter records by a free-text search and a set of criteria
///
/// A record is kept when it passes the search stage (skipped for an empty
/// term) and every criterion (skipped when `criteria` is empty). The result
/// borrows from the input and keeps its order. Records missing a filtered
/// field are dropped, never reported.
///
/// Fails only when a criterion is malformed; nothing is scanned in that case.
pub fn filter<'a, I>(
    records: I,
    search_spec: &SearchSpec,
    search_term: &str,
    criteria: &Criteria,
) -> Result<FilterResult<'a>, ConfigurationError>
where
    I: IntoIterator<Item = &'a Record>,
{
    criteria.validate()?;
    let needle = normalize_term(search_term);

    Ok(records
        .into_iter()
        .filter(|record| passes(record, search_spec, needle.as_deref(), criteria))
        .collect())
}

/// Positions of the matching records within `records`
pub fn filter_indices(
    records: &[Record],
    search_spec: &SearchSpec,
    search_term: &str,
    criteria: &Criteria,
) -> Result<Vec<usize>, ConfigurationError> {
    criteria.validate()?;
    let needle = normalize_term(search_term);

    Ok(records
        .iter()
        .enumerate()
        .filter_map(|(idx, record)| {
            passes(record, search_spec, needle.as_deref(), criteria).then_some(idx)
        })
        .collect())
}

/// Single-record form of [`filter`]
pub fn matches(
    record: &Record,
    search_spec: &SearchSpec,
    search_term: &str,
    criteria: &Criteria,
) -> Result<bool, ConfigurationError> {
    criteria.validate()?;
    let needle = normalize_term(search_term);
    Ok(passes(record, search_spec, needle.as_deref(), criteria))
}
