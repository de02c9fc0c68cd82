use super::criterion::{Criteria, FilterCriterion, Predicate, PredicateMode, Scalar};
use super::error::ConfigurationError;
use crate::record::{FieldKind, parse_date};
use crate::schema::Schema;
use regex::Regex;
use std::sync::LazyLock;

static RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(-?\d+(?:\.\d+)?)?\.\.(-?\d+(?:\.\d+)?)?$").expect("valid range regex")
});

/// A single term of a filter expression
#[derive(Debug, Clone, PartialEq)]
pub enum FilterTerm {
    /// `field:value` and its variants
    Criterion(FilterCriterion),
    /// A bare word that feeds the free-text search
    Word(String),
}

impl FilterTerm {
    /// Parse a single term, using the schema to pick modes for bare values
    pub fn parse(s: &str, schema: &Schema) -> Result<Self, ConfigurationError> {
        Self::parse_with_kinds(s, schema, schema)
    }

    /// Parse a single term, validating against `schema` but picking modes from
    /// `kinds` for fields the schema does not declare
    ///
    /// `kinds` is typically [`Schema::infer`] over the loaded records, so an
    /// empty schema still gets `skills:React` read as containsAny.
    pub fn parse_with_kinds(
        s: &str,
        schema: &Schema,
        kinds: &Schema,
    ) -> Result<Self, ConfigurationError> {
        if s.starts_with('"') || !s.contains(':') {
            return Ok(FilterTerm::Word(unquote(s).to_string()));
        }

        let (head, raw_value) = s.split_once(':').ok_or_else(|| {
            ConfigurationError::InvalidExpression(format!(
                "Expected 'field:value' format, got: {s}"
            ))
        })?;

        let (field, explicit_mode) = match head.split_once('~') {
            Some((field, mode)) => (field.trim(), Some(mode.parse::<PredicateMode>()?)),
            None => (head.trim(), None),
        };

        if field.is_empty() {
            return Err(ConfigurationError::InvalidExpression(format!(
                "Expected 'field:value' format, got: {s}"
            )));
        }
        if !schema.is_empty() && !schema.declares(field) {
            return Err(ConfigurationError::UnknownField(field.to_string()));
        }

        let value = unquote(raw_value.trim());
        if value.is_empty() {
            return Err(ConfigurationError::EmptyValue(field.to_string()));
        }

        let kind = schema.kind_of(field).or_else(|| kinds.kind_of(field));
        let predicate = match explicit_mode {
            Some(mode) => predicate_for_mode(mode, field, value, kind)?,
            None => infer_predicate(field, value, kind)?,
        };

        let criterion = FilterCriterion::new(field, predicate);
        criterion.validate()?;
        schema.validate_criterion(&criterion)?;
        Ok(FilterTerm::Criterion(criterion))
    }
}

/// Pick a mode from the value's shape, falling back to the field's declared kind
fn infer_predicate(
    field: &str,
    value: &str,
    kind: Option<FieldKind>,
) -> Result<Predicate, ConfigurationError> {
    if let Some(inner) = strip_any(value) {
        return Ok(Predicate::ContainsAny(split_values(inner)));
    }
    if let Some(date) = value.strip_prefix(">=") {
        return parse_on_or_after(field, date).map(Predicate::DateOnOrAfter);
    }
    if kind != Some(FieldKind::Text) && RANGE_RE.is_match(value) {
        return parse_range(field, value);
    }

    match kind {
        Some(FieldKind::List) => Ok(Predicate::ContainsAny(split_values(value))),
        Some(FieldKind::Date) => parse_on_or_after(field, value).map(Predicate::DateOnOrAfter),
        Some(FieldKind::Number) => parse_number(field, value).map(|n| Predicate::Equals(Scalar::Number(n))),
        Some(FieldKind::Text) => Ok(Predicate::Equals(Scalar::Text(value.to_string()))),
        None => Ok(Predicate::Equals(Scalar::infer(value))),
    }
}

fn predicate_for_mode(
    mode: PredicateMode,
    field: &str,
    value: &str,
    kind: Option<FieldKind>,
) -> Result<Predicate, ConfigurationError> {
    match mode {
        PredicateMode::Equals => Ok(Predicate::Equals(match kind {
            Some(FieldKind::Number) => Scalar::Number(parse_number(field, value)?),
            Some(_) => Scalar::Text(value.to_string()),
            None => Scalar::infer(value),
        })),
        PredicateMode::Range => parse_range(field, value),
        PredicateMode::DateOnOrAfter => {
            let date = value.strip_prefix(">=").unwrap_or(value);
            parse_on_or_after(field, date).map(Predicate::DateOnOrAfter)
        }
        PredicateMode::ContainsAny => {
            let inner = strip_any(value).unwrap_or(value);
            Ok(Predicate::ContainsAny(split_values(inner)))
        }
    }
}

fn parse_number(field: &str, value: &str) -> Result<f64, ConfigurationError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| ConfigurationError::malformed(field, format!("'{value}' is not numeric")))
}

fn parse_range(field: &str, value: &str) -> Result<Predicate, ConfigurationError> {
    let captures = RANGE_RE.captures(value).ok_or_else(|| {
        ConfigurationError::malformed(field, format!("expected 'min..max', got '{value}'"))
    })?;

    let bound = |idx: usize| -> Result<Option<f64>, ConfigurationError> {
        captures
            .get(idx)
            .map(|m| parse_number(field, m.as_str()))
            .transpose()
    };
    Ok(Predicate::Range {
        min: bound(1)?,
        max: bound(2)?,
    })
}

fn parse_on_or_after(field: &str, value: &str) -> Result<chrono::NaiveDate, ConfigurationError> {
    let value = value.trim();
    parse_date(value)
        .ok_or_else(|| ConfigurationError::malformed(field, format!("'{value}' is not a date")))
}

fn strip_any(value: &str) -> Option<&str> {
    value
        .strip_prefix("any(")
        .and_then(|rest| rest.strip_suffix(')'))
        .map(unquote)
}

fn split_values(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|v| unquote(v.trim()))
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(s)
}

/// A parsed filter expression: the criteria plus the free-text search term
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterExpression {
    /// All criteria (combined with AND logic)
    pub criteria: Criteria,
    /// Bare words joined by single spaces
    pub search_term: String,
}

impl FilterExpression {
    /// Create a new empty filter expression
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a filter expression from a string
    ///
    /// Terms are separated by whitespace. A later criterion on the same field
    /// replaces an earlier one.
    pub fn parse(s: &str, schema: &Schema) -> Result<Self, ConfigurationError> {
        Self::parse_with_kinds(s, schema, schema)
    }

    /// [`FilterExpression::parse`] with mode hints for undeclared fields
    pub fn parse_with_kinds(
        s: &str,
        schema: &Schema,
        kinds: &Schema,
    ) -> Result<Self, ConfigurationError> {
        let mut criteria = Criteria::new();
        let mut words = Vec::new();

        for part in split_preserving_quotes(s) {
            match FilterTerm::parse_with_kinds(part, schema, kinds)? {
                FilterTerm::Criterion(criterion) => {
                    criteria.insert(criterion);
                }
                FilterTerm::Word(word) if !word.is_empty() => words.push(word),
                FilterTerm::Word(_) => {}
            }
        }

        Ok(FilterExpression {
            criteria,
            search_term: words.join(" "),
        })
    }

    /// Check if this expression is empty (no criteria, no search words)
    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty() && self.search_term.is_empty()
    }
}

/// Split a string by whitespace while preserving quoted segments
fn split_preserving_quotes(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;

    for (i, c) in s.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            c if c.is_whitespace() && !in_quotes => {
                let part = s[start..i].trim();
                if !part.is_empty() {
                    parts.push(part);
                }
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }

    let part = s[start..].trim();
    if !part.is_empty() {
        parts.push(part);
    }

    parts
}
