use super::error::ConfigurationError;
use crate::record::{FieldValue, Record, parse_date};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The predicate modes a criterion can use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredicateMode {
    /// Exact match on a text or number field
    Equals,
    /// Inclusive numeric bounds, either side optional
    Range,
    /// Date field on or after a given date
    DateOnOrAfter,
    /// List field sharing at least one element with the given values
    ContainsAny,
}

impl FromStr for PredicateMode {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "equals" | "eq" | "=" => Ok(PredicateMode::Equals),
            "range" | "between" => Ok(PredicateMode::Range),
            "dateonorafter" | "date_on_or_after" | "on_or_after" | "since" | ">=" => {
                Ok(PredicateMode::DateOnOrAfter)
            }
            "containsany" | "contains_any" | "any" => Ok(PredicateMode::ContainsAny),
            _ => Err(ConfigurationError::UnknownMode(s.to_string())),
        }
    }
}

impl PredicateMode {
    /// Get the canonical name of this mode
    pub fn canonical_name(&self) -> &'static str {
        match self {
            PredicateMode::Equals => "equals",
            PredicateMode::Range => "range",
            PredicateMode::DateOnOrAfter => "dateOnOrAfter",
            PredicateMode::ContainsAny => "containsAny",
        }
    }
}

impl fmt::Display for PredicateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

/// A value compared with `equals`
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Text(String),
    Number(f64),
}

impl Scalar {
    /// Read a raw string as a number when it parses as one, text otherwise
    pub fn infer(raw: &str) -> Self {
        match raw.parse::<f64>() {
            Ok(n) if n.is_finite() => Scalar::Number(n),
            _ => Scalar::Text(raw.to_string()),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Number(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Number(value as f64)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Text(text) => f.write_str(text),
            Scalar::Number(n) => write!(f, "{n}"),
        }
    }
}

/// The condition a criterion checks on its field
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Equals(Scalar),
    Range { min: Option<f64>, max: Option<f64> },
    DateOnOrAfter(NaiveDate),
    ContainsAny(Vec<String>),
}

impl Predicate {
    pub fn mode(&self) -> PredicateMode {
        match self {
            Predicate::Equals(_) => PredicateMode::Equals,
            Predicate::Range { .. } => PredicateMode::Range,
            Predicate::DateOnOrAfter(_) => PredicateMode::DateOnOrAfter,
            Predicate::ContainsAny(_) => PredicateMode::ContainsAny,
        }
    }

    /// Check a field value. Values of the wrong kind never match.
    pub fn matches(&self, value: &FieldValue) -> bool {
        match (self, value) {
            (Predicate::Equals(Scalar::Text(expected)), FieldValue::Text(actual)) => {
                actual == expected
            }
            (Predicate::Equals(Scalar::Number(expected)), FieldValue::Number(actual)) => {
                actual == expected
            }
            (Predicate::Range { min, max }, FieldValue::Number(actual)) => {
                !actual.is_nan()
                    && min.is_none_or(|min| *actual >= min)
                    && max.is_none_or(|max| *actual <= max)
            }
            (Predicate::DateOnOrAfter(since), FieldValue::Date(actual)) => actual >= since,
            (Predicate::ContainsAny(wanted), FieldValue::List(items)) => {
                items.iter().any(|item| wanted.contains(item))
            }
            _ => false,
        }
    }

    fn validate(&self, field: &str) -> Result<(), ConfigurationError> {
        match self {
            Predicate::Equals(Scalar::Number(n)) if n.is_nan() => Err(
                ConfigurationError::malformed(field, "equals value is not a number"),
            ),
            Predicate::Range { min, max } => {
                if min.is_none() && max.is_none() {
                    return Err(ConfigurationError::malformed(
                        field,
                        "range needs at least one bound",
                    ));
                }
                if min.is_some_and(f64::is_nan) || max.is_some_and(f64::is_nan) {
                    return Err(ConfigurationError::malformed(
                        field,
                        "range bound is not a number",
                    ));
                }
                if let (Some(min), Some(max)) = (min, max)
                    && min > max
                {
                    return Err(ConfigurationError::malformed(
                        field,
                        format!("range minimum {min} is greater than maximum {max}"),
                    ));
                }
                Ok(())
            }
            Predicate::ContainsAny(values) if values.is_empty() => Err(
                ConfigurationError::malformed(field, "containsAny needs at least one value"),
            ),
            _ => Ok(()),
        }
    }
}

/// One active filter condition on a single field
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCriterion {
    pub field: String,
    pub predicate: Predicate,
}

impl FilterCriterion {
    pub fn new(field: impl Into<String>, predicate: Predicate) -> Self {
        Self {
            field: field.into(),
            predicate,
        }
    }

    pub fn equals(field: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::new(field, Predicate::Equals(value.into()))
    }

    pub fn range(field: impl Into<String>, min: Option<f64>, max: Option<f64>) -> Self {
        Self::new(field, Predicate::Range { min, max })
    }

    pub fn date_on_or_after(field: impl Into<String>, date: NaiveDate) -> Self {
        Self::new(field, Predicate::DateOnOrAfter(date))
    }

    pub fn contains_any<I, S>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            field,
            Predicate::ContainsAny(values.into_iter().map(Into::into).collect()),
        )
    }

    pub fn mode(&self) -> PredicateMode {
        self.predicate.mode()
    }

    /// A record without the field does not match
    pub fn matches(&self, record: &Record) -> bool {
        record
            .get(&self.field)
            .is_some_and(|value| self.predicate.matches(value))
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.field.trim().is_empty() {
            return Err(ConfigurationError::InvalidExpression(
                "criterion has an empty field name".to_string(),
            ));
        }
        self.predicate.validate(&self.field)
    }
}

/// Renders the criterion in filter expression syntax
impl fmt::Display for FilterCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn quoted(value: &str) -> String {
            if value.chars().any(char::is_whitespace) {
                format!("\"{value}\"")
            } else {
                value.to_string()
            }
        }

        match &self.predicate {
            Predicate::Equals(value) => write!(f, "{}:{}", self.field, quoted(&value.to_string())),
            Predicate::Range { min, max } => {
                let min = min.map(|v| v.to_string()).unwrap_or_default();
                let max = max.map(|v| v.to_string()).unwrap_or_default();
                write!(f, "{}:{min}..{max}", self.field)
            }
            Predicate::DateOnOrAfter(date) => {
                write!(f, "{}:>={}", self.field, date.format("%Y-%m-%d"))
            }
            Predicate::ContainsAny(values) => {
                write!(f, "{}:any({})", self.field, quoted(&values.join(",")))
            }
        }
    }
}

/// Active criteria keyed by field name, combined with AND
///
/// Holds at most one criterion per field; inserting a second criterion for
/// the same field replaces the first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    entries: BTreeMap<String, FilterCriterion>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a criterion, returning the one it replaced
    pub fn insert(&mut self, criterion: FilterCriterion) -> Option<FilterCriterion> {
        self.entries.insert(criterion.field.clone(), criterion)
    }

    pub fn with(mut self, criterion: FilterCriterion) -> Self {
        self.insert(criterion);
        self
    }

    pub fn remove(&mut self, field: &str) -> Option<FilterCriterion> {
        self.entries.remove(field)
    }

    pub fn get(&self, field: &str) -> Option<&FilterCriterion> {
        self.entries.get(field)
    }

    /// Merge another set on top of this one; its criteria win on shared fields
    pub fn merge(&mut self, other: Criteria) {
        self.entries.extend(other.entries);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FilterCriterion> {
        self.entries.values()
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.iter().try_for_each(FilterCriterion::validate)
    }

    /// True if the record satisfies every criterion
    pub fn matches(&self, record: &Record) -> bool {
        self.iter().all(|criterion| criterion.matches(record))
    }
}

impl FromIterator<FilterCriterion> for Criteria {
    fn from_iter<T: IntoIterator<Item = FilterCriterion>>(iter: T) -> Self {
        let mut criteria = Criteria::new();
        for criterion in iter {
            criteria.insert(criterion);
        }
        criteria
    }
}

impl<'a> IntoIterator for &'a Criteria {
    type Item = &'a FilterCriterion;
    type IntoIter = std::collections::btree_map::Values<'a, String, FilterCriterion>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}

/// A raw scalar as written in a config or criteria file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpecValue {
    Number(f64),
    Text(String),
}

impl SpecValue {
    fn as_number(&self, field: &str, what: &str) -> Result<f64, ConfigurationError> {
        match self {
            SpecValue::Number(n) => Ok(*n),
            SpecValue::Text(text) => text.trim().parse::<f64>().map_err(|_| {
                ConfigurationError::malformed(field, format!("{what} '{text}' is not numeric"))
            }),
        }
    }
}

/// The unchecked form of a criterion, as found in TOML config and JSON criteria files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionSpec {
    pub field: String,
    pub mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<SpecValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<SpecValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<SpecValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
}

impl CriterionSpec {
    pub fn new(field: impl Into<String>, mode: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            mode: mode.into(),
            value: None,
            min: None,
            max: None,
            values: None,
        }
    }

    /// Check the mode name and the values it needs, producing a typed criterion
    pub fn to_criterion(&self) -> Result<FilterCriterion, ConfigurationError> {
        let field = self.field.trim();
        let mode: PredicateMode = self.mode.parse()?;

        let predicate = match mode {
            PredicateMode::Equals => match &self.value {
                Some(SpecValue::Number(n)) => Predicate::Equals(Scalar::Number(*n)),
                Some(SpecValue::Text(text)) => Predicate::Equals(Scalar::Text(text.clone())),
                None => return Err(ConfigurationError::EmptyValue(field.to_string())),
            },
            PredicateMode::Range => Predicate::Range {
                min: self
                    .min
                    .as_ref()
                    .map(|v| v.as_number(field, "range minimum"))
                    .transpose()?,
                max: self
                    .max
                    .as_ref()
                    .map(|v| v.as_number(field, "range maximum"))
                    .transpose()?,
            },
            PredicateMode::DateOnOrAfter => match &self.value {
                Some(SpecValue::Text(text)) => {
                    let date = parse_date(text.trim()).ok_or_else(|| {
                        ConfigurationError::malformed(field, format!("'{text}' is not a date"))
                    })?;
                    Predicate::DateOnOrAfter(date)
                }
                Some(SpecValue::Number(n)) => {
                    return Err(ConfigurationError::malformed(
                        field,
                        format!("'{n}' is not a date"),
                    ));
                }
                None => return Err(ConfigurationError::EmptyValue(field.to_string())),
            },
            PredicateMode::ContainsAny => {
                let values = match (&self.values, &self.value) {
                    (Some(values), _) => values.clone(),
                    (None, Some(single)) => vec![match single {
                        SpecValue::Text(text) => text.clone(),
                        SpecValue::Number(n) => n.to_string(),
                    }],
                    (None, None) => Vec::new(),
                };
                Predicate::ContainsAny(values)
            }
        };

        let criterion = FilterCriterion::new(field, predicate);
        criterion.validate()?;
        Ok(criterion)
    }
}

impl TryFrom<&CriterionSpec> for FilterCriterion {
    type Error = ConfigurationError;

    fn try_from(spec: &CriterionSpec) -> Result<Self, Self::Error> {
        spec.to_criterion()
    }
}
