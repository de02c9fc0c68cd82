use crate::filter::{ConfigurationError, Criteria, FilterCriterion, Predicate, Scalar, SearchSpec};
use crate::record::{FieldKind, ID_FIELD, Record};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The declared filterable fields of a record collection and their kinds
///
/// An empty schema declares nothing: kinds are then inferred from the data
/// and field names are not checked. A non-empty schema is the complete list
/// of fields criteria and search specs may refer to (plus `id`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    fields: BTreeMap<String, FieldKind>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.insert(name.into(), kind);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, kind: FieldKind) {
        self.fields.insert(name.into(), kind);
    }

    pub fn kind_of(&self, field: &str) -> Option<FieldKind> {
        self.fields.get(field).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, FieldKind)> {
        self.fields.iter().map(|(name, kind)| (name.as_str(), *kind))
    }

    pub fn declares(&self, field: &str) -> bool {
        field == ID_FIELD || self.fields.contains_key(field)
    }

    /// Derive a schema from data; the first kind seen for a field wins
    pub fn infer<'a>(records: impl IntoIterator<Item = &'a Record>) -> Self {
        let mut schema = Schema::new();
        for record in records {
            for (name, value) in record.fields() {
                schema
                    .fields
                    .entry(name.to_string())
                    .or_insert_with(|| value.kind());
            }
        }
        schema
    }

    /// Text and list fields, the default targets of free-text search
    pub fn searchable_fields(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|(_, kind)| matches!(kind, FieldKind::Text | FieldKind::List))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Check that every criterion targets a declared field of a fitting kind
    pub fn validate_criteria(&self, criteria: &Criteria) -> Result<(), ConfigurationError> {
        if self.is_empty() {
            return Ok(());
        }
        criteria
            .iter()
            .try_for_each(|criterion| self.validate_criterion(criterion))
    }

    pub fn validate_criterion(&self, criterion: &FilterCriterion) -> Result<(), ConfigurationError> {
        if self.is_empty() {
            return Ok(());
        }
        if !self.declares(&criterion.field) {
            return Err(ConfigurationError::UnknownField(criterion.field.clone()));
        }

        let Some(kind) = self.kind_of(&criterion.field) else {
            // `id` without a declaration accepts any mode
            return Ok(());
        };

        let fits = match &criterion.predicate {
            Predicate::Equals(Scalar::Text(_)) => kind == FieldKind::Text,
            Predicate::Equals(Scalar::Number(_)) => kind == FieldKind::Number,
            Predicate::Range { .. } => kind == FieldKind::Number,
            Predicate::DateOnOrAfter(_) => kind == FieldKind::Date,
            Predicate::ContainsAny(_) => kind == FieldKind::List,
        };

        if fits {
            Ok(())
        } else {
            Err(ConfigurationError::ModeMismatch {
                field: criterion.field.clone(),
                mode: criterion.mode().canonical_name(),
                kind: kind.canonical_name(),
            })
        }
    }

    pub fn validate_search(&self, spec: &SearchSpec) -> Result<(), ConfigurationError> {
        if self.is_empty() {
            return Ok(());
        }
        match spec.fields().iter().find(|field| !self.declares(field)) {
            Some(field) => Err(ConfigurationError::UnknownField(field.clone())),
            None => Ok(()),
        }
    }
}
