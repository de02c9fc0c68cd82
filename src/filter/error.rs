use thiserror::Error;

/// Errors caused by a malformed filter configuration
///
/// These signal a caller bug (bad mode name, bad bounds, undeclared field),
/// never a data problem: missing fields and empty inputs are not errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error(
        "Unknown predicate mode: '{0}'. Valid modes are: equals, range, dateOnOrAfter, containsAny"
    )]
    UnknownMode(String),

    #[error("Malformed criterion for field '{field}': {reason}")]
    MalformedCriterion { field: String, reason: String },

    #[error("Unknown field: '{0}' is not declared in the schema")]
    UnknownField(String),

    #[error("Mode '{mode}' cannot be applied to {kind} field '{field}'")]
    ModeMismatch {
        field: String,
        mode: &'static str,
        kind: &'static str,
    },

    #[error("Empty filter value for field '{0}'")]
    EmptyValue(String),

    #[error("Invalid filter expression: {0}")]
    InvalidExpression(String),
}

impl ConfigurationError {
    pub(crate) fn malformed(field: &str, reason: impl Into<String>) -> Self {
        ConfigurationError::MalformedCriterion {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}
