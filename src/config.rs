use crate::filter::{ConfigurationError, Criteria, CriterionSpec, SearchSpec};
use crate::schema::Schema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid filter settings in '{path}': {source}")]
    Invalid {
        path: String,
        #[source]
        source: ConfigurationError,
    },
    #[error("Unknown profile '{0}'. Built-ins: {names}", names = builtin_profile_names().join(", "))]
    UnknownProfile(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Free-form label for the loaded profile.
    pub profile_name: String,
    /// Filterable fields and their kinds; empty means inferred from data.
    pub schema: Schema,
    pub search: SearchSettings,
    /// Criteria applied on every run before command-line filters.
    pub criteria: Vec<CriterionSpec>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            profile_name: "base".to_string(),
            schema: Schema::default(),
            search: SearchSettings::default(),
            criteria: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SearchSettings {
    pub fields: Vec<String>,
}

impl FilterConfig {
    /// Configured search fields, or every text and list field of the schema
    pub fn search_spec(&self) -> SearchSpec {
        if self.search.fields.is_empty() {
            SearchSpec::new(self.schema.searchable_fields())
        } else {
            SearchSpec::new(&self.search.fields)
        }
    }

    /// The `[[criteria]]` entries as checked criteria
    pub fn default_criteria(&self) -> Result<Criteria, ConfigurationError> {
        let mut criteria = Criteria::new();
        for spec in &self.criteria {
            let criterion = spec.to_criterion()?;
            self.schema.validate_criterion(&criterion)?;
            criteria.insert(criterion);
        }
        Ok(criteria)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.default_criteria()?;
        self.schema
            .validate_search(&SearchSpec::new(&self.search.fields))
    }
}

pub fn load_config(path: Option<&Path>) -> Result<FilterConfig, ConfigError> {
    if let Some(path) = path {
        load_config_from_path(path)
    } else {
        Ok(default_config().clone())
    }
}

pub fn load_config_from_path(path: &Path) -> Result<FilterConfig, ConfigError> {
    let path_display = path.display().to_string();
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path_display.clone(),
        source,
    })?;

    load_config_from_str(&raw, &path_display)
}

pub fn load_config_from_str(raw: &str, origin: &str) -> Result<FilterConfig, ConfigError> {
    let config = toml::from_str::<FilterConfig>(raw).map_err(|source| ConfigError::Parse {
        path: origin.to_string(),
        source,
    })?;

    config.validate().map_err(|source| ConfigError::Invalid {
        path: origin.to_string(),
        source,
    })?;

    Ok(config)
}

pub fn default_config() -> &'static FilterConfig {
    static DEFAULT_CONFIG: LazyLock<FilterConfig> = LazyLock::new(FilterConfig::default);
    &DEFAULT_CONFIG
}

const CANDIDATES_PROFILE: &str = r#"
profile_name = "candidates"

[schema]
name = "text"
email = "text"
phone = "text"
position = "text"
status = "text"
location = "text"
experience = "number"
rating = "number"
applied_date = "date"
skills = "list"
languages = "list"

[search]
fields = ["name", "email", "position", "skills"]
"#;

const JOBS_PROFILE: &str = r#"
profile_name = "jobs"

[schema]
title = "text"
department = "text"
location = "text"
type = "text"
status = "text"
salary_min = "number"
salary_max = "number"
applicants = "number"
posted_date = "date"
requirements = "list"

[search]
fields = ["title", "department", "location", "requirements"]
"#;

const VOLUNTEERS_PROFILE: &str = r#"
profile_name = "volunteers"

[schema]
name = "text"
email = "text"
area = "text"
status = "text"
hours = "number"
start_date = "date"
skills = "list"
availability = "list"

[search]
fields = ["name", "email", "area", "skills"]
"#;

const BUILTIN_PROFILES: &[(&str, &str)] = &[
    ("candidates", CANDIDATES_PROFILE),
    ("jobs", JOBS_PROFILE),
    ("volunteers", VOLUNTEERS_PROFILE),
];

pub fn builtin_profile_names() -> Vec<&'static str> {
    BUILTIN_PROFILES.iter().map(|(name, _)| *name).collect()
}

/// Load a built-in profile by name (case-insensitive); `Ok(None)` if no such profile
pub fn load_builtin_profile(name: &str) -> Result<Option<FilterConfig>, ConfigError> {
    find_profile(BUILTIN_PROFILES, name)
}

fn find_profile(
    profiles: &[(&str, &str)],
    name: &str,
) -> Result<Option<FilterConfig>, ConfigError> {
    profiles
        .iter()
        .find(|(builtin, _)| builtin.eq_ignore_ascii_case(name))
        .map(|(builtin, raw)| load_config_from_str(raw, &format!("built-in profile '{builtin}'")))
        .transpose()
}

/// Resolve a config from an explicit file, else a built-in profile, else the default
pub fn resolve_config(path: Option<&Path>, profile: Option<&str>) -> Result<FilterConfig, ConfigError> {
    match (path, profile) {
        (Some(path), _) => load_config_from_path(path),
        (None, Some(name)) => {
            load_builtin_profile(name)?.ok_or_else(|| ConfigError::UnknownProfile(name.to_string()))
        }
        (None, None) => load_config(None),
    }
}
