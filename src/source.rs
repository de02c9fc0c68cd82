use crate::record::{LoadError, Record, load_records};
use crate::schema::Schema;
use std::path::PathBuf;

/// Where a record collection comes from
///
/// The filter engine never sees a source: callers load once, hold the
/// records, and hand slices to the engine.
pub trait RecordSource {
    fn load(&self) -> Result<Vec<Record>, LoadError>;

    /// Short human-readable origin, used in reports and logs
    fn describe(&self) -> String;
}

/// Records read from a JSON, JSON5 or JSON Lines file
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    schema: Schema,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>, schema: Schema) -> Self {
        Self {
            path: path.into(),
            schema,
        }
    }
}

impl RecordSource for FileSource {
    fn load(&self) -> Result<Vec<Record>, LoadError> {
        load_records(&self.path, &self.schema)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Records already held in memory
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    name: String,
    records: Vec<Record>,
}

impl StaticSource {
    pub fn new(name: impl Into<String>, records: Vec<Record>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }
}

impl RecordSource for StaticSource {
    fn load(&self) -> Result<Vec<Record>, LoadError> {
        Ok(self.records.clone())
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}
