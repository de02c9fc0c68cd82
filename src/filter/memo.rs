use super::criterion::Criteria;
use super::engine::{FilterResult, SearchSpec, filter_indices, normalize_term};
use super::error::ConfigurationError;
use crate::record::Record;
use std::sync::Arc;

#[derive(Debug)]
struct CacheKey {
    records: Arc<[Record]>,
    search_spec: SearchSpec,
    search_term: Option<String>,
    criteria: Criteria,
}

impl CacheKey {
    fn same_inputs(
        &self,
        records: &Arc<[Record]>,
        search_spec: &SearchSpec,
        search_term: &Option<String>,
        criteria: &Criteria,
    ) -> bool {
        Arc::ptr_eq(&self.records, records)
            && &self.search_spec == search_spec
            && &self.search_term == search_term
            && &self.criteria == criteria
    }
}

/// Remembers the last filter run and replays it while the inputs stay the same
///
/// Records are identified by their `Arc` allocation, so swapping in a new
/// collection (even an equal one) recomputes. The cache keeps its `Arc`
/// alive, which stops the allocation from being reused for other data.
#[derive(Debug, Default)]
pub struct FilterCache {
    key: Option<CacheKey>,
    indices: Vec<usize>,
    hits: u64,
    misses: u64,
}

impl FilterCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Same result as [`super::filter`], rescanning only when an input changed
    pub fn apply<'r>(
        &mut self,
        records: &'r Arc<[Record]>,
        search_spec: &SearchSpec,
        search_term: &str,
        criteria: &Criteria,
    ) -> Result<FilterResult<'r>, ConfigurationError> {
        let term = normalize_term(search_term);
        let fresh = self
            .key
            .as_ref()
            .is_some_and(|key| key.same_inputs(records, search_spec, &term, criteria));

        if fresh {
            self.hits += 1;
        } else {
            self.indices = filter_indices(records, search_spec, search_term, criteria)?;
            self.key = Some(CacheKey {
                records: Arc::clone(records),
                search_spec: search_spec.clone(),
                search_term: term,
                criteria: criteria.clone(),
            });
            self.misses += 1;
        }

        Ok(self.indices.iter().map(move |&idx| &records[idx]).collect())
    }

    /// Drop the cached result and release the held records
    pub fn invalidate(&mut self) {
        self.key = None;
        self.indices.clear();
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}
