//! Record filtering: criteria, free-text search and the expression syntax
//!
//! The engine ([`filter`]) is a pure function over borrowed records. It keeps
//! the records that contain the search term in one of the searched fields and
//! satisfy every active criterion, in input order.
//!
//! # Syntax
//!
//! ```text
//! field:value          Equals (text or number)
//! field:min..max       Numeric range, either bound optional ("3..", "..10")
//! field:>=DATE         Date on or after DATE (YYYY-MM-DD)
//! field:any(a,b)       List field containing any of the values
//! field~mode:value     Explicit mode: equals, range, dateOnOrAfter, containsAny
//! word                 Free-text search word
//! ```
//!
//! Criteria combine with AND; a second criterion on the same field replaces
//! the first. Declared field kinds steer bare values: on a list field
//! `skills:React,Rust` means containsAny, on a date field `applied:2024-01-01`
//! means on-or-after.
//!
//! # Examples
//!
//! ```text
//! status:Interview                        # Candidates in the interview stage
//! experience:3..                          # At least three years of experience
//! skills:any(React,Vue) applied:>=2024-01-01
//! garcía status:Hired                     # Hired candidates matching "garcía"
//! ```

pub mod criterion;
pub mod engine;
pub mod error;
pub mod memo;
pub mod parser;

pub use criterion::{
    Criteria, CriterionSpec, FilterCriterion, Predicate, PredicateMode, Scalar, SpecValue,
};
pub use engine::{FilterResult, SearchSpec, filter, filter_indices, matches};
pub use error::ConfigurationError;
pub use memo::FilterCache;
pub use parser::{FilterExpression, FilterTerm};
