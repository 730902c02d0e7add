//! Scoring and filtering for picker collections.
//!
//! [`fuzzy`] scores one text against a query, [`filter`] and
//! [`hierarchical`] apply a [`Scorer`](fuzzy::Scorer) across a
//! [`Collection`](item::Collection) and [`cache`] memoizes the resulting
//! views. Everything here is synchronous and allocation-light; the session
//! state machine lives in `the-picker`.

pub mod cache;
pub mod filter;
pub mod fuzzy;
pub mod hierarchical;
pub mod item;
pub mod nucleo_scorer;

pub use cache::{
  CacheKey,
  FilterCache,
};
pub use filter::{
  FilteredEntry,
  FilteredView,
  Layout,
  filter_flat,
  filter_flat_with,
};
pub use fuzzy::{
  FuzzyScorer,
  MatchKind,
  MatchResult,
  ScoreError,
  Scorer,
  score,
};
pub use hierarchical::{
  HierarchyOptions,
  filter_hierarchical,
  filter_hierarchical_with,
};
pub use item::{
  Collection,
  Hierarchy,
  Item,
};
pub use nucleo_scorer::{
  MatchMode,
  NucleoScorer,
};
